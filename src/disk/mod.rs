pub mod block_device;
pub mod file_disk;
pub mod init;
pub mod memory_disk;
pub mod types;

pub use block_device::BlockDevice;
pub use file_disk::FileDisk;
pub use memory_disk::MemoryDisk;
pub use types::{Block, BlockId, BLOCK_COUNT, BLOCK_SIZE, DISK_SIZE};
