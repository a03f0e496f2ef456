//! FlatFS：两层、按块组织的简单文件系统。
//!
//! 镜像被切成等长的块：块 0 是根目录，每个子目录占一个目录块，文件内容存放在
//! 单链表串起来的数据块里，最后一个块保存空闲块计数器。

pub mod disk;
pub mod fs;
pub mod shell;

pub use disk::{BlockDevice, BlockId, FileDisk, MemoryDisk};
pub use fs::{
    attr::{Attr, FileMode, NodeKind, Usage},
    error::{FileSystemError, Result},
    FileEntryRef, FileSystem,
};
