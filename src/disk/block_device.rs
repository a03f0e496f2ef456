use std::io::Result;

use crate::disk::types::{Block, BlockId};

/// 块设备抽象：文件系统只通过整块读写访问镜像。
pub trait BlockDevice: Send + Sync {
    fn read_block(&self, block_id: BlockId, buf: &mut Block) -> Result<()>;
    fn write_block(&self, block_id: BlockId, buf: &Block) -> Result<()>;
    /// 设备上可寻址的块数
    fn block_count(&self) -> u64;
}

pub(crate) fn out_of_range(block_id: BlockId, block_count: u64) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("block {} is beyond the end of the image ({} blocks)", block_id, block_count),
    )
}
