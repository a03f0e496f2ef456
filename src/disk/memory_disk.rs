use std::{
    io::{self, Result},
    sync::RwLock,
};

use crate::disk::{
    block_device::{out_of_range, BlockDevice},
    types::{Block, BlockId, BLOCK_SIZE},
};

/// 内存中的块设备，用于测试和临时镜像
#[derive(Debug)]
pub struct MemoryDisk {
    blocks: RwLock<Vec<Block>>,
}

impl MemoryDisk {
    pub fn new(block_count: u64) -> Self {
        Self {
            blocks: RwLock::new(vec![[0u8; BLOCK_SIZE]; block_count as usize]),
        }
    }

    /// 整个镜像的拷贝，便于比较前后状态
    pub fn snapshot(&self) -> Vec<Block> {
        self.blocks
            .read()
            .map(|blocks| blocks.clone())
            .unwrap_or_default()
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "memory disk lock poisoned")
}

impl BlockDevice for MemoryDisk {
    fn read_block(&self, block_id: BlockId, buf: &mut Block) -> Result<()> {
        let blocks = self.blocks.read().map_err(|_| poisoned())?;
        let block = blocks
            .get(block_id.index() as usize)
            .ok_or_else(|| out_of_range(block_id, blocks.len() as u64))?;
        buf.copy_from_slice(block);
        Ok(())
    }

    fn write_block(&self, block_id: BlockId, buf: &Block) -> Result<()> {
        let mut blocks = self.blocks.write().map_err(|_| poisoned())?;
        let count = blocks.len() as u64;
        let block = blocks
            .get_mut(block_id.index() as usize)
            .ok_or_else(|| out_of_range(block_id, count))?;
        block.copy_from_slice(buf);
        Ok(())
    }

    fn block_count(&self) -> u64 {
        self.blocks.read().map(|blocks| blocks.len() as u64).unwrap_or(0)
    }
}
