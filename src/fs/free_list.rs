//! 空闲块分配器。
//!
//! 镜像的最后一个块被保留下来，它开头 8 字节（数据块 `next` 字段的位置）存放
//! “下一个可分配的块号”。分配只会单调向前推进，没有回收：
//!
//! - `0`：尚未初始化，下一次分配从第一个数据块开始
//! - `-1`：已经用完，之后的分配全部失败
//! - 其他：下一个要分配出去的块号

use log::{debug, warn};

use crate::{
    disk::{Block, BlockDevice, BlockId, BLOCK_SIZE},
    fs::{
        config::{
            Geometry, BLOCK_ID_FIELD_LEN, FIRST_DATA_BLOCK_ID, FREE_LIST_EXHAUSTED,
            FREE_LIST_UNINITIALIZED,
        },
        error::{FileSystemError, Result},
    },
};

/// 空闲计数器的三种状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeListState {
    Uninitialized,
    Next(BlockId),
    Exhausted,
}

impl FreeListState {
    fn decode(raw: i64, geometry: Geometry) -> Result<Self> {
        match raw {
            FREE_LIST_UNINITIALIZED => Ok(Self::Uninitialized),
            FREE_LIST_EXHAUSTED => Ok(Self::Exhausted),
            _ => match BlockId::from_raw(raw) {
                Some(id) if id < geometry.free_list_block() => Ok(Self::Next(id)),
                _ => Err(FileSystemError::Corrupted(format!(
                    "free list counter {} is outside the image ({} blocks)",
                    raw, geometry.block_count
                ))),
            },
        }
    }

    fn encode(self) -> i64 {
        match self {
            Self::Uninitialized => FREE_LIST_UNINITIALIZED,
            Self::Next(id) => id.to_raw(),
            Self::Exhausted => FREE_LIST_EXHAUSTED,
        }
    }
}

/// 单调推进的块分配器
#[derive(Debug, Clone, Copy)]
pub struct FreeList {
    geometry: Geometry,
}

impl FreeList {
    pub fn new(geometry: Geometry) -> Self {
        Self { geometry }
    }

    pub fn block_id(&self) -> BlockId {
        self.geometry.free_list_block()
    }

    pub fn state(&self, disk: &dyn BlockDevice) -> Result<FreeListState> {
        let block = self.read(disk)?;
        let raw: i64 = bincode::deserialize(&block[..BLOCK_ID_FIELD_LEN])?;
        FreeListState::decode(raw, self.geometry)
    }

    // 分配一个块，返回块号；用完后返回 NoSpace 且不写盘
    pub fn allocate(&self, disk: &dyn BlockDevice) -> Result<BlockId> {
        let mut block = self.read(disk)?;
        let raw: i64 = bincode::deserialize(&block[..BLOCK_ID_FIELD_LEN])?;

        let id = match FreeListState::decode(raw, self.geometry)? {
            FreeListState::Exhausted => {
                warn!("free list exhausted");
                return Err(FileSystemError::NoSpace);
            }
            FreeListState::Uninitialized => FIRST_DATA_BLOCK_ID,
            FreeListState::Next(id) => id,
        };

        let next = BlockId::new(id.index() + 1);
        let state = if next >= self.block_id() {
            FreeListState::Exhausted
        } else {
            FreeListState::Next(next)
        };

        bincode::serialize_into(&mut block[..BLOCK_ID_FIELD_LEN], &state.encode())?;
        disk.write_block(self.block_id(), &block)?;

        debug!("allocated block {}", id);
        Ok(id)
    }

    /// 还能分配出去的块数
    pub fn remaining(&self, disk: &dyn BlockDevice) -> Result<u64> {
        Ok(match self.state(disk)? {
            FreeListState::Uninitialized => self.geometry.data_blocks(),
            FreeListState::Next(id) => self.block_id().index() - id.index(),
            FreeListState::Exhausted => 0,
        })
    }

    fn read(&self, disk: &dyn BlockDevice) -> Result<Block> {
        let mut block: Block = [0; BLOCK_SIZE];
        disk.read_block(self.block_id(), &mut block)?;
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemoryDisk;

    fn setup(blocks: u64) -> (MemoryDisk, FreeList) {
        let disk = MemoryDisk::new(blocks);
        let free_list = FreeList::new(Geometry::new(blocks));
        (disk, free_list)
    }

    #[test]
    fn first_allocation_starts_after_the_root() {
        let (disk, free_list) = setup(16);
        assert_eq!(free_list.state(&disk).unwrap(), FreeListState::Uninitialized);
        assert_eq!(free_list.allocate(&disk).unwrap(), BlockId::new(1));
        assert_eq!(
            free_list.state(&disk).unwrap(),
            FreeListState::Next(BlockId::new(2))
        );
    }

    #[test]
    fn allocations_are_unique_and_increasing_until_exhausted() {
        let (disk, free_list) = setup(8);
        let ids: Vec<u64> = (0..6)
            .map(|_| free_list.allocate(&disk).unwrap().index())
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(free_list.state(&disk).unwrap(), FreeListState::Exhausted);
        assert_eq!(free_list.remaining(&disk).unwrap(), 0);
    }

    #[test]
    fn exhaustion_is_permanent_and_leaves_the_disk_alone() {
        let (disk, free_list) = setup(4);
        free_list.allocate(&disk).unwrap();
        free_list.allocate(&disk).unwrap();

        let before = disk.snapshot();
        for _ in 0..3 {
            assert!(matches!(
                free_list.allocate(&disk),
                Err(FileSystemError::NoSpace)
            ));
        }
        assert_eq!(disk.snapshot(), before);
    }

    #[test]
    fn counter_lives_in_the_last_block() {
        let (disk, free_list) = setup(8);
        free_list.allocate(&disk).unwrap();
        let block = disk.snapshot()[7];
        assert_eq!(&block[..8], &2i64.to_le_bytes());
    }

    #[test]
    fn remaining_counts_down() {
        let (disk, free_list) = setup(10);
        assert_eq!(free_list.remaining(&disk).unwrap(), 8);
        free_list.allocate(&disk).unwrap();
        assert_eq!(free_list.remaining(&disk).unwrap(), 7);
    }

    #[test]
    fn out_of_range_counter_is_corruption() {
        let (disk, free_list) = setup(8);
        let mut block: Block = [0; BLOCK_SIZE];
        block[..8].copy_from_slice(&42i64.to_le_bytes());
        disk.write_block(BlockId::new(7), &block).unwrap();
        assert!(matches!(
            free_list.allocate(&disk),
            Err(FileSystemError::Corrupted(_))
        ));
    }
}
