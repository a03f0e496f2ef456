use crate::disk::{BlockId, BLOCK_SIZE};

pub const ROOT_BLOCK_ID: BlockId = BlockId::new(0);
// 第一个可分配的数据块
pub const FIRST_DATA_BLOCK_ID: BlockId = BlockId::new(1);

// 8.3 文件名
pub const MAX_FILENAME: usize = 8;
pub const MAX_EXTENSION: usize = 3;

// 名字字段多留一个字节给结尾的 nul
pub const NAME_FIELD_LEN: usize = MAX_FILENAME + 1;
pub const EXT_FIELD_LEN: usize = MAX_EXTENSION + 1;

// 块头部的条目计数（i32）
pub const COUNT_FIELD_LEN: usize = 4;
// 块号字段（i64）
pub const BLOCK_ID_FIELD_LEN: usize = 8;
// 文件大小字段（u64）
pub const SIZE_FIELD_LEN: usize = 8;

// 根目录项：名字 + 起始块号 = 17 字节
pub const ROOT_ENTRY_SIZE: usize = NAME_FIELD_LEN + BLOCK_ID_FIELD_LEN;
// 文件目录项：名字 + 扩展名 + 大小 + 起始块号 = 29 字节
pub const FILE_ENTRY_SIZE: usize = NAME_FIELD_LEN + EXT_FIELD_LEN + SIZE_FIELD_LEN + BLOCK_ID_FIELD_LEN;

// 根目录最多 29 个子目录
pub const MAX_DIRS_IN_ROOT: usize = (BLOCK_SIZE - COUNT_FIELD_LEN) / ROOT_ENTRY_SIZE;
// 每个目录最多 17 个文件
pub const MAX_FILES_IN_DIR: usize = (BLOCK_SIZE - COUNT_FIELD_LEN) / FILE_ENTRY_SIZE;

// 每个数据块除去 next 指针后可存放的数据量：504 字节
pub const MAX_DATA_IN_BLOCK: usize = BLOCK_SIZE - BLOCK_ID_FIELD_LEN;

// 链表结尾
pub const END_OF_CHAIN: i64 = -1;
// 空闲计数器尚未初始化
pub const FREE_LIST_UNINITIALIZED: i64 = 0;
// 空闲块已经用完
pub const FREE_LIST_EXHAUSTED: i64 = -1;

// 根目录块 + 至少一个数据块 + 空闲表块
pub const MIN_BLOCK_COUNT: u64 = 3;

/// 镜像的几何信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub block_count: u64,
}

impl Geometry {
    pub fn new(block_count: u64) -> Self {
        Self { block_count }
    }

    /// 空闲表占用镜像的最后一个块
    pub fn free_list_block(&self) -> BlockId {
        BlockId::new(self.block_count - 1)
    }

    /// 除根目录和空闲表以外可分配的块数
    pub fn data_blocks(&self) -> u64 {
        self.block_count.saturating_sub(2)
    }
}
