use std::fmt;

/// 每个逻辑块（Block）的大小：512B
/// 文件系统以“块”为最小读写单位，所有结构都按整块读写。
pub const BLOCK_SIZE: usize = 512;

/// 默认磁盘中包含的块总数：5MB / 512B = 10240 块
pub const BLOCK_COUNT: u64 = 5 * 1024 * 1024 / BLOCK_SIZE as u64;

/// 默认虚拟磁盘总大小（单位：字节）
/// 用于创建固定大小的 disk.img 文件。
pub const DISK_SIZE: u64 = BLOCK_SIZE as u64 * BLOCK_COUNT;

/// 定义一个逻辑块类型（每块 512B 的字节数组）
/// 所有磁盘读写都以 Block 为单位进行。
pub type Block = [u8; BLOCK_SIZE];

/// 块号。结构之间只通过块号互相引用，不持有跨块的内存指针。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(u64);

impl BlockId {
    pub const fn new(index: u64) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u64 {
        self.0
    }

    /// 磁盘上的块号是有符号的，-1 以及其他负数都不是合法块号
    pub fn from_raw(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().map(Self)
    }

    pub fn to_raw(self) -> i64 {
        self.0 as i64
    }

    /// 在镜像中的字节偏移
    pub fn byte_offset(self) -> u64 {
        self.0 * BLOCK_SIZE as u64
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_image_is_five_mebibytes() {
        assert_eq!(BLOCK_COUNT, 10240);
        assert_eq!(DISK_SIZE, 5 * 1024 * 1024);
    }

    #[test]
    fn negative_raw_ids_are_not_blocks() {
        assert_eq!(BlockId::from_raw(-1), None);
        assert_eq!(BlockId::from_raw(7), Some(BlockId::new(7)));
        assert_eq!(BlockId::new(3).byte_offset(), 3 * 512);
    }
}
