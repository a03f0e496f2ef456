use serde::{Deserialize, Serialize};

use crate::{
    disk::{Block, BlockDevice, BlockId, BLOCK_SIZE},
    fs::{
        codec::{decode_name, encode_name, read_count, write_count},
        config::{COUNT_FIELD_LEN, MAX_DIRS_IN_ROOT, NAME_FIELD_LEN, ROOT_BLOCK_ID, ROOT_ENTRY_SIZE},
        error::{FileSystemError, Result},
    },
};

// 磁盘上的根目录项
#[derive(Debug, Serialize, Deserialize)]
struct RawDirectoryEntry {
    name: [u8; NAME_FIELD_LEN],
    start_block: i64,
}

/// 根目录中的一个子目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub start_block: BlockId,
}

/// 根目录块（块 0）：子目录名 -> 目录块号
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootDirectory {
    entries: Vec<DirectoryEntry>,
}

impl RootDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(disk: &dyn BlockDevice) -> Result<Self> {
        let mut block: Block = [0; BLOCK_SIZE];
        disk.read_block(ROOT_BLOCK_ID, &mut block)?;
        Self::from_block(&block)
    }

    pub fn sync(&self, disk: &dyn BlockDevice) -> Result<()> {
        disk.write_block(ROOT_BLOCK_ID, &self.to_block()?)?;
        Ok(())
    }

    pub fn from_block(block: &Block) -> Result<Self> {
        let count = read_count(block, MAX_DIRS_IN_ROOT, "root directory")?;
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let start = COUNT_FIELD_LEN + i * ROOT_ENTRY_SIZE;
            let raw: RawDirectoryEntry = bincode::deserialize(&block[start..start + ROOT_ENTRY_SIZE])?;
            let name = decode_name(&raw.name);
            let start_block = BlockId::from_raw(raw.start_block).ok_or_else(|| {
                FileSystemError::Corrupted(format!(
                    "directory '{}' has start block {}",
                    name, raw.start_block
                ))
            })?;
            entries.push(DirectoryEntry { name, start_block });
        }
        Ok(Self { entries })
    }

    pub fn to_block(&self) -> Result<Block> {
        let mut block: Block = [0; BLOCK_SIZE];
        write_count(&mut block, self.entries.len())?;
        for (i, entry) in self.entries.iter().enumerate() {
            let start = COUNT_FIELD_LEN + i * ROOT_ENTRY_SIZE;
            let raw = RawDirectoryEntry {
                name: encode_name(&entry.name),
                start_block: entry.start_block.to_raw(),
            };
            bincode::serialize_into(&mut block[start..start + ROOT_ENTRY_SIZE], &raw)?;
        }
        Ok(block)
    }

    // 查找子目录，返回目录块号
    pub fn find(&self, name: &str) -> Option<BlockId> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.start_block)
    }

    /// 分配目录块之前先检查：重名、根目录已满
    pub fn ensure_can_add(&self, name: &str) -> Result<()> {
        if self.find(name).is_some() {
            return Err(FileSystemError::AlreadyExists(format!("/{}", name)));
        }
        if self.is_full() {
            return Err(FileSystemError::DirectoryLimitExceeded);
        }
        Ok(())
    }

    // 添加子目录
    pub fn add(&mut self, name: &str, start_block: BlockId) -> Result<()> {
        self.ensure_can_add(name)?;
        self.entries.push(DirectoryEntry {
            name: name.to_string(),
            start_block,
        });
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_DIRS_IN_ROOT
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// 按创建顺序列出子目录名
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_count_then_packed_entries() {
        let mut root = RootDirectory::new();
        root.add("docs", BlockId::new(1)).unwrap();
        root.add("src", BlockId::new(0x0102)).unwrap();
        let block = root.to_block().unwrap();

        assert_eq!(&block[..4], &2i32.to_le_bytes());
        assert_eq!(&block[4..13], b"docs\0\0\0\0\0");
        assert_eq!(&block[13..21], &1i64.to_le_bytes());
        assert_eq!(&block[21..30], b"src\0\0\0\0\0\0");
        assert_eq!(&block[30..38], &0x0102i64.to_le_bytes());
        assert!(block[38..].iter().all(|&b| b == 0));

        assert_eq!(RootDirectory::from_block(&block).unwrap(), root);
    }

    #[test]
    fn zeroed_block_is_an_empty_root() {
        let root = RootDirectory::from_block(&[0; BLOCK_SIZE]).unwrap();
        assert!(root.is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut root = RootDirectory::new();
        root.add("docs", BlockId::new(1)).unwrap();
        assert!(matches!(
            root.add("docs", BlockId::new(2)),
            Err(FileSystemError::AlreadyExists(_))
        ));
        assert_eq!(root.len(), 1);
    }

    #[test]
    fn full_root_refuses_more_directories() {
        let mut root = RootDirectory::new();
        for i in 0..MAX_DIRS_IN_ROOT {
            root.add(&format!("d{}", i), BlockId::new(i as u64 + 1)).unwrap();
        }
        assert!(root.is_full());
        assert!(matches!(
            root.add("extra", BlockId::new(99)),
            Err(FileSystemError::DirectoryLimitExceeded)
        ));

        // 满的根目录同样能完整写回一个块
        let block = root.to_block().unwrap();
        assert_eq!(RootDirectory::from_block(&block).unwrap().len(), MAX_DIRS_IN_ROOT);
    }

    #[test]
    fn negative_start_block_is_corruption() {
        let mut root = RootDirectory::new();
        root.add("docs", BlockId::new(1)).unwrap();
        let mut block = root.to_block().unwrap();
        block[13..21].copy_from_slice(&(-5i64).to_le_bytes());
        assert!(matches!(
            RootDirectory::from_block(&block),
            Err(FileSystemError::Corrupted(_))
        ));
    }
}
