use serde::{Deserialize, Serialize};

use crate::{
    disk::{Block, BlockDevice, BlockId, BLOCK_SIZE},
    fs::{
        codec::{decode_name, encode_name, read_count, write_count},
        config::{COUNT_FIELD_LEN, EXT_FIELD_LEN, FILE_ENTRY_SIZE, MAX_FILES_IN_DIR, NAME_FIELD_LEN},
        error::{FileSystemError, Result},
    },
};

// 磁盘上的文件目录项
#[derive(Debug, Serialize, Deserialize)]
struct RawFileEntry {
    name: [u8; NAME_FIELD_LEN],
    ext: [u8; EXT_FIELD_LEN],
    size: u64,
    start_block: i64,
}

// 一个文件目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub ext: String,
    pub size: u64,
    pub start_block: BlockId,
}

impl FileEntry {
    /// 列目录时显示的名字：有扩展名时为 `name.ext`
    pub fn display_name(&self) -> String {
        if self.ext.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.ext)
        }
    }
}

/// 目录块：每个子目录一个，记录其中的文件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    pub entries: Vec<FileEntry>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(disk: &dyn BlockDevice, block_id: BlockId) -> Result<Self> {
        let mut block: Block = [0; BLOCK_SIZE];
        disk.read_block(block_id, &mut block)?;
        Self::from_block(&block)
    }

    pub fn sync(&self, disk: &dyn BlockDevice, block_id: BlockId) -> Result<()> {
        disk.write_block(block_id, &self.to_block()?)?;
        Ok(())
    }

    pub fn from_block(block: &Block) -> Result<Self> {
        let count = read_count(block, MAX_FILES_IN_DIR, "directory block")?;
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let start = COUNT_FIELD_LEN + i * FILE_ENTRY_SIZE;
            let raw: RawFileEntry = bincode::deserialize(&block[start..start + FILE_ENTRY_SIZE])?;
            let name = decode_name(&raw.name);
            let ext = decode_name(&raw.ext);
            let start_block = BlockId::from_raw(raw.start_block).ok_or_else(|| {
                FileSystemError::Corrupted(format!(
                    "file '{}.{}' has start block {}",
                    name, ext, raw.start_block
                ))
            })?;
            entries.push(FileEntry {
                name,
                ext,
                size: raw.size,
                start_block,
            });
        }
        Ok(Self { entries })
    }

    pub fn to_block(&self) -> Result<Block> {
        let mut block: Block = [0; BLOCK_SIZE];
        write_count(&mut block, self.entries.len())?;
        for (i, entry) in self.entries.iter().enumerate() {
            let start = COUNT_FIELD_LEN + i * FILE_ENTRY_SIZE;
            let raw = RawFileEntry {
                name: encode_name(&entry.name),
                ext: encode_name(&entry.ext),
                size: entry.size,
                start_block: entry.start_block.to_raw(),
            };
            bincode::serialize_into(&mut block[start..start + FILE_ENTRY_SIZE], &raw)?;
        }
        Ok(block)
    }

    // 查找文件，返回目录项下标
    pub fn find(&self, name: &str, ext: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.name == name && e.ext == ext)
    }

    /// 分配起始块之前先检查：目录已满、重名
    pub fn ensure_can_add(&self, dir: &str, name: &str, ext: &str) -> Result<()> {
        if self.is_full() {
            return Err(FileSystemError::FileLimitExceeded(format!("/{}", dir)));
        }
        if self.find(name, ext).is_some() {
            let entry_name = if ext.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", name, ext)
            };
            return Err(FileSystemError::AlreadyExists(format!("/{}/{}", dir, entry_name)));
        }
        Ok(())
    }

    // 添加文件目录项（大小为 0），返回下标
    pub fn add(&mut self, dir: &str, name: &str, ext: &str, start_block: BlockId) -> Result<usize> {
        self.ensure_can_add(dir, name, ext)?;
        self.entries.push(FileEntry {
            name: name.to_string(),
            ext: ext.to_string(),
            size: 0,
            start_block,
        });
        Ok(self.entries.len() - 1)
    }

    pub fn set_size(&mut self, index: usize, size: u64) -> Result<()> {
        let entry = self.entries.get_mut(index).ok_or_else(|| {
            FileSystemError::Corrupted(format!("no file entry at index {}", index))
        })?;
        entry.size = size;
        Ok(())
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_FILES_IN_DIR
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按创建顺序列出文件名
    pub fn list(&self) -> Vec<String> {
        self.entries.iter().map(FileEntry::display_name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Directory {
        let mut dir = Directory::new();
        dir.add("docs", "note", "txt", BlockId::new(2)).unwrap();
        dir.add("docs", "README", "", BlockId::new(3)).unwrap();
        dir
    }

    #[test]
    fn layout_is_count_then_packed_entries() {
        let mut dir = sample();
        dir.set_size(0, 600).unwrap();
        let block = dir.to_block().unwrap();

        assert_eq!(&block[..4], &2i32.to_le_bytes());
        assert_eq!(&block[4..13], b"note\0\0\0\0\0");
        assert_eq!(&block[13..17], b"txt\0");
        assert_eq!(&block[17..25], &600u64.to_le_bytes());
        assert_eq!(&block[25..33], &2i64.to_le_bytes());
        assert_eq!(&block[33..42], b"README\0\0\0");
        assert_eq!(&block[42..46], &[0, 0, 0, 0]);

        assert_eq!(Directory::from_block(&block).unwrap(), dir);
    }

    #[test]
    fn name_and_extension_together_identify_a_file() {
        let mut dir = sample();
        assert_eq!(dir.find("note", "txt"), Some(0));
        assert_eq!(dir.find("note", ""), None);

        dir.add("docs", "note", "md", BlockId::new(4)).unwrap();
        assert!(matches!(
            dir.add("docs", "note", "txt", BlockId::new(5)),
            Err(FileSystemError::AlreadyExists(_))
        ));
    }

    #[test]
    fn listing_keeps_creation_order() {
        assert_eq!(sample().list(), vec!["note.txt", "README"]);
    }

    #[test]
    fn full_directory_refuses_more_files() {
        let mut dir = Directory::new();
        for i in 0..MAX_FILES_IN_DIR {
            dir.add("d", &format!("f{}", i), "", BlockId::new(i as u64 + 1))
                .unwrap();
        }
        let err = dir.add("d", "extra", "", BlockId::new(99)).unwrap_err();
        assert!(err.is_capacity_exceeded());

        let block = dir.to_block().unwrap();
        assert_eq!(Directory::from_block(&block).unwrap().len(), MAX_FILES_IN_DIR);
    }
}
