use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Result, Seek, SeekFrom, Write},
    path::Path,
    sync::{Mutex, MutexGuard},
};

use log::debug;

use crate::disk::{
    block_device::{out_of_range, BlockDevice},
    types::{Block, BlockId, BLOCK_SIZE},
};

/// 以普通文件作为后端的虚拟磁盘
#[derive(Debug)]
pub struct FileDisk {
    file: Mutex<File>,
    block_count: u64,
}

impl FileDisk {
    /// 打开（必要时创建）镜像文件。
    /// 不足 `block_count` 块时补齐到该大小，已有的更大镜像保持原大小。
    pub fn open<P: AsRef<Path>>(path: P, block_count: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.as_ref())?;

        let wanted = block_count * BLOCK_SIZE as u64;
        let len = file.metadata()?.len();
        if len < wanted {
            debug!(
                "extending image {} from {} to {} bytes",
                path.as_ref().display(),
                len,
                wanted
            );
            file.set_len(wanted)?;
        }

        let block_count = file.metadata()?.len() / BLOCK_SIZE as u64;
        Ok(Self {
            file: Mutex::new(file),
            block_count,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "disk handle lock poisoned"))
    }

    fn check(&self, block_id: BlockId) -> Result<()> {
        if block_id.index() >= self.block_count {
            return Err(out_of_range(block_id, self.block_count));
        }
        Ok(())
    }
}

impl BlockDevice for FileDisk {
    fn read_block(&self, block_id: BlockId, buf: &mut Block) -> Result<()> {
        self.check(block_id)?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(block_id.byte_offset()))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: BlockId, buf: &Block) -> Result<()> {
        self.check(block_id)?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(block_id.byte_offset()))?;
        file.write_all(buf)?;
        Ok(())
    }

    fn block_count(&self) -> u64 {
        self.block_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("flatfs-{}-{}.img", tag, uuid::Uuid::new_v4()))
    }

    #[test]
    fn open_sizes_a_new_image() {
        let path = scratch_path("size");
        let disk = FileDisk::open(&path, 16).unwrap();
        assert_eq!(disk.block_count(), 16);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 16 * BLOCK_SIZE as u64);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn written_block_reads_back() {
        let path = scratch_path("rw");
        let disk = FileDisk::open(&path, 8).unwrap();

        let mut block: Block = [0; BLOCK_SIZE];
        block[0] = 0xAB;
        block[BLOCK_SIZE - 1] = 0xCD;
        disk.write_block(BlockId::new(5), &block).unwrap();

        let mut back: Block = [0; BLOCK_SIZE];
        disk.read_block(BlockId::new(5), &mut back).unwrap();
        assert_eq!(back, block);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn reading_past_the_end_fails() {
        let path = scratch_path("bound");
        let disk = FileDisk::open(&path, 4).unwrap();
        let mut buf: Block = [0; BLOCK_SIZE];
        let err = disk.read_block(BlockId::new(4), &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn reopening_keeps_a_larger_image() {
        let path = scratch_path("reopen");
        drop(FileDisk::open(&path, 32).unwrap());
        let disk = FileDisk::open(&path, 8).unwrap();
        assert_eq!(disk.block_count(), 32);
        std::fs::remove_file(&path).unwrap();
    }
}
