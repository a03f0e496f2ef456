use std::{
    fmt,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::{debug, info};

use crate::{
    disk::{Block, BlockDevice, BlockId, BLOCK_SIZE},
    fs::{
        attr::{Attr, Usage},
        codec::check_name,
        config::{Geometry, MAX_EXTENSION, MAX_FILENAME, MIN_BLOCK_COUNT},
        data_block::DataBlock,
        directory::Directory,
        error::{FileSystemError, Result},
        free_list::FreeList,
        path::{classify, ParsedPath, PathKind},
        root_directory::RootDirectory,
    },
};

pub mod attr;
pub mod chain;
pub mod codec;
pub mod config;
pub mod data_block;
pub mod directory;
pub mod error;
pub mod free_list;
pub mod path;
pub mod root_directory;

/// 一个文件目录项的位置和内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileEntryRef {
    pub dir_block: BlockId, // 所在目录块
    pub index: usize,       // 目录块中的下标
    pub size: u64,
    pub start_block: BlockId,
}

/// 文件系统句柄：独占底层磁盘，所有操作都经过它。
///
/// 修改元数据的操作（建目录、建文件、写文件、分配块）持有写锁完成整个
/// “读-改-写”，查询和读文件持有读锁。句柄本身不缓存任何块。
pub struct FileSystem {
    disk: Box<dyn BlockDevice>, // 底层磁盘抽象层
    geometry: Geometry,
    free_list: FreeList,
    lock: RwLock<()>,
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

impl FileSystem {
    /// 把整个镜像清零。全零的镜像就是一个空文件系统：
    /// 根目录没有子目录，空闲计数器处于未初始化状态。
    pub fn format<D, F>(disk: &D, mut progress: F) -> Result<()>
    where
        D: BlockDevice + ?Sized,
        F: FnMut(u64, u64),
    {
        let total = disk.block_count();
        if total < MIN_BLOCK_COUNT {
            return Err(FileSystemError::Corrupted(format!(
                "image has {} blocks, at least {} needed",
                total, MIN_BLOCK_COUNT
            )));
        }

        let zero: Block = [0; BLOCK_SIZE];
        for i in 0..total {
            disk.write_block(BlockId::new(i), &zero)?;
            progress(i + 1, total);
        }
        info!("formatted image: {} blocks of {} bytes", total, BLOCK_SIZE);
        Ok(())
    }

    /// 在已挂载的句柄上重新格式化，期间阻塞其他所有操作
    pub fn reformat<F: FnMut(u64, u64)>(&self, progress: F) -> Result<()> {
        let _guard = self.write_lock();
        Self::format(self.disk(), progress)
    }

    /// 挂载：检查几何信息、根目录和空闲计数器
    pub fn mount<D: BlockDevice + 'static>(disk: D) -> Result<Self> {
        let block_count = disk.block_count();
        if block_count < MIN_BLOCK_COUNT {
            return Err(FileSystemError::Corrupted(format!(
                "image has {} blocks, at least {} needed",
                block_count, MIN_BLOCK_COUNT
            )));
        }

        let geometry = Geometry::new(block_count);
        let free_list = FreeList::new(geometry);
        let fs = Self {
            disk: Box::new(disk),
            geometry,
            free_list,
            lock: RwLock::new(()),
        };

        let root = RootDirectory::load(fs.disk())?;
        for entry in root.entries() {
            let id = entry.start_block;
            if id.index() == 0 || id >= geometry.free_list_block() {
                return Err(FileSystemError::Corrupted(format!(
                    "directory '{}' points at block {}",
                    entry.name, id
                )));
            }
        }
        let free_blocks = fs.free_list.remaining(fs.disk())?;

        info!("{} total blocks", block_count);
        info!(
            "mounted: {} directories, {} free blocks",
            root.len(),
            free_blocks
        );
        Ok(fs)
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// 底层磁盘；绕过操作锁，只在持锁的代码里使用
    pub(crate) fn disk(&self) -> &dyn BlockDevice {
        self.disk.as_ref()
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, ()> {
        // 锁里不保存状态，被毒化后继续使用也是安全的
        self.lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(PoisonError::into_inner)
    }

    /* ---------- 核心操作 ---------- */

    /// 从空闲表分配一个块
    pub fn allocate_block(&self) -> Result<BlockId> {
        let _guard = self.write_lock();
        self.free_list.allocate(self.disk())
    }

    /// 按名字查找子目录，返回目录块号
    pub fn lookup_directory(&self, name: &str) -> Result<BlockId> {
        let _guard = self.read_lock();
        self.find_directory(name)
    }

    /// 查找文件，返回其目录项
    pub fn lookup_file(&self, dir: &str, name: &str, ext: &str) -> Result<FileEntryRef> {
        let _guard = self.read_lock();
        self.find_file(dir, name, ext)
    }

    /// 在根目录下创建子目录，返回新目录块号
    pub fn create_directory(&self, name: &str) -> Result<BlockId> {
        let _guard = self.write_lock();
        if name.is_empty() {
            return Err(FileSystemError::InvalidPath(String::from("/")));
        }
        check_name(name, MAX_FILENAME)?;

        let mut root = RootDirectory::load(self.disk())?;
        root.ensure_can_add(name)?;

        let block = self.free_list.allocate(self.disk())?;
        Directory::new().sync(self.disk(), block)?;
        root.add(name, block)?;
        root.sync(self.disk())?;

        info!("created directory /{} at block {}", name, block);
        Ok(block)
    }

    /// 在子目录下创建空文件
    pub fn create_file(&self, dir: &str, name: &str, ext: &str) -> Result<()> {
        let _guard = self.write_lock();
        if dir.is_empty() {
            // 文件只能放在子目录里
            return Err(FileSystemError::InvalidTarget(format!("/{}", name)));
        }
        if name.is_empty() {
            return Err(FileSystemError::InvalidPath(format!("/{}/", dir)));
        }
        check_name(name, MAX_FILENAME)?;
        check_name(ext, MAX_EXTENSION)?;

        let dir_block = RootDirectory::load(self.disk())?
            .find(dir)
            .ok_or_else(|| FileSystemError::ParentNotFound(format!("/{}", dir)))?;
        let mut table = Directory::load(self.disk(), dir_block)?;
        table.ensure_can_add(dir, name, ext)?;

        let start = self.free_list.allocate(self.disk())?;
        DataBlock::new().store(self.disk(), start)?;
        let index = table.add(dir, name, ext, start)?;
        table.sync(self.disk(), dir_block)?;

        info!(
            "created file /{}/{} at block {}",
            dir,
            table.entries[index].display_name(),
            start
        );
        Ok(())
    }

    fn find_directory(&self, name: &str) -> Result<BlockId> {
        RootDirectory::load(self.disk())?
            .find(name)
            .ok_or_else(|| FileSystemError::NotFound(format!("/{}", name)))
    }

    fn find_file(&self, dir: &str, name: &str, ext: &str) -> Result<FileEntryRef> {
        let dir_block = self.find_directory(dir)?;
        let table = Directory::load(self.disk(), dir_block)?;
        let index = table.find(name, ext).ok_or_else(|| {
            let file = if ext.is_empty() {
                name.to_string()
            } else {
                format!("{}.{}", name, ext)
            };
            FileSystemError::NotFound(format!("/{}/{}", dir, file))
        })?;
        let entry = &table.entries[index];
        Ok(FileEntryRef {
            dir_block,
            index,
            size: entry.size,
            start_block: entry.start_block,
        })
    }

    fn find_path(&self, path: &str, parsed: &ParsedPath) -> Result<FileEntryRef> {
        match self.find_file(&parsed.dir, &parsed.name, &parsed.ext) {
            Err(FileSystemError::NotFound(_)) => Err(FileSystemError::NotFound(path.to_string())),
            other => other,
        }
    }

    /* ---------- 宿主接口 ---------- */

    /// 路径属性：根目录、子目录或文件（带大小）
    pub fn getattr(&self, path: &str) -> Result<Attr> {
        let _guard = self.read_lock();
        match classify(path) {
            PathKind::Root => Ok(Attr::root()),
            PathKind::Directory(dir) => {
                self.find_directory(&dir)?;
                Ok(Attr::directory())
            }
            PathKind::File(parsed) => Ok(Attr::file(self.find_path(path, &parsed)?.size)),
            PathKind::Invalid => Err(FileSystemError::NotFound(path.to_string())),
        }
    }

    /// 列目录：根目录列出子目录，子目录列出 `name` 或 `name.ext`
    pub fn read_dir(&self, path: &str) -> Result<Vec<String>> {
        let _guard = self.read_lock();
        match classify(path) {
            PathKind::Root => Ok(RootDirectory::load(self.disk())?.names()),
            PathKind::Directory(dir) => {
                let block = self.find_directory(&dir)?;
                Ok(Directory::load(self.disk(), block)?.list())
            }
            PathKind::File(parsed) => {
                self.find_path(path, &parsed)?;
                Err(FileSystemError::NotADirectory(path.to_string()))
            }
            PathKind::Invalid => Err(FileSystemError::NotFound(path.to_string())),
        }
    }

    /// 只能在根目录下建目录
    pub fn mkdir(&self, path: &str) -> Result<()> {
        match classify(path) {
            PathKind::Root => Err(FileSystemError::AlreadyExists(path.to_string())),
            PathKind::Directory(dir) => self.create_directory(&dir).map(|_| ()),
            PathKind::File(_) => Err(FileSystemError::InvalidTarget(path.to_string())),
            PathKind::Invalid => Err(FileSystemError::InvalidPath(path.to_string())),
        }
    }

    /// 创建文件，路径必须形如 `/dir/name[.ext]`
    pub fn mknod(&self, path: &str) -> Result<()> {
        match classify(path) {
            PathKind::Root | PathKind::Directory(_) => {
                Err(FileSystemError::InvalidTarget(path.to_string()))
            }
            PathKind::File(parsed) => self.create_file(&parsed.dir, &parsed.name, &parsed.ext),
            PathKind::Invalid => Err(FileSystemError::InvalidPath(path.to_string())),
        }
    }

    /// 从 `offset` 起最多读 `len` 字节
    pub fn read(&self, path: &str, len: u64, offset: u64) -> Result<Vec<u8>> {
        let _guard = self.read_lock();
        let parsed = match classify(path) {
            PathKind::Root | PathKind::Directory(_) => {
                return Err(FileSystemError::IsADirectory(path.to_string()))
            }
            PathKind::File(parsed) => parsed,
            PathKind::Invalid => return Err(FileSystemError::NotFound(path.to_string())),
        };

        let file = self.find_path(path, &parsed)?;
        if offset > file.size {
            return Err(FileSystemError::OffsetBeyondEnd {
                offset,
                size: file.size,
            });
        }
        let end = file.size.min(offset.saturating_add(len));
        chain::read_range(self.disk(), file.start_block, end, offset)
    }

    /// 从 `offset` 起写入 `buf`，返回新的文件大小
    pub fn write(&self, path: &str, buf: &[u8], offset: u64) -> Result<u64> {
        let _guard = self.write_lock();
        let parsed = match classify(path) {
            PathKind::Root | PathKind::Directory(_) => {
                return Err(FileSystemError::IsADirectory(path.to_string()))
            }
            PathKind::File(parsed) => parsed,
            PathKind::Invalid => return Err(FileSystemError::NotFound(path.to_string())),
        };

        let file = self.find_path(path, &parsed)?;
        let new_size = chain::write_range(
            self.disk(),
            &self.free_list,
            file.start_block,
            file.size,
            buf,
            offset,
        )?;

        let mut table = Directory::load(self.disk(), file.dir_block)?;
        table.set_size(file.index, new_size)?;
        table.sync(self.disk(), file.dir_block)?;
        debug!("{}: wrote {} bytes at {}, size {}", path, buf.len(), offset, new_size);
        Ok(new_size)
    }

    /// 文件数据链经过的块，按链上顺序
    pub fn file_blocks(&self, path: &str) -> Result<Vec<BlockId>> {
        let _guard = self.read_lock();
        match classify(path) {
            PathKind::Root | PathKind::Directory(_) => {
                Err(FileSystemError::IsADirectory(path.to_string()))
            }
            PathKind::File(parsed) => {
                let file = self.find_path(path, &parsed)?;
                chain::chain_blocks(self.disk(), file.start_block)
            }
            PathKind::Invalid => Err(FileSystemError::NotFound(path.to_string())),
        }
    }

    /// 删除文件：不回收块，直接成功
    pub fn unlink(&self, path: &str) -> Result<()> {
        debug!("unlink {} ignored", path);
        Ok(())
    }

    /// 删除目录：不回收块，直接成功
    pub fn rmdir(&self, path: &str) -> Result<()> {
        debug!("rmdir {} ignored", path);
        Ok(())
    }

    /// 文件不会缩小，截断直接成功
    pub fn truncate(&self, path: &str, size: u64) -> Result<()> {
        debug!("truncate {} to {} ignored", path, size);
        Ok(())
    }

    pub fn open(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    pub fn flush(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    /// 总块数、剩余可分配块数和子目录数
    pub fn usage(&self) -> Result<Usage> {
        let _guard = self.read_lock();
        Ok(Usage {
            total_blocks: self.geometry.block_count,
            free_blocks: self.free_list.remaining(self.disk())?,
            directories: RootDirectory::load(self.disk())?.len(),
        })
    }
}
