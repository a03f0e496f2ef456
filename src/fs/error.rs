use std::fmt;

// 与宿主（FUSE 风格）约定的 errno
pub const EPERM: i32 = 1;
pub const ENOENT: i32 = 2;
pub const EIO: i32 = 5;
pub const EEXIST: i32 = 17;
pub const ENOTDIR: i32 = 20;
pub const EISDIR: i32 = 21;
pub const EINVAL: i32 = 22;
pub const EFBIG: i32 = 27;
pub const ENOSPC: i32 = 28;
pub const ENAMETOOLONG: i32 = 36;

/// 文件系统错误类型
#[derive(Debug)]
pub enum FileSystemError {
    Io(std::io::Error),            // 底层 I/O 错误
    NotFound(String),              // 文件或目录不存在，带路径
    ParentNotFound(String),        // 创建文件时所在目录不存在
    AlreadyExists(String),         // 文件或目录已存在，带路径
    NameTooLong(String),           // 名字或扩展名超长
    InvalidTarget(String),         // 操作发生在错误的层级，比如在根目录下建文件
    InvalidPath(String),           // 路径非法
    NotADirectory(String),         // 期望目录，实际不是
    IsADirectory(String),          // 期望文件，实际是目录
    DirectoryLimitExceeded,        // 根目录已满
    FileLimitExceeded(String),     // 目录已满，带目录名
    NoSpace,                       // 空闲块用完
    OffsetBeyondEnd { offset: u64, size: u64 }, // 偏移超过文件大小
    Corrupted(String),             // 文件系统损坏
}

impl FileSystemError {
    /// 根目录或目录表已满
    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(
            self,
            Self::DirectoryLimitExceeded | Self::FileLimitExceeded(_)
        )
    }

    /// 映射为宿主使用的 errno（正数）
    pub fn errno(&self) -> i32 {
        match self {
            Self::Io(_) | Self::Corrupted(_) => EIO,
            Self::NotFound(_) => ENOENT,
            Self::ParentNotFound(_) => ENOENT,
            Self::AlreadyExists(_) => EEXIST,
            Self::NameTooLong(_) => ENAMETOOLONG,
            Self::InvalidTarget(_) => EPERM,
            Self::InvalidPath(_) => EINVAL,
            Self::NotADirectory(_) => ENOTDIR,
            Self::IsADirectory(_) => EISDIR,
            Self::DirectoryLimitExceeded | Self::FileLimitExceeded(_) => EPERM,
            Self::NoSpace => ENOSPC,
            Self::OffsetBeyondEnd { .. } => EFBIG,
        }
    }
}

impl From<std::io::Error> for FileSystemError {
    fn from(e: std::io::Error) -> Self {
        FileSystemError::Io(e)
    }
}

impl From<bincode::Error> for FileSystemError {
    fn from(e: bincode::Error) -> Self {
        FileSystemError::Corrupted(format!("block codec: {}", e))
    }
}

// 实现 Display trait，用于打印错误信息
impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Disk I/O error: {}", e),
            Self::NotFound(path) => write!(f, "File or directory not found: {}", path),
            Self::ParentNotFound(dir) => write!(f, "Parent directory not found: {}", dir),
            Self::AlreadyExists(path) => write!(f, "File or directory already exists: {}", path),
            Self::NameTooLong(name) => write!(f, "Name too long (8.3 names only): {}", name),
            Self::InvalidTarget(path) => write!(f, "Operation not permitted here: {}", path),
            Self::InvalidPath(path) => write!(f, "Invalid path: {}", path),
            Self::NotADirectory(path) => write!(f, "Expected a directory, found a file: {}", path),
            Self::IsADirectory(path) => write!(f, "Expected a file, found a directory: {}", path),
            Self::DirectoryLimitExceeded => write!(f, "Root directory is full"),
            Self::FileLimitExceeded(dir) => write!(f, "Directory is full: {}", dir),
            Self::NoSpace => write!(f, "Disk space is full"),
            Self::OffsetBeyondEnd { offset, size } => {
                write!(f, "Offset {} is beyond the end of the file ({} bytes)", offset, size)
            }
            Self::Corrupted(desc) => write!(f, "File system corrupted: {}", desc),
        }
    }
}

// 支持链式错误，方便追踪底层原因
impl std::error::Error for FileSystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FileSystemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_errors_share_a_class() {
        assert!(FileSystemError::DirectoryLimitExceeded.is_capacity_exceeded());
        assert!(FileSystemError::FileLimitExceeded("docs".into()).is_capacity_exceeded());
        assert!(!FileSystemError::NoSpace.is_capacity_exceeded());
    }

    #[test]
    fn errno_follows_the_host_conventions() {
        assert_eq!(FileSystemError::NotFound("/x".into()).errno(), ENOENT);
        assert_eq!(FileSystemError::NameTooLong("abcdefghi".into()).errno(), ENAMETOOLONG);
        assert_eq!(FileSystemError::OffsetBeyondEnd { offset: 9, size: 3 }.errno(), EFBIG);
        assert_eq!(FileSystemError::NoSpace.errno(), ENOSPC);
    }

    #[test]
    fn io_errors_keep_their_source() {
        let err: FileSystemError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("boom"));
    }
}
