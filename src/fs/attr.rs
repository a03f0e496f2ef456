use bitflags::bitflags;

bitflags! {
    /// 交给宿主的 st_mode 位
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileMode: u32 {
        const DIRECTORY = 0o040000;
        const REGULAR = 0o100000;

        const OWNER_READ = 0o400;
        const OWNER_WRITE = 0o200;
        const OWNER_EXEC = 0o100;
        const GROUP_READ = 0o040;
        const GROUP_WRITE = 0o020;
        const GROUP_EXEC = 0o010;
        const OTHER_READ = 0o004;
        const OTHER_WRITE = 0o002;
        const OTHER_EXEC = 0o001;
    }
}

impl FileMode {
    /// drwxr-xr-x
    pub fn directory() -> Self {
        Self::DIRECTORY | Self::from_bits_truncate(0o755)
    }

    /// -rw-rw-rw-，不做权限检查
    pub fn regular() -> Self {
        Self::REGULAR | Self::from_bits_truncate(0o666)
    }

    pub fn is_dir(self) -> bool {
        self.contains(Self::DIRECTORY)
    }

    /// `ls -l` 风格的权限串
    pub fn symbolic(self) -> String {
        let mut s = String::with_capacity(10);
        s.push(if self.is_dir() { 'd' } else { '-' });
        let bits = [
            (Self::OWNER_READ, 'r'),
            (Self::OWNER_WRITE, 'w'),
            (Self::OWNER_EXEC, 'x'),
            (Self::GROUP_READ, 'r'),
            (Self::GROUP_WRITE, 'w'),
            (Self::GROUP_EXEC, 'x'),
            (Self::OTHER_READ, 'r'),
            (Self::OTHER_WRITE, 'w'),
            (Self::OTHER_EXEC, 'x'),
        ];
        for (flag, c) in bits {
            s.push(if self.contains(flag) { c } else { '-' });
        }
        s
    }
}

/// 路径指向的对象种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Directory,
    File,
}

/// getattr 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attr {
    pub kind: NodeKind,
    pub size: u64,
    pub mode: FileMode,
    pub nlink: u32,
}

impl Attr {
    pub fn root() -> Self {
        Self {
            kind: NodeKind::Root,
            size: 0,
            mode: FileMode::directory(),
            nlink: 2,
        }
    }

    pub fn directory() -> Self {
        Self {
            kind: NodeKind::Directory,
            ..Self::root()
        }
    }

    pub fn file(size: u64) -> Self {
        Self {
            kind: NodeKind::File,
            size,
            mode: FileMode::regular(),
            nlink: 1,
        }
    }
}

/// 磁盘用量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub total_blocks: u64,
    pub free_blocks: u64,
    pub directories: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_bits_match_posix() {
        assert_eq!(FileMode::directory().bits(), 0o040755);
        assert_eq!(FileMode::regular().bits(), 0o100666);
        assert_eq!(FileMode::directory().symbolic(), "drwxr-xr-x");
        assert_eq!(FileMode::regular().symbolic(), "-rw-rw-rw-");
    }
}
