//! 路径解析：把 `/dir/name.ext` 拆成目录名、文件名和扩展名。
//!
//! 文件系统只有两层，所以合法的路径只有三种形状：`/`、`/dir` 和
//! `/dir/name[.ext]`。其余形状一律解析为全空，调用方按“不存在”处理。

/// 解析结果，缺失的部分为空串
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPath {
    pub dir: String,
    pub name: String,
    pub ext: String,
}

impl ParsedPath {
    pub fn is_empty(&self) -> bool {
        self.dir.is_empty() && self.name.is_empty() && self.ext.is_empty()
    }

    pub fn is_file(&self) -> bool {
        !self.name.is_empty()
    }
}

/// 路径指向的层级
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKind {
    Root,
    Directory(String),
    File(ParsedPath),
    Invalid,
}

pub fn resolve(path: &str) -> ParsedPath {
    let Some(rest) = path.strip_prefix('/') else {
        return ParsedPath::default();
    };
    // 允许一个结尾的 '/'
    let rest = rest.strip_suffix('/').unwrap_or(rest);

    let mut parts = rest.split('/');
    let (Some(dir), second, None) = (parts.next(), parts.next(), parts.next()) else {
        return ParsedPath::default();
    };
    if dir.is_empty() {
        return ParsedPath::default();
    }

    match second {
        None => ParsedPath {
            dir: dir.to_string(),
            ..ParsedPath::default()
        },
        Some(file) => {
            let (name, ext) = file.split_once('.').unwrap_or((file, ""));
            if name.is_empty() {
                return ParsedPath::default();
            }
            ParsedPath {
                dir: dir.to_string(),
                name: name.to_string(),
                ext: ext.to_string(),
            }
        }
    }
}

/// 区分真正的根目录和解析失败的路径
pub fn classify(path: &str) -> PathKind {
    if path == "/" {
        return PathKind::Root;
    }
    let parsed = resolve(path);
    if parsed.is_empty() {
        PathKind::Invalid
    } else if parsed.is_file() {
        PathKind::File(parsed)
    } else {
        PathKind::Directory(parsed.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(path: &str) -> (String, String, String) {
        let p = resolve(path);
        (p.dir, p.name, p.ext)
    }

    fn owned(d: &str, n: &str, e: &str) -> (String, String, String) {
        (d.to_string(), n.to_string(), e.to_string())
    }

    #[test]
    fn directory_paths() {
        assert_eq!(parts("/docs"), owned("docs", "", ""));
        assert_eq!(parts("/docs/"), owned("docs", "", ""));
    }

    #[test]
    fn file_paths() {
        assert_eq!(parts("/docs/note.txt"), owned("docs", "note", "txt"));
        assert_eq!(parts("/docs/note"), owned("docs", "note", ""));
        assert_eq!(parts("/docs/note."), owned("docs", "note", ""));
        assert_eq!(parts("/docs/a.tar.gz"), owned("docs", "a", "tar.gz"));
    }

    #[test]
    fn malformed_paths_resolve_to_nothing() {
        for path in ["", "docs", "docs/note.txt", "/a/b/c", "//x", "/docs/.txt", "/"] {
            assert!(resolve(path).is_empty(), "{:?} should not resolve", path);
        }
    }

    #[test]
    fn classification() {
        assert_eq!(classify("/"), PathKind::Root);
        assert_eq!(classify("/docs"), PathKind::Directory("docs".into()));
        assert!(matches!(classify("/docs/x.y"), PathKind::File(_)));
        assert_eq!(classify("/a/b/c"), PathKind::Invalid);
        assert_eq!(classify("relative"), PathKind::Invalid);
    }
}
