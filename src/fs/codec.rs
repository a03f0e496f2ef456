//! 块内定长字段的编解码：8.3 名字和块头部的条目计数。
//!
//! 整数字段统一用 bincode 的定长小端编码，名字是以 nul 结尾的 ASCII 定长数组。

use crate::{
    disk::Block,
    fs::{
        config::COUNT_FIELD_LEN,
        error::{FileSystemError, Result},
    },
};

/// 校验名字：长度不超过 `max`，只允许可打印 ASCII 且不含路径分隔符
pub fn check_name(name: &str, max: usize) -> Result<()> {
    if name.len() > max {
        return Err(FileSystemError::NameTooLong(name.to_string()));
    }
    if !name.bytes().all(|b| b.is_ascii_graphic() && b != b'/') {
        return Err(FileSystemError::InvalidPath(name.to_string()));
    }
    Ok(())
}

/// 编码为定长字段，剩余部分补 0（至少留一个 nul）
pub fn encode_name<const N: usize>(name: &str) -> [u8; N] {
    let mut field = [0u8; N];
    let len = name.len().min(N - 1);
    field[..len].copy_from_slice(&name.as_bytes()[..len]);
    field
}

/// 取第一个 nul 之前的内容
pub fn decode_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// 读取块头部的条目计数，超过 `capacity` 视为损坏
pub fn read_count(block: &Block, capacity: usize, what: &str) -> Result<usize> {
    let count: i32 = bincode::deserialize(&block[..COUNT_FIELD_LEN])?;
    match usize::try_from(count) {
        Ok(n) if n <= capacity => Ok(n),
        _ => Err(FileSystemError::Corrupted(format!(
            "{} holds {} entries (capacity {})",
            what, count, capacity
        ))),
    }
}

pub fn write_count(block: &mut Block, count: usize) -> Result<()> {
    bincode::serialize_into(&mut block[..COUNT_FIELD_LEN], &(count as i32))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::BLOCK_SIZE;

    #[test]
    fn names_are_nul_padded() {
        let field: [u8; 9] = encode_name("docs");
        assert_eq!(&field, b"docs\0\0\0\0\0");
        assert_eq!(decode_name(&field), "docs");

        let full: [u8; 9] = encode_name("abcdefgh");
        assert_eq!(full[8], 0);
        assert_eq!(decode_name(&full), "abcdefgh");
    }

    #[test]
    fn name_limits() {
        assert!(check_name("abcdefgh", 8).is_ok());
        assert!(matches!(
            check_name("abcdefghi", 8),
            Err(FileSystemError::NameTooLong(_))
        ));
        assert!(matches!(
            check_name("a b", 8),
            Err(FileSystemError::InvalidPath(_))
        ));
    }

    #[test]
    fn count_is_a_little_endian_i32() {
        let mut block: Block = [0; BLOCK_SIZE];
        write_count(&mut block, 3).unwrap();
        assert_eq!(&block[..4], &[3, 0, 0, 0]);
        assert_eq!(read_count(&block, 29, "root").unwrap(), 3);

        block[..4].copy_from_slice(&(-2i32).to_le_bytes());
        assert!(matches!(
            read_count(&block, 29, "root"),
            Err(FileSystemError::Corrupted(_))
        ));
    }
}
