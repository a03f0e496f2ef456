use crate::{
    disk::{Block, BlockDevice, BlockId, BLOCK_SIZE},
    fs::{
        config::{BLOCK_ID_FIELD_LEN, END_OF_CHAIN, MAX_DATA_IN_BLOCK},
        error::{FileSystemError, Result},
    },
};

/// 文件数据块：开头 8 字节是下一块的块号（-1 表示链表结尾），其余是数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    pub next: Option<BlockId>,
    pub payload: [u8; MAX_DATA_IN_BLOCK],
}

impl Default for DataBlock {
    fn default() -> Self {
        Self {
            next: None,
            payload: [0; MAX_DATA_IN_BLOCK],
        }
    }
}

impl DataBlock {
    /// 新的链表结尾块
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(disk: &dyn BlockDevice, block_id: BlockId) -> Result<Self> {
        let mut block: Block = [0; BLOCK_SIZE];
        disk.read_block(block_id, &mut block)?;
        Self::from_block(&block)
    }

    pub fn store(&self, disk: &dyn BlockDevice, block_id: BlockId) -> Result<()> {
        disk.write_block(block_id, &self.to_block()?)?;
        Ok(())
    }

    pub fn from_block(block: &Block) -> Result<Self> {
        let raw: i64 = bincode::deserialize(&block[..BLOCK_ID_FIELD_LEN])?;
        let next = match raw {
            END_OF_CHAIN => None,
            // 块 0 是根目录，不可能出现在数据链上
            0 => return Err(FileSystemError::Corrupted("chain links to the root block".into())),
            _ => Some(BlockId::from_raw(raw).ok_or_else(|| {
                FileSystemError::Corrupted(format!("invalid chain link {}", raw))
            })?),
        };
        let mut payload = [0u8; MAX_DATA_IN_BLOCK];
        payload.copy_from_slice(&block[BLOCK_ID_FIELD_LEN..]);
        Ok(Self { next, payload })
    }

    pub fn to_block(&self) -> Result<Block> {
        let mut block: Block = [0; BLOCK_SIZE];
        let raw = self.next.map_or(END_OF_CHAIN, BlockId::to_raw);
        bincode::serialize_into(&mut block[..BLOCK_ID_FIELD_LEN], &raw)?;
        block[BLOCK_ID_FIELD_LEN..].copy_from_slice(&self.payload);
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_chain_is_minus_one() {
        let block = DataBlock::new().to_block().unwrap();
        assert_eq!(&block[..8], &(-1i64).to_le_bytes());
        assert_eq!(DataBlock::from_block(&block).unwrap().next, None);
    }

    #[test]
    fn link_and_payload_positions() {
        let mut data = DataBlock::new();
        data.next = Some(BlockId::new(9));
        data.payload[0] = b'h';
        data.payload[MAX_DATA_IN_BLOCK - 1] = b'!';

        let block = data.to_block().unwrap();
        assert_eq!(&block[..8], &9i64.to_le_bytes());
        assert_eq!(block[8], b'h');
        assert_eq!(block[BLOCK_SIZE - 1], b'!');
        assert_eq!(DataBlock::from_block(&block).unwrap(), data);
    }

    #[test]
    fn zeroed_block_is_not_a_chain_block() {
        assert!(DataBlock::from_block(&[0; BLOCK_SIZE]).is_err());
    }

    #[test]
    fn other_negative_links_are_corruption() {
        let mut block: Block = [0; BLOCK_SIZE];
        block[..8].copy_from_slice(&(-7i64).to_le_bytes());
        assert!(matches!(
            DataBlock::from_block(&block),
            Err(FileSystemError::Corrupted(_))
        ));
    }
}
