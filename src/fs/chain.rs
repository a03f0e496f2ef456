//! 按字节区间读写文件的数据块链。
//!
//! 文件内容是从起始块出发、沿 `next` 依次经过的各块数据区拼接而成，
//! 截断到目录项中记录的大小。写入越过链尾时按需分配新块并挂到链上，
//! 写完后最后写到的块就是新的链尾。

use log::debug;

use crate::{
    disk::{BlockDevice, BlockId},
    fs::{
        config::MAX_DATA_IN_BLOCK,
        data_block::DataBlock,
        error::{FileSystemError, Result},
        free_list::FreeList,
    },
};

const PAYLOAD: u64 = MAX_DATA_IN_BLOCK as u64;

/// 读取 `[offset, size)` 区间，恰好返回 `size - offset` 字节
pub fn read_range(disk: &dyn BlockDevice, start: BlockId, size: u64, offset: u64) -> Result<Vec<u8>> {
    check_size(disk, size)?;
    if offset > size {
        return Err(FileSystemError::OffsetBeyondEnd { offset, size });
    }
    debug!("reading chain {} (offset = {}; size = {})", start, offset, size);

    let mut data = Vec::with_capacity((size - offset) as usize);
    if offset == size {
        return Ok(data);
    }

    let mut id = start;
    let mut block = DataBlock::load(disk, id)?;
    // 跳过 offset 之前的整块
    for _ in 0..offset / PAYLOAD {
        (id, block) = follow(disk, id, &block)?;
    }

    let mut position = offset;
    while position < size {
        let in_block = (position % PAYLOAD) as usize;
        if in_block == 0 && position != offset {
            (id, block) = follow(disk, id, &block)?;
        }
        let len = (MAX_DATA_IN_BLOCK - in_block).min((size - position) as usize);
        data.extend_from_slice(&block.payload[in_block..in_block + len]);
        position += len as u64;
    }

    Ok(data)
}

/// 从 `offset` 开始写入 `buf`，必要时延长链表，返回新的文件大小
/// `offset + buf.len()`。
///
/// 最后写到的块成为链尾，原来挂在它后面的块从链上摘下，但不回收。
/// 空写入不改变任何东西。调用方负责把新大小写回目录项。
pub fn write_range(
    disk: &dyn BlockDevice,
    free_list: &FreeList,
    start: BlockId,
    size: u64,
    buf: &[u8],
    offset: u64,
) -> Result<u64> {
    check_size(disk, size)?;
    if offset > size {
        return Err(FileSystemError::OffsetBeyondEnd { offset, size });
    }
    debug!(
        "writing chain {} (offset = {}; buf.len() = {})",
        start,
        offset,
        buf.len()
    );
    if buf.is_empty() {
        return Ok(size);
    }

    // 整个镜像都装不下的写入不分配任何块
    let end = offset
        .checked_add(buf.len() as u64)
        .filter(|&end| end <= capacity(disk))
        .ok_or(FileSystemError::NoSpace)?;
    let mut id = start;
    let mut block = DataBlock::load(disk, id)?;
    for _ in 0..offset / PAYLOAD {
        (id, block) = advance(disk, free_list, id, &mut block, false)?;
    }

    let mut position = offset;
    while position < end {
        let in_block = (position % PAYLOAD) as usize;
        if in_block == 0 && position != offset {
            (id, block) = advance(disk, free_list, id, &mut block, true)?;
        }
        let len = (MAX_DATA_IN_BLOCK - in_block).min((end - position) as usize);
        let from = (position - offset) as usize;
        block.payload[in_block..in_block + len].copy_from_slice(&buf[from..from + len]);
        position += len as u64;
    }
    if let Some(orphan) = block.next.take() {
        debug!("cut chain at {}, dropping {}", id, orphan);
    }
    block.store(disk, id)?;

    Ok(end)
}

/// 从起始块走完整条链，返回经过的块号
pub fn chain_blocks(disk: &dyn BlockDevice, start: BlockId) -> Result<Vec<BlockId>> {
    let mut blocks = vec![start];
    let mut block = DataBlock::load(disk, start)?;
    while let Some(next) = block.next {
        if blocks.len() as u64 >= disk.block_count() {
            return Err(FileSystemError::Corrupted(format!(
                "chain starting at {} does not terminate",
                start
            )));
        }
        blocks.push(next);
        block = DataBlock::load(disk, next)?;
    }
    Ok(blocks)
}

fn capacity(disk: &dyn BlockDevice) -> u64 {
    disk.block_count().saturating_mul(PAYLOAD)
}

// 目录项记录的大小不可能超过整个镜像的数据容量
fn check_size(disk: &dyn BlockDevice, size: u64) -> Result<()> {
    if size > capacity(disk) {
        return Err(FileSystemError::Corrupted(format!(
            "file size {} exceeds the image",
            size
        )));
    }
    Ok(())
}

// 读路径：链表提前结束说明镜像损坏
fn follow(disk: &dyn BlockDevice, id: BlockId, block: &DataBlock) -> Result<(BlockId, DataBlock)> {
    let next = block
        .next
        .ok_or_else(|| FileSystemError::Corrupted(format!("chain ends early at block {}", id)))?;
    Ok((next, DataBlock::load(disk, next)?))
}

// 写路径：离开当前块前写回，到了链尾就分配新块
fn advance(
    disk: &dyn BlockDevice,
    free_list: &FreeList,
    id: BlockId,
    block: &mut DataBlock,
    dirty: bool,
) -> Result<(BlockId, DataBlock)> {
    match block.next {
        Some(next) => {
            if dirty {
                block.store(disk, id)?;
            }
            Ok((next, DataBlock::load(disk, next)?))
        }
        None => {
            let next = free_list.allocate(disk)?;
            block.next = Some(next);
            block.store(disk, id)?;
            debug!("extended chain: {} -> {}", id, next);
            Ok((next, DataBlock::new()))
        }
    }
}
