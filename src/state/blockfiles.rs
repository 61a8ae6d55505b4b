//! Reader for the `blk?????.dat` files a node writes blocks to.
//!
//! Each file is a sequence of `magic | size (u32 LE) | block` records,
//! padded with zeros at the end. When `xor.dat` holds a non-zero key,
//! every file byte is XORed with `key[offset % key.len()]`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{Block, KernelError};

const RECORD_HEADER_LEN: usize = 8;

/// Returns the block files in `blocks_dir` in name order.
pub fn block_files(blocks_dir: &Path) -> Result<Vec<PathBuf>, KernelError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(blocks_dir)? {
        let path = entry?.path();
        let is_block_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("blk") && name.ends_with(".dat"))
            .unwrap_or(false);
        if is_block_file && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Reads the obfuscation key, if any.
pub fn obfuscation_key(blocks_dir: &Path) -> Result<Option<Vec<u8>>, KernelError> {
    let path = blocks_dir.join("xor.dat");
    if !path.exists() {
        return Ok(None);
    }
    let key = fs::read(path)?;
    if key.iter().all(|byte| *byte == 0) {
        return Ok(None);
    }
    Ok(Some(key))
}

fn deobfuscate(data: &mut [u8], key: &[u8]) {
    for (offset, byte) in data.iter_mut().enumerate() {
        *byte ^= key[offset % key.len()];
    }
}

/// Parses every block record in `data`.
pub fn parse_records(data: &[u8], magic: [u8; 4]) -> Result<Vec<Block>, KernelError> {
    let mut blocks = Vec::new();
    let mut pos = 0;
    while pos + RECORD_HEADER_LEN <= data.len() {
        let header = &data[pos..pos + RECORD_HEADER_LEN];
        if header[..4] == [0u8; 4] {
            break;
        }
        if header[..4] != magic {
            return Err(KernelError::Parse {
                what: "block file",
                reason: format!("unexpected magic {} at offset {}", hex::encode(&header[..4]), pos),
            });
        }
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
        let start = pos + RECORD_HEADER_LEN;
        let end = start + size;
        if end > data.len() {
            log::warn!(
                "Block record at offset {} is truncated ({} of {} bytes)",
                pos,
                data.len() - start,
                size
            );
            break;
        }
        blocks.push(Block::new(&data[start..end])?);
        pos = end;
    }
    Ok(blocks)
}

/// Reads all blocks stored in `blocks_dir`, in file order.
pub fn read_blocks(blocks_dir: &Path, magic: [u8; 4]) -> Result<Vec<Block>, KernelError> {
    let key = obfuscation_key(blocks_dir)?;
    let mut blocks = Vec::new();
    for path in block_files(blocks_dir)? {
        let mut data = fs::read(&path)?;
        if let Some(key) = &key {
            deobfuscate(&mut data, key);
        }
        let parsed = parse_records(&data, magic)?;
        log::debug!("Read {} blocks from {}", parsed.len(), path.display());
        blocks.extend(parsed);
    }
    Ok(blocks)
}

#[cfg(test)]
pub(crate) fn encode_records(blocks: &[bitcoin::Block], magic: [u8; 4]) -> Vec<u8> {
    let mut data = Vec::new();
    for block in blocks {
        let raw = bitcoin::consensus::serialize(block);
        data.extend_from_slice(&magic);
        data.extend_from_slice(&(raw.len() as u32).to_le_bytes());
        data.extend_from_slice(&raw);
    }
    data
}
