// Copyright (c) 2023-present The Bitcoin Kernel developers
// Licensed under the MIT License. See LICENSE file in the project root.

use std::{fmt, io, str::FromStr, sync::Arc};

use bitcoin::hashes::Hash;

use crate::{
    core::{decode, range::Range, range::Sequence, transaction::Transaction, try_copy},
    KernelError,
};

/// A type for a Block hash.
///
/// The bytes are kept in internal (little-endian) order; [`fmt::Display`]
/// prints them reversed, the way block explorers show hashes.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[repr(C)]
pub struct BlockHash {
    pub hash: [u8; 32],
}

impl BlockHash {
    pub const LEN: usize = 32;

    /// Creates a block hash from exactly 32 bytes.
    ///
    /// # Errors
    /// Returns [`KernelError::InvalidLength`] for any other length.
    pub fn new(bytes: &[u8]) -> Result<Self, KernelError> {
        let hash: [u8; 32] = bytes.try_into().map_err(|_| KernelError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(BlockHash { hash })
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    pub fn to_bytes(self) -> [u8; 32] {
        self.hash
    }
}

impl TryFrom<&[u8]> for BlockHash {
    type Error = KernelError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        BlockHash::new(bytes)
    }
}

impl From<[u8; 32]> for BlockHash {
    fn from(hash: [u8; 32]) -> Self {
        BlockHash { hash }
    }
}

impl From<BlockHash> for [u8; 32] {
    fn from(hash: BlockHash) -> Self {
        hash.hash
    }
}

impl From<bitcoin::BlockHash> for BlockHash {
    fn from(hash: bitcoin::BlockHash) -> Self {
        BlockHash {
            hash: hash.to_byte_array(),
        }
    }
}

impl From<BlockHash> for bitcoin::BlockHash {
    fn from(hash: BlockHash) -> Self {
        bitcoin::BlockHash::from_byte_array(hash.hash)
    }
}

impl FromStr for BlockHash {
    type Err = KernelError;

    /// Parses the reversed hex form produced by [`fmt::Display`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        bitcoin::BlockHash::from_str(s)
            .map(BlockHash::from)
            .map_err(|err| KernelError::InvalidArgument(format!("invalid block hash: {}", err)))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&bitcoin::BlockHash::from(*self), f)
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self)
    }
}

/// A Bitcoin block containing a header and transactions.
///
/// Blocks can be created from raw serialized data or retrieved from a
/// [`crate::Chain`]. Transactions are materialized once at construction
/// and handed out as shared references.
#[derive(Debug, Clone)]
pub struct Block {
    header: bitcoin::block::Header,
    raw: Vec<u8>,
    hash: BlockHash,
    transactions: Vec<Arc<Transaction>>,
}

impl Block {
    /// Parses a block from its consensus encoding.
    ///
    /// # Errors
    /// Returns [`KernelError::Parse`] for malformed bytes and
    /// [`KernelError::TrailingData`] if bytes remain after the block.
    pub fn new(raw: &[u8]) -> Result<Self, KernelError> {
        let block = decode::<bitcoin::Block>("block", raw)?;
        Ok(Self::with_raw(block, try_copy(raw)?))
    }

    pub(crate) fn with_raw(block: bitcoin::Block, raw: Vec<u8>) -> Self {
        let hash = BlockHash::from(block.block_hash());
        let transactions = block
            .txdata
            .into_iter()
            .map(|tx| Arc::new(Transaction::from_consensus(tx)))
            .collect();
        Block {
            header: block.header,
            raw,
            hash,
            transactions,
        }
    }

    /// Returns the hash of this block.
    ///
    /// This is the double SHA256 hash of the block header, which serves as
    /// the block's unique identifier.
    pub fn hash(&self) -> BlockHash {
        self.hash
    }

    /// Returns the hash of the block this one builds on.
    pub fn prev_hash(&self) -> BlockHash {
        BlockHash::from(self.header.prev_blockhash)
    }

    pub fn header(&self) -> &bitcoin::block::Header {
        &self.header
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Returns a new reference to the transaction at `index`.
    ///
    /// # Errors
    /// Returns [`KernelError::OutOfBounds`] if `index` is out of range.
    pub fn transaction(&self, index: usize) -> Result<Arc<Transaction>, KernelError> {
        self.transactions
            .get(index)
            .cloned()
            .ok_or(KernelError::OutOfBounds {
                index,
                len: self.transactions.len(),
            })
    }

    /// A view over the transactions of this block.
    pub fn transactions(self: &Arc<Self>) -> Range<Block> {
        Range::new(Arc::clone(self))
    }

    /// Size of the serialized block in bytes.
    pub fn size(&self) -> usize {
        self.raw.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> Result<(), KernelError> {
        writer
            .write_all(&self.raw)
            .map_err(|_| KernelError::SerializationFailed)
    }
}

impl Sequence for Block {
    type Item = Arc<Transaction>;

    fn len(&self) -> usize {
        self.transactions.len()
    }

    fn item(&self, index: usize) -> Self::Item {
        Arc::clone(&self.transactions[index])
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Block {}

impl TryFrom<&[u8]> for Block {
    type Error = KernelError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Block::new(bytes)
    }
}

impl From<&Block> for Vec<u8> {
    fn from(block: &Block) -> Self {
        block.raw.clone()
    }
}

impl From<Block> for Vec<u8> {
    fn from(block: Block) -> Self {
        block.raw
    }
}
