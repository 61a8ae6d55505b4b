use std::{
    ffi::{c_char, c_void},
    fmt,
};

use btck::ffi::block::{
    btck_Block, btck_BlockHash, btck_BlockHash_Init, btck_BlockHash_ToString, btck_Block_At,
    btck_Block_Copy, btck_Block_CountTransactions, btck_Block_GetHash, btck_Block_GetPrevHash,
    btck_Block_GetSize, btck_Block_New, btck_Block_ToBytes,
};

use crate::{
    c_serialize,
    children::{Children, Parent},
    error::check,
    handle::{check_owned, Owned},
    Error, Transaction,
};

/// A block hash in internal byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHash(btck_BlockHash);

impl BlockHash {
    /// Creates a block hash from exactly 32 bytes.
    pub fn new(raw: &[u8]) -> Result<Self, Error> {
        let mut hash = btck_BlockHash { hash: [0; 32] };
        check(|err| unsafe {
            btck_BlockHash_Init(&mut hash, raw.as_ptr() as *const c_void, raw.len(), err)
        })?;
        Ok(BlockHash(hash))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.hash
    }

    pub(crate) fn as_raw(&self) -> &btck_BlockHash {
        &self.0
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = [0 as c_char; 65];
        unsafe { btck_BlockHash_ToString(&self.0, buf.as_mut_ptr(), buf.len()) };
        let text = unsafe { std::ffi::CStr::from_ptr(buf.as_ptr()) };
        f.write_str(&text.to_string_lossy())
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self)
    }
}

/// A parsed block.
#[derive(Debug, Clone)]
pub struct Block {
    pub(crate) inner: Owned<btck_Block>,
}

impl Block {
    pub fn new(raw: &[u8]) -> Result<Self, Error> {
        let inner = check_owned(|err| unsafe {
            btck_Block_New(raw.as_ptr() as *const c_void, raw.len(), err)
        })?;
        Ok(Block { inner })
    }

    pub fn deep_copy(&self) -> Result<Self, Error> {
        let inner = check_owned(|err| unsafe { btck_Block_Copy(self.inner.as_ptr(), err) })?;
        Ok(Block { inner })
    }

    pub fn hash(&self) -> BlockHash {
        let mut hash = btck_BlockHash { hash: [0; 32] };
        unsafe { btck_Block_GetHash(self.inner.as_ptr(), &mut hash) };
        BlockHash(hash)
    }

    pub fn prev_hash(&self) -> BlockHash {
        let mut hash = btck_BlockHash { hash: [0; 32] };
        unsafe { btck_Block_GetPrevHash(self.inner.as_ptr(), &mut hash) };
        BlockHash(hash)
    }

    pub fn transaction_count(&self) -> usize {
        unsafe { btck_Block_CountTransactions(self.inner.as_ptr()) }
    }

    pub fn transaction(&self, index: usize) -> Result<Transaction, Error> {
        let inner = check_owned(|err| unsafe { btck_Block_At(self.inner.as_ptr(), index, err) })?;
        Ok(Transaction { inner })
    }

    pub fn transactions(&self) -> Children<'_, Block> {
        Children::new(self)
    }

    pub fn size(&self) -> usize {
        unsafe { btck_Block_GetSize(self.inner.as_ptr()) }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        c_serialize(|write, userdata, err| unsafe {
            btck_Block_ToBytes(self.inner.as_ptr(), Some(write), userdata, err)
        })
    }
}

impl Parent for Block {
    type Child = Transaction;

    fn child_count(&self) -> usize {
        self.transaction_count()
    }

    fn child_at(&self, index: usize) -> Result<Transaction, Error> {
        self.transaction(index)
    }
}

impl TryFrom<&[u8]> for Block {
    type Error = Error;

    fn try_from(raw: &[u8]) -> Result<Self, Self::Error> {
        Block::new(raw)
    }
}
