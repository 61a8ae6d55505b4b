use std::{ffi::c_char, path::Path};

use btck::ffi::chain::{
    btck_Chain, btck_Chain_At, btck_Chain_BlockIndex, btck_Chain_Find, btck_Chain_GetHeight,
    btck_Chain_GetSize, btck_Chain_Open,
};

use crate::{
    children::{Children, Parent},
    error::check,
    handle::{check_owned, Owned},
    Block, BlockHash, Error,
};

pub use btck::ChainType;

/// The active chain read from a node's data directory.
#[derive(Debug, Clone)]
pub struct Chain {
    inner: Owned<btck_Chain>,
}

impl Chain {
    pub fn open(data_dir: impl AsRef<Path>, chain_type: ChainType) -> Result<Self, Error> {
        let data_dir = data_dir.as_ref();
        let path = data_dir.to_str().ok_or_else(|| {
            Error::new(
                btck::domain::VALUE,
                3,
                format!("data directory {} is not valid UTF-8", data_dir.display()),
            )
        })?;
        let inner = check_owned(|err| unsafe {
            btck_Chain_Open(
                path.as_ptr() as *const c_char,
                path.len(),
                chain_type.into(),
                err,
            )
        })?;
        Ok(Chain { inner })
    }

    /// Height of the tip, or -1 for an empty chain.
    pub fn height(&self) -> i32 {
        unsafe { btck_Chain_GetHeight(self.inner.as_ptr()) }
    }

    pub fn size(&self) -> usize {
        unsafe { btck_Chain_GetSize(self.inner.as_ptr()) }
    }

    pub fn at(&self, height: usize) -> Result<Block, Error> {
        let inner = check_owned(|err| unsafe { btck_Chain_At(self.inner.as_ptr(), height, err) })?;
        Ok(Block { inner })
    }

    /// The block at the tip, or `None` for an empty chain.
    pub fn tip(&self) -> Result<Option<Block>, Error> {
        self.blocks().last()
    }

    pub fn blocks(&self) -> Children<'_, Chain> {
        Children::new(self)
    }

    /// Height of the block with `hash`, if it is part of the chain.
    pub fn find(&self, hash: &BlockHash) -> Option<usize> {
        let height = unsafe { btck_Chain_Find(self.inner.as_ptr(), hash.as_raw()) };
        usize::try_from(height).ok()
    }

    /// Like [`Chain::find`], with a `LookupError` for a missing block.
    pub fn block_index(&self, hash: &BlockHash) -> Result<usize, Error> {
        check(|err| unsafe { btck_Chain_BlockIndex(self.inner.as_ptr(), hash.as_raw(), err) })
    }
}

impl Parent for Chain {
    type Child = Block;

    fn child_count(&self) -> usize {
        self.size()
    }

    fn child_at(&self, index: usize) -> Result<Block, Error> {
        self.at(index)
    }
}
