use std::{
    ffi::{c_char, c_int},
    ptr,
};

use crate::{
    ffi::{
        block::{btck_Block, btck_BlockHash},
        c_helpers::{guard, to_str},
        constants::btck_ChainType,
        error::btck_Error,
        handle::{export_handle, Handle},
    },
    Block, Chain, ChainOptions, ChainType,
};

pub type btck_Chain = Chain;

impl Handle for Chain {
    const NAME: &'static str = "Chain";
}

export_handle!(btck_Chain, btck_Chain_Retain, btck_Chain_Release);

/// Opens the chain stored under `data_dir` (`len` bytes, not
/// NUL-terminated) for `chain_type`.
///
/// # Safety
/// `data_dir` must be valid for `len` bytes; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Chain_Open(
    data_dir: *const c_char,
    len: usize,
    chain_type: btck_ChainType,
    err: *mut *mut btck_Error,
) -> *mut btck_Chain {
    guard(err, ptr::null_mut(), || {
        let options = ChainOptions::builder(to_str(data_dir, len)?)
            .chain_type(ChainType::try_from(chain_type)?)
            .build()?;
        Ok(Chain::new_handle(Chain::open(&options)?))
    })
}

/// Height of the tip, or -1 for an empty chain.
///
/// # Safety
/// The handle must be live.
#[no_mangle]
pub unsafe extern "C" fn btck_Chain_GetHeight(chain: *const btck_Chain) -> c_int {
    chain.as_ref().map_or(-1, Chain::height)
}

/// Number of blocks, always `height + 1`.
///
/// # Safety
/// The handle must be live.
#[no_mangle]
pub unsafe extern "C" fn btck_Chain_GetSize(chain: *const btck_Chain) -> usize {
    chain.as_ref().map_or(0, Chain::size)
}

/// Returns a new reference to the block at `height`.
///
/// # Safety
/// The handle must be live; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Chain_At(
    chain: *const btck_Chain,
    height: usize,
    err: *mut *mut btck_Error,
) -> *mut btck_Block {
    guard(err, ptr::null_mut(), || {
        let block = Chain::borrow(chain)?.at(height)?;
        Ok(Block::into_handle(block))
    })
}

/// Height of the block with `hash`, or -1 if it is not in the chain.
///
/// # Safety
/// The handle and `hash` must be valid.
#[no_mangle]
pub unsafe extern "C" fn btck_Chain_Find(
    chain: *const btck_Chain,
    hash: *const btck_BlockHash,
) -> isize {
    match (chain.as_ref(), hash.as_ref()) {
        (Some(chain), Some(hash)) => chain
            .find(hash)
            .and_then(|height| isize::try_from(height).ok())
            .unwrap_or(-1),
        _ => -1,
    }
}

/// Height of the block with `hash`. A missing block is a `LookupError`
/// and returns 0.
///
/// # Safety
/// The handle and `hash` must be valid; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Chain_BlockIndex(
    chain: *const btck_Chain,
    hash: *const btck_BlockHash,
    err: *mut *mut btck_Error,
) -> usize {
    guard(err, 0, || {
        let chain = Chain::borrow(chain)?;
        let hash = hash.as_ref().ok_or_else(|| {
            crate::KernelError::InvalidArgument("null block hash".to_string())
        })?;
        chain.block_index(hash)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_utils::make_chain;
    use crate::ffi::{
        block::{btck_Block_GetHash, btck_Block_Release},
        constants::{BTCK_CHAIN_TYPE_MAINNET, BTCK_CHAIN_TYPE_REGTEST},
        error::{btck_Error_Domain, btck_Error_Free},
    };
    use crate::state::blockfiles::encode_records;
    use crate::BlockHash;
    use std::ffi::CStr;
    use tempdir::TempDir;

    fn data_dir(blocks: u8) -> (TempDir, Vec<bitcoin::Block>) {
        let dir = TempDir::new("btck_ffi_chain").unwrap();
        let blocks_dir = dir.path().join("blocks");
        std::fs::create_dir(&blocks_dir).unwrap();
        let chain = make_chain(blocks);
        std::fs::write(
            blocks_dir.join("blk00000.dat"),
            encode_records(&chain, ChainType::Regtest.magic()),
        )
        .unwrap();
        (dir, chain)
    }

    unsafe fn open(dir: &TempDir, chain_type: btck_ChainType, err: *mut *mut btck_Error) -> *mut btck_Chain {
        let path = dir.path().to_str().unwrap();
        btck_Chain_Open(path.as_ptr() as *const c_char, path.len(), chain_type, err)
    }

    unsafe fn domain(err: *const btck_Error) -> String {
        CStr::from_ptr(btck_Error_Domain(err)).to_string_lossy().into_owned()
    }

    #[test]
    fn test_open_and_query() {
        let (dir, blocks) = data_dir(4);
        unsafe {
            let chain = open(&dir, BTCK_CHAIN_TYPE_REGTEST, ptr::null_mut());
            assert!(!chain.is_null());
            assert_eq!(btck_Chain_GetHeight(chain), 3);
            assert_eq!(btck_Chain_GetSize(chain), 4);

            let tip = btck_Chain_At(chain, 3, ptr::null_mut());
            let mut hash = BlockHash::from([0; 32]);
            btck_Block_GetHash(tip, &mut hash);
            assert_eq!(hash, BlockHash::from(blocks[3].block_hash()));
            assert_eq!(btck_Chain_Find(chain, &hash), 3);
            assert_eq!(btck_Chain_BlockIndex(chain, &hash, ptr::null_mut()), 3);

            btck_Chain_Release(chain);
            // The block handle keeps its own reference.
            let mut again = BlockHash::from([0; 32]);
            btck_Block_GetHash(tip, &mut again);
            assert_eq!(again, hash);
            btck_Block_Release(tip);
        }
    }

    #[test]
    fn test_missing_block() {
        let (dir, _) = data_dir(2);
        unsafe {
            let chain = open(&dir, BTCK_CHAIN_TYPE_REGTEST, ptr::null_mut());
            let missing = BlockHash::from([0x42; 32]);
            assert_eq!(btck_Chain_Find(chain, &missing), -1);

            let mut err: *mut btck_Error = ptr::null_mut();
            assert_eq!(btck_Chain_BlockIndex(chain, &missing, &mut err), 0);
            assert_eq!(domain(err), "LookupError");
            btck_Error_Free(err);

            let mut err: *mut btck_Error = ptr::null_mut();
            assert!(btck_Chain_At(chain, 2, &mut err).is_null());
            assert_eq!(domain(err), "IndexError");
            btck_Error_Free(err);

            btck_Chain_Release(chain);
        }
    }

    #[test]
    fn test_open_failures() {
        let (dir, _) = data_dir(1);
        unsafe {
            let mut err: *mut btck_Error = ptr::null_mut();
            assert!(open(&dir, 17, &mut err).is_null());
            assert_eq!(domain(err), "ValueError");
            btck_Error_Free(err);

            let mut err: *mut btck_Error = ptr::null_mut();
            assert!(open(&dir, BTCK_CHAIN_TYPE_MAINNET, &mut err).is_null());
            assert_eq!(domain(err), "ParseError");
            btck_Error_Free(err);

            let mut err: *mut btck_Error = ptr::null_mut();
            let missing = "/nonexistent/btck";
            let chain = btck_Chain_Open(
                missing.as_ptr() as *const c_char,
                missing.len(),
                BTCK_CHAIN_TYPE_REGTEST,
                &mut err,
            );
            assert!(chain.is_null());
            assert_eq!(domain(err), "ValueError");
            btck_Error_Free(err);
        }
    }
}
