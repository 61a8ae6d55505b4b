use std::{
    ffi::{c_char, c_int, c_void},
    ptr,
};

use crate::{
    ffi::{
        c_helpers::{bytes, guard, store, to_c_bool, to_c_result, write_c_string},
        error::btck_Error,
        handle::{export_handle, Handle},
        sink::{btck_WriteBytes, serialize_to},
        transaction::btck_Transaction,
    },
    Block, BlockHash, Transaction,
};

pub type btck_Block = Block;

/// A 32-byte block hash in internal byte order, passed by value.
pub type btck_BlockHash = BlockHash;

impl Handle for Block {
    const NAME: &'static str = "Block";
}

export_handle!(btck_Block, btck_Block_Retain, btck_Block_Release, btck_Block_Copy);

/// Parses a consensus-encoded block.
///
/// # Safety
/// `raw` must be valid for `len` bytes; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Block_New(
    raw: *const c_void,
    len: usize,
    err: *mut *mut btck_Error,
) -> *mut btck_Block {
    guard(err, ptr::null_mut(), || {
        let block = Block::new(bytes(raw, len)?)?;
        log::trace!("Parsed block {}", block.hash());
        Ok(Block::new_handle(block))
    })
}

/// # Safety
/// The handle must be live.
#[no_mangle]
pub unsafe extern "C" fn btck_Block_CountTransactions(block: *const btck_Block) -> usize {
    block.as_ref().map_or(0, Block::transaction_count)
}

/// Returns a new reference to the transaction at `index`.
///
/// # Safety
/// The handle must be live; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Block_At(
    block: *const btck_Block,
    index: usize,
    err: *mut *mut btck_Error,
) -> *mut btck_Transaction {
    guard(err, ptr::null_mut(), || {
        let tx = Block::borrow(block)?.transaction(index)?;
        Ok(Transaction::into_handle(tx))
    })
}

/// # Safety
/// The handle must be live; `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Block_GetHash(block: *const btck_Block, out: *mut btck_BlockHash) {
    if let Some(block) = block.as_ref() {
        store(out, block.hash());
    }
}

/// # Safety
/// The handle must be live; `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Block_GetPrevHash(
    block: *const btck_Block,
    out: *mut btck_BlockHash,
) {
    if let Some(block) = block.as_ref() {
        store(out, block.prev_hash());
    }
}

/// # Safety
/// The handle must be live.
#[no_mangle]
pub unsafe extern "C" fn btck_Block_GetSize(block: *const btck_Block) -> usize {
    block.as_ref().map_or(0, Block::size)
}

/// Streams the serialized block to `write`. Returns 0 on success.
///
/// # Safety
/// The handle must be live; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Block_ToBytes(
    block: *const btck_Block,
    write: btck_WriteBytes,
    userdata: *mut c_void,
    err: *mut *mut btck_Error,
) -> c_int {
    guard(err, to_c_result(false), || {
        let block = Block::borrow(block)?;
        serialize_to(write, userdata, |sink| block.write_to(sink))?;
        Ok(to_c_result(true))
    })
}

/// Initializes `hash` from exactly 32 bytes. Returns 0 on success; any
/// other length is a `ValueError`.
///
/// # Safety
/// `raw` must be valid for `len` bytes; `hash` must be writable.
#[no_mangle]
pub unsafe extern "C" fn btck_BlockHash_Init(
    hash: *mut btck_BlockHash,
    raw: *const c_void,
    len: usize,
    err: *mut *mut btck_Error,
) -> c_int {
    guard(err, to_c_result(false), || {
        let parsed = BlockHash::new(bytes(raw, len)?)?;
        store(hash, parsed);
        Ok(to_c_result(true))
    })
}

/// # Safety
/// Both pointers must be valid.
#[no_mangle]
pub unsafe extern "C" fn btck_BlockHash_Equal(
    a: *const btck_BlockHash,
    b: *const btck_BlockHash,
) -> c_int {
    match (a.as_ref(), b.as_ref()) {
        (Some(a), Some(b)) => to_c_bool(a == b),
        _ => 0,
    }
}

/// Writes the reversed-hex form of `hash` into `buf` with `snprintf`
/// semantics and returns 64.
///
/// # Safety
/// `hash` must be valid; `buf` must be null or valid for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn btck_BlockHash_ToString(
    hash: *const btck_BlockHash,
    buf: *mut c_char,
    len: usize,
) -> c_int {
    match hash.as_ref() {
        Some(hash) => write_c_string(&hash.to_string(), buf, len),
        None => -1,
    }
}
