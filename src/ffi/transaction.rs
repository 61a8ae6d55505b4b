use std::{
    ffi::{c_int, c_void},
    io::Write,
    ptr,
};

use bitcoin::hashes::Hash;

use crate::{
    ffi::{
        c_helpers::{bytes, guard, guard_infallible, store, to_c_bool, to_c_result},
        error::btck_Error,
        handle::{export_handle, Handle},
        script::btck_ScriptPubkey,
        sink::{btck_WriteBytes, serialize_to},
    },
    ScriptPubkey, Transaction, TransactionOutput,
};

pub type btck_TransactionOutput = TransactionOutput;
pub type btck_Transaction = Transaction;

impl Handle for TransactionOutput {
    const NAME: &'static str = "TransactionOutput";
}

impl Handle for Transaction {
    const NAME: &'static str = "Transaction";
}

export_handle!(
    btck_TransactionOutput,
    btck_TransactionOutput_Retain,
    btck_TransactionOutput_Release,
    btck_TransactionOutput_Copy
);

export_handle!(
    btck_Transaction,
    btck_Transaction_Retain,
    btck_Transaction_Release,
    btck_Transaction_Copy
);

/// Creates an output paying `amount` satoshis to `script_pubkey`. The
/// output shares the script; the caller keeps its own reference.
///
/// # Safety
/// `script_pubkey` must be live; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_TransactionOutput_New(
    script_pubkey: *const btck_ScriptPubkey,
    amount: i64,
    err: *mut *mut btck_Error,
) -> *mut btck_TransactionOutput {
    guard(err, ptr::null_mut(), || {
        let script = ScriptPubkey::shared(script_pubkey)?;
        Ok(TransactionOutput::new_handle(TransactionOutput::new(
            script, amount,
        )))
    })
}

/// # Safety
/// The handle must be live.
#[no_mangle]
pub unsafe extern "C" fn btck_TransactionOutput_GetAmount(
    output: *const btck_TransactionOutput,
) -> i64 {
    output.as_ref().map_or(0, TransactionOutput::amount)
}

/// Returns a new reference to the output's script. Release it when done.
///
/// # Safety
/// The handle must be live.
#[no_mangle]
pub unsafe extern "C" fn btck_TransactionOutput_GetScriptPubkey(
    output: *const btck_TransactionOutput,
) -> *mut btck_ScriptPubkey {
    match output.as_ref() {
        Some(output) => ScriptPubkey::into_handle(output.script_pubkey()),
        None => ptr::null_mut(),
    }
}

/// Returns 1 if both outputs have the same amount and script bytes.
///
/// # Safety
/// Both handles must be live.
#[no_mangle]
pub unsafe extern "C" fn btck_TransactionOutput_Equal(
    a: *const btck_TransactionOutput,
    b: *const btck_TransactionOutput,
) -> c_int {
    guard_infallible(0, || match (a.as_ref(), b.as_ref()) {
        (Some(a), Some(b)) => to_c_bool(a == b),
        _ => 0,
    })
}

/// Parses a consensus-encoded transaction. The input must be consumed
/// exactly.
///
/// # Safety
/// `raw` must be valid for `len` bytes; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Transaction_New(
    raw: *const c_void,
    len: usize,
    err: *mut *mut btck_Error,
) -> *mut btck_Transaction {
    guard(err, ptr::null_mut(), || {
        let tx = Transaction::new(bytes(raw, len)?)?;
        Ok(Transaction::new_handle(tx))
    })
}

/// # Safety
/// The handle must be live.
#[no_mangle]
pub unsafe extern "C" fn btck_Transaction_CountInputs(tx: *const btck_Transaction) -> usize {
    tx.as_ref().map_or(0, Transaction::input_count)
}

/// # Safety
/// The handle must be live.
#[no_mangle]
pub unsafe extern "C" fn btck_Transaction_CountOutputs(tx: *const btck_Transaction) -> usize {
    tx.as_ref().map_or(0, Transaction::output_count)
}

/// Returns a new reference to the output at `index`, or null with an
/// `IndexError` when out of range.
///
/// # Safety
/// The handle must be live; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Transaction_At(
    tx: *const btck_Transaction,
    index: usize,
    err: *mut *mut btck_Error,
) -> *mut btck_TransactionOutput {
    guard(err, ptr::null_mut(), || {
        let output = Transaction::borrow(tx)?.output(index)?;
        Ok(TransactionOutput::into_handle(output))
    })
}

/// Writes the 32-byte txid in internal byte order to `out`.
///
/// # Safety
/// The handle must be live; `out` must be valid for 32 bytes.
#[no_mangle]
pub unsafe extern "C" fn btck_Transaction_GetTxid(tx: *const btck_Transaction, out: *mut u8) {
    if let (Some(tx), false) = (tx.as_ref(), out.is_null()) {
        let txid = tx.txid().to_byte_array();
        ptr::copy_nonoverlapping(txid.as_ptr(), out, txid.len());
    }
}

/// # Safety
/// The handle must be live.
#[no_mangle]
pub unsafe extern "C" fn btck_Transaction_GetSize(tx: *const btck_Transaction) -> usize {
    tx.as_ref().map_or(0, Transaction::size)
}

/// The serialized transaction, valid while the handle is alive.
///
/// # Safety
/// The handle must be live; `len` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Transaction_AsBytes(
    tx: *const btck_Transaction,
    len: *mut usize,
) -> *const u8 {
    match tx.as_ref() {
        Some(tx) => {
            store(len, tx.size());
            tx.as_bytes().as_ptr()
        }
        None => {
            store(len, 0);
            ptr::null()
        }
    }
}

/// Streams the serialized transaction to `write`. Returns 0 on success.
///
/// # Safety
/// The handle must be live; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Transaction_ToBytes(
    tx: *const btck_Transaction,
    write: btck_WriteBytes,
    userdata: *mut c_void,
    err: *mut *mut btck_Error,
) -> c_int {
    guard(err, to_c_result(false), || {
        let tx = Transaction::borrow(tx)?;
        serialize_to(write, userdata, |sink| tx.write_to(sink))?;
        Ok(to_c_result(true))
    })
}

/// Streams a multi-line description of the transaction to `write`.
///
/// # Safety
/// The handle must be live; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Transaction_ToString(
    tx: *const btck_Transaction,
    write: btck_WriteBytes,
    userdata: *mut c_void,
    err: *mut *mut btck_Error,
) -> c_int {
    guard(err, to_c_result(false), || {
        let tx = Transaction::borrow(tx)?;
        serialize_to(write, userdata, |sink| {
            sink.write_all(tx.to_string().as_bytes())?;
            Ok(())
        })?;
        Ok(to_c_result(true))
    })
}
