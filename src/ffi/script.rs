use std::{
    ffi::{c_int, c_void},
    ptr,
};

use crate::{
    ffi::{
        c_helpers::{bytes, guard, guard_infallible, store, to_c_bool, to_c_result},
        error::btck_Error,
        handle::{export_handle, Handle},
        sink::{btck_WriteBytes, serialize_to},
    },
    ScriptPubkey,
};

pub type btck_ScriptPubkey = ScriptPubkey;

impl Handle for ScriptPubkey {
    const NAME: &'static str = "ScriptPubkey";
}

export_handle!(
    btck_ScriptPubkey,
    btck_ScriptPubkey_Retain,
    btck_ScriptPubkey_Release,
    btck_ScriptPubkey_Copy
);

/// Creates a script from `len` raw bytes. Any byte string is accepted.
///
/// # Safety
/// `raw` must be valid for `len` bytes; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_ScriptPubkey_New(
    raw: *const c_void,
    len: usize,
    err: *mut *mut btck_Error,
) -> *mut btck_ScriptPubkey {
    guard(err, ptr::null_mut(), || {
        let script = ScriptPubkey::new(bytes(raw, len)?)?;
        Ok(ScriptPubkey::new_handle(script))
    })
}

/// Returns 1 if both scripts hold the same bytes.
///
/// # Safety
/// Both handles must be live.
#[no_mangle]
pub unsafe extern "C" fn btck_ScriptPubkey_Equal(
    a: *const btck_ScriptPubkey,
    b: *const btck_ScriptPubkey,
) -> c_int {
    guard_infallible(0, || match (a.as_ref(), b.as_ref()) {
        (Some(a), Some(b)) => to_c_bool(a == b),
        _ => 0,
    })
}

/// The script bytes, valid while the handle is alive.
///
/// # Safety
/// The handle must be live; `len` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_ScriptPubkey_AsBytes(
    script: *const btck_ScriptPubkey,
    len: *mut usize,
) -> *const u8 {
    match script.as_ref() {
        Some(script) => {
            store(len, script.len());
            script.as_bytes().as_ptr()
        }
        None => {
            store(len, 0);
            ptr::null()
        }
    }
}

/// Streams the script bytes to `write`. Returns 0 on success.
///
/// # Safety
/// The handle must be live; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_ScriptPubkey_ToBytes(
    script: *const btck_ScriptPubkey,
    write: btck_WriteBytes,
    userdata: *mut c_void,
    err: *mut *mut btck_Error,
) -> c_int {
    guard(err, to_c_result(false), || {
        let script = ScriptPubkey::borrow(script)?;
        serialize_to(write, userdata, |sink| script.write_to(sink))?;
        Ok(to_c_result(true))
    })
}
