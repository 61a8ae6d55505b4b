use std::ffi::{c_char, CStr};

use btck::ffi::{
    transaction::btck_TransactionOutput,
    verify::{
        btck_VerificationError_Message, btck_VerificationFlags_FromString,
        btck_VerificationFlags_ToString, btck_Verify,
    },
};

use crate::{error::check, Error, ScriptPubkey, Transaction, TransactionOutput};

pub use btck::{
    VERIFY_ALL, VERIFY_ALL_PRE_TAPROOT, VERIFY_CHECKLOCKTIMEVERIFY, VERIFY_CHECKSEQUENCEVERIFY,
    VERIFY_CLEANSTACK, VERIFY_DERSIG, VERIFY_NONE, VERIFY_NULLDUMMY, VERIFY_P2SH, VERIFY_TAPROOT,
    VERIFY_WITNESS,
};

/// Verifies input `input_index` of `tx_to` against `script_pubkey`.
///
/// Returns `Ok(false)` when the script does not validate, and an error in
/// the `VerificationError` domain when the arguments break the contract.
pub fn verify(
    script_pubkey: &ScriptPubkey,
    amount: i64,
    tx_to: &Transaction,
    spent_outputs: &[TransactionOutput],
    input_index: u32,
    flags: u32,
) -> Result<bool, Error> {
    let handles: Vec<*const btck_TransactionOutput> = spent_outputs
        .iter()
        .map(|output| output.inner.as_ptr())
        .collect();
    let valid = check(|err| unsafe {
        btck_Verify(
            script_pubkey.inner.as_ptr(),
            amount,
            tx_to.inner.as_ptr(),
            handles.as_ptr(),
            handles.len(),
            input_index,
            flags,
            err,
        )
    })?;
    Ok(valid == 1)
}

/// Renders a flag set, or `None` if it has unknown bits.
pub fn flags_to_string(flags: u32) -> Option<String> {
    let needed = unsafe { btck_VerificationFlags_ToString(flags, std::ptr::null_mut(), 0) };
    let needed = usize::try_from(needed).ok()?;
    let mut buf = vec![0 as c_char; needed + 1];
    unsafe { btck_VerificationFlags_ToString(flags, buf.as_mut_ptr(), buf.len()) };
    let text = unsafe { CStr::from_ptr(buf.as_ptr()) };
    Some(text.to_string_lossy().into_owned())
}

pub fn parse_flags(text: &str) -> Result<u32, Error> {
    let mut flags = 0;
    check(|err| unsafe {
        btck_VerificationFlags_FromString(
            text.as_ptr() as *const c_char,
            text.len(),
            &mut flags,
            err,
        )
    })?;
    Ok(flags)
}

/// The message of a verification error code.
pub fn verification_error_message(code: i32) -> String {
    let text = unsafe { CStr::from_ptr(btck_VerificationError_Message(code)) };
    text.to_string_lossy().into_owned()
}
