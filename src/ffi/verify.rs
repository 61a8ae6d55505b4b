use std::ffi::{c_char, c_int, c_uint};

use crate::{
    core::verify::{flags_to_string, parse_flags, verify},
    ffi::{
        c_helpers::{guard, store, to_c_bool, to_c_result, to_str, write_c_string},
        constants::{btck_VerificationError, btck_VerificationFlags},
        error::btck_Error,
        handle::Handle,
        script::btck_ScriptPubkey,
        transaction::{btck_Transaction, btck_TransactionOutput},
    },
    KernelError, ScriptPubkey, Transaction, TransactionOutput, VerificationError,
};

/// Verifies input `input_index` of `tx_to` against `script_pubkey`.
///
/// Returns 1 if the script validates and 0 otherwise. Contract violations
/// are reported as `VerificationError`s through `err`; a script that simply
/// fails to validate leaves `err` untouched.
///
/// # Safety
/// All handles must be live. `spent_outputs` must point to
/// `spent_outputs_len` live output handles, or be null with length 0.
#[no_mangle]
pub unsafe extern "C" fn btck_Verify(
    script_pubkey: *const btck_ScriptPubkey,
    amount: i64,
    tx_to: *const btck_Transaction,
    spent_outputs: *const *const btck_TransactionOutput,
    spent_outputs_len: usize,
    input_index: c_uint,
    flags: btck_VerificationFlags,
    err: *mut *mut btck_Error,
) -> c_int {
    guard(err, 0, || {
        let script_pubkey = ScriptPubkey::borrow(script_pubkey)?;
        let tx_to = Transaction::borrow(tx_to)?;
        let handles: &[*const TransactionOutput] = if spent_outputs.is_null() {
            if spent_outputs_len != 0 {
                return Err(KernelError::InvalidArgument(format!(
                    "null spent outputs with length {}",
                    spent_outputs_len
                )));
            }
            &[]
        } else {
            std::slice::from_raw_parts(spent_outputs, spent_outputs_len)
        };
        let outputs = handles
            .iter()
            .map(|handle| TransactionOutput::borrow(*handle))
            .collect::<Result<Vec<&TransactionOutput>, KernelError>>()?;
        let valid = verify(script_pubkey, amount, tx_to, &outputs, input_index, flags)?;
        Ok(to_c_bool(valid))
    })
}

/// Renders `flags` into `buf` with `snprintf` semantics. Returns the full
/// length of the rendering, or -1 if `flags` contains unknown bits.
///
/// # Safety
/// `buf` must be null or valid for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn btck_VerificationFlags_ToString(
    flags: btck_VerificationFlags,
    buf: *mut c_char,
    len: usize,
) -> c_int {
    match flags_to_string(flags) {
        Ok(text) => write_c_string(&text, buf, len),
        Err(_) => -1,
    }
}

/// Parses a rendering produced by [`btck_VerificationFlags_ToString`].
/// Returns 0 on success.
///
/// # Safety
/// `text` must be valid for `len` bytes; `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn btck_VerificationFlags_FromString(
    text: *const c_char,
    len: usize,
    out: *mut btck_VerificationFlags,
    err: *mut *mut btck_Error,
) -> c_int {
    guard(err, to_c_result(false), || {
        store(out, parse_flags(to_str(text, len)?)?);
        Ok(to_c_result(true))
    })
}

/// The static message for a verification error code.
#[no_mangle]
pub extern "C" fn btck_VerificationError_Message(code: btck_VerificationError) -> *const c_char {
    match VerificationError::try_from(code) {
        Ok(error) => error.c_message().as_ptr(),
        Err(_) => c"(unrecognized error)".as_ptr(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use crate::core::test_utils::spend_tx;
    use crate::ffi::{
        constants::{
            BTCK_VERIFICATION_FLAGS_ALL, BTCK_VERIFICATION_FLAGS_CLEANSTACK,
            BTCK_VERIFICATION_FLAGS_NONE, BTCK_VERIFICATION_FLAGS_P2SH,
            BTCK_VERIFICATION_FLAGS_WITNESS,
        },
        error::{btck_Error_Code, btck_Error_Domain, btck_Error_Free},
        script::{btck_ScriptPubkey_New, btck_ScriptPubkey_Release},
        transaction::{
            btck_TransactionOutput_New, btck_TransactionOutput_Release, btck_Transaction_New,
            btck_Transaction_Release,
        },
    };
    use bitcoin::consensus::serialize;
    use std::{ffi::c_void, ptr};

    struct Fixture {
        script: *mut btck_ScriptPubkey,
        tx: *mut btck_Transaction,
        outputs: Vec<*mut btck_TransactionOutput>,
    }

    impl Fixture {
        fn new(spent: usize) -> Fixture {
            let raw = serialize(&spend_tx(2, &[(10, &[0x51][..])]));
            unsafe {
                let script = btck_ScriptPubkey_New([0x51u8].as_ptr() as *const c_void, 1, ptr::null_mut());
                let tx = btck_Transaction_New(raw.as_ptr() as *const c_void, raw.len(), ptr::null_mut());
                let outputs = (0..spent)
                    .map(|_| btck_TransactionOutput_New(script, 10, ptr::null_mut()))
                    .collect();
                Fixture { script, tx, outputs }
            }
        }

        fn verify(&self, input_index: c_uint, flags: c_uint) -> (c_int, Option<(String, c_int)>) {
            let mut err: *mut btck_Error = ptr::null_mut();
            let handles: Vec<*const btck_TransactionOutput> =
                self.outputs.iter().map(|output| *output as *const _).collect();
            unsafe {
                let rc = btck_Verify(
                    self.script,
                    10,
                    self.tx,
                    handles.as_ptr(),
                    handles.len(),
                    input_index,
                    flags,
                    &mut err,
                );
                if err.is_null() {
                    return (rc, None);
                }
                let domain = CStr::from_ptr(btck_Error_Domain(err)).to_string_lossy().into_owned();
                let code = btck_Error_Code(err);
                btck_Error_Free(err);
                (rc, Some((domain, code)))
            }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            unsafe {
                for output in &self.outputs {
                    btck_TransactionOutput_Release(*output);
                }
                btck_Transaction_Release(self.tx);
                btck_ScriptPubkey_Release(self.script);
            }
        }
    }

    fn violation(code: c_int) -> Option<(String, c_int)> {
        Some(("VerificationError".to_string(), code))
    }

    #[test]
    fn test_contract_violations() {
        let fixture = Fixture::new(0);
        assert_eq!(fixture.verify(0, 1 << 30), (0, violation(1)));
        assert_eq!(fixture.verify(0, BTCK_VERIFICATION_FLAGS_WITNESS), (0, violation(2)));
        assert_eq!(fixture.verify(0, BTCK_VERIFICATION_FLAGS_CLEANSTACK), (0, violation(2)));
        assert_eq!(fixture.verify(0, BTCK_VERIFICATION_FLAGS_ALL), (0, violation(3)));
        assert_eq!(fixture.verify(2, BTCK_VERIFICATION_FLAGS_NONE), (0, violation(0)));

        let fixture = Fixture::new(1);
        assert_eq!(fixture.verify(0, BTCK_VERIFICATION_FLAGS_P2SH), (0, violation(4)));
    }

    #[cfg(feature = "bitcoinconsensus")]
    #[test]
    fn test_script_result_without_error() {
        // OP_TRUE with no script_sig validates.
        let fixture = Fixture::new(2);
        assert_eq!(fixture.verify(1, BTCK_VERIFICATION_FLAGS_P2SH), (1, None));
    }

    #[test]
    fn test_flags_to_string() {
        let mut buf = [0 as c_char; 64];
        unsafe {
            let n = btck_VerificationFlags_ToString(
                BTCK_VERIFICATION_FLAGS_P2SH | BTCK_VERIFICATION_FLAGS_WITNESS,
                buf.as_mut_ptr(),
                buf.len(),
            );
            assert_eq!(n, 14);
            assert_eq!(CStr::from_ptr(buf.as_ptr()).to_str().unwrap(), "P2SH | WITNESS");
            assert_eq!(
                btck_VerificationFlags_ToString(BTCK_VERIFICATION_FLAGS_ALL, ptr::null_mut(), 0),
                3
            );
            assert_eq!(
                btck_VerificationFlags_ToString(1 << 30, buf.as_mut_ptr(), buf.len()),
                -1
            );
        }
    }

    #[test]
    fn test_flags_from_string() {
        let text = "WITNESS | P2SH";
        let mut flags = 0;
        unsafe {
            let rc = btck_VerificationFlags_FromString(
                text.as_ptr() as *const c_char,
                text.len(),
                &mut flags,
                ptr::null_mut(),
            );
            assert_eq!(rc, 0);
            assert_eq!(flags, BTCK_VERIFICATION_FLAGS_P2SH | BTCK_VERIFICATION_FLAGS_WITNESS);

            let mut err: *mut btck_Error = ptr::null_mut();
            let text = "P2SH | BOGUS";
            let rc = btck_VerificationFlags_FromString(
                text.as_ptr() as *const c_char,
                text.len(),
                &mut flags,
                &mut err,
            );
            assert_ne!(rc, 0);
            assert_eq!(btck_Error_Code(err), 3);
            btck_Error_Free(err);
        }
    }

    #[test]
    fn test_error_messages() {
        for code in 0..5 {
            let expected = VerificationError::try_from(code).unwrap().message();
            let text = unsafe { CStr::from_ptr(btck_VerificationError_Message(code)) };
            assert_eq!(text.to_str().unwrap(), expected);
        }
        let text = unsafe { CStr::from_ptr(btck_VerificationError_Message(99)) };
        assert_eq!(text.to_str().unwrap(), "(unrecognized error)");
    }
}
