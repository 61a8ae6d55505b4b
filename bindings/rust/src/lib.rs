//! Safe Rust wrappers over the `btck_` C API.
//!
//! Every wrapper owns one reference to a native handle: cloning takes
//! another reference and dropping releases it, so values handed out by an
//! accessor stay valid after their parent is gone. Failures come back as
//! [`Error`], whose [`ErrorKind`] mirrors the native error domain.

use std::{
    ffi::{c_int, c_void},
    panic,
};

use btck::ffi::{btck_Error, success, to_c_result};

mod block;
mod chain;
mod children;
mod error;
mod handle;
mod logging;
mod script;
mod transaction;
mod verify;

pub use block::{Block, BlockHash};
pub use chain::{Chain, ChainType};
pub use children::{ChildIter, Children, Parent};
pub use error::{Error, ErrorKind};
pub use logging::{disable_logging, set_log_callback, set_log_level, LogLevel};
pub use script::ScriptPubkey;
pub use transaction::{Transaction, TransactionOutput};
pub use verify::{
    flags_to_string, parse_flags, verification_error_message, verify, VERIFY_ALL,
    VERIFY_ALL_PRE_TAPROOT, VERIFY_CHECKLOCKTIMEVERIFY, VERIFY_CHECKSEQUENCEVERIFY,
    VERIFY_CLEANSTACK, VERIFY_DERSIG, VERIFY_NONE, VERIFY_NULLDUMMY, VERIFY_P2SH, VERIFY_TAPROOT,
    VERIFY_WITNESS,
};

type WriteBytes = unsafe extern "C" fn(*const c_void, usize, *mut c_void) -> c_int;

/// Collects everything a `btck_*_ToBytes` style function streams out.
pub(crate) fn c_serialize<F>(c_function: F) -> Result<Vec<u8>, Error>
where
    F: FnOnce(WriteBytes, *mut c_void, *mut *mut btck_Error) -> c_int,
{
    let mut buffer = Vec::new();

    unsafe extern "C" fn write_callback(
        data: *const c_void,
        len: usize,
        user_data: *mut c_void,
    ) -> c_int {
        panic::catch_unwind(|| {
            let buffer = &mut *(user_data as *mut Vec<u8>);
            if len > 0 {
                buffer.extend_from_slice(std::slice::from_raw_parts(data as *const u8, len));
            }
            to_c_result(true)
        })
        .unwrap_or_else(|_| to_c_result(false))
    }

    let user_data = &mut buffer as *mut Vec<u8> as *mut c_void;
    let result = error::check(|err| c_function(write_callback, user_data, err))?;
    debug_assert!(success(result));
    Ok(buffer)
}

pub mod prelude {
    pub use crate::{
        Block, BlockHash, Chain, Error, ErrorKind, ScriptPubkey, Transaction, TransactionOutput,
    };
}
