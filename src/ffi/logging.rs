use std::ffi::{c_char, c_int, c_void};

use crate::{
    ffi::{
        c_helpers::{guard, to_c_result},
        constants::btck_LogLevel,
        error::btck_Error,
    },
    logging::{disable_logging, set_log_level, set_logger, Log, LogLevel},
    KernelError,
};

/// Receives one formatted log line of `len` bytes.
pub type btck_LogCallback =
    Option<unsafe extern "C" fn(user_data: *mut c_void, message: *const c_char, len: usize)>;

/// Releases the `user_data` given to [`btck_Logging_SetCallback`].
pub type btck_DestroyCallback = Option<unsafe extern "C" fn(user_data: *mut c_void)>;

struct CLog {
    callback: unsafe extern "C" fn(*mut c_void, *const c_char, usize),
    user_data: *mut c_void,
    destroy: btck_DestroyCallback,
}

// The caller guarantees the callback and user data may be used from any
// thread.
unsafe impl Send for CLog {}
unsafe impl Sync for CLog {}

impl Log for CLog {
    fn log(&self, message: &str) {
        unsafe {
            (self.callback)(
                self.user_data,
                message.as_ptr() as *const c_char,
                message.len(),
            )
        }
    }
}

impl Drop for CLog {
    fn drop(&mut self) {
        if let Some(destroy) = self.destroy {
            unsafe { destroy(self.user_data) }
        }
    }
}

/// Routes library log lines at `level` or above to `callback`, replacing
/// any earlier callback. `user_data_destroy`, if given, is called with
/// `user_data` once the callback is replaced or logging is disabled, or
/// before returning if the call fails. Returns 0 on success.
///
/// # Safety
/// `callback` must be callable from any thread for as long as it is
/// installed; `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Logging_SetCallback(
    callback: btck_LogCallback,
    user_data: *mut c_void,
    user_data_destroy: btck_DestroyCallback,
    level: btck_LogLevel,
    err: *mut *mut btck_Error,
) -> c_int {
    guard(err, to_c_result(false), || {
        let Some(callback) = callback else {
            if let Some(destroy) = user_data_destroy {
                destroy(user_data);
            }
            return Err(KernelError::InvalidArgument(
                "null log callback".to_string(),
            ));
        };
        // Dropping `log` on an early return releases `user_data`.
        let log = CLog {
            callback,
            user_data,
            destroy: user_data_destroy,
        };
        set_logger(log, LogLevel::try_from(level)?)?;
        Ok(to_c_result(true))
    })
}

/// Changes the minimum level of forwarded log lines. Returns 0 on success.
///
/// # Safety
/// `err` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn btck_Logging_SetLevel(
    level: btck_LogLevel,
    err: *mut *mut btck_Error,
) -> c_int {
    guard(err, to_c_result(false), || {
        set_log_level(LogLevel::try_from(level)?)?;
        Ok(to_c_result(true))
    })
}

/// Stops forwarding log lines and releases the installed callback.
#[no_mangle]
pub extern "C" fn btck_Logging_Disable() {
    disable_logging();
}
