use std::ffi::{c_char, c_void};

use btck::ffi::logging::{btck_Logging_Disable, btck_Logging_SetCallback, btck_Logging_SetLevel};

use crate::{error::check, Error};

pub use btck::LogLevel;

type Callback = Box<dyn Fn(&str) + Send + Sync>;

unsafe extern "C" fn forward(user_data: *mut c_void, message: *const c_char, len: usize) {
    let callback = &*(user_data as *const Callback);
    let bytes = std::slice::from_raw_parts(message as *const u8, len);
    let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        callback(&String::from_utf8_lossy(bytes))
    }));
}

unsafe extern "C" fn destroy(user_data: *mut c_void) {
    drop(Box::from_raw(user_data as *mut Callback));
}

/// Sends the library's log lines at `level` or above to `callback`.
pub fn set_log_callback<F>(callback: F, level: LogLevel) -> Result<(), Error>
where
    F: Fn(&str) + Send + Sync + 'static,
{
    let boxed: Box<Callback> = Box::new(Box::new(callback));
    let user_data = Box::into_raw(boxed) as *mut c_void;
    // On failure the library calls `destroy` itself.
    check(|err| unsafe {
        btck_Logging_SetCallback(Some(forward), user_data, Some(destroy), level.into(), err)
    })
    .map(|_| ())
}

pub fn set_log_level(level: LogLevel) -> Result<(), Error> {
    check(|err| unsafe { btck_Logging_SetLevel(level.into(), err) }).map(|_| ())
}

pub fn disable_logging() {
    btck_Logging_Disable();
}
