use std::{
    ffi::{c_char, c_int, c_void},
    panic::{self, AssertUnwindSafe},
    ptr,
};

use crate::{
    ffi::error::{raise, btck_Error},
    KernelError,
};

/// Returns true if the C return code indicates success (0).
#[inline]
pub fn success(code: i32) -> bool {
    code == 0
}

/// Converts a Rust bool to C bool representation (1 for true, 0 for false).
#[inline]
pub fn to_c_bool(value: bool) -> c_int {
    if value {
        1
    } else {
        0
    }
}

/// Converts success status to C result code (0 for success, -1 for failure).
#[inline]
pub fn to_c_result(success: bool) -> c_int {
    if success {
        0
    } else {
        -1
    }
}

/// Runs `f` at the C boundary. On failure the error is stored in `err` (if
/// non-null) and `default` is returned. Panics are caught and reported in
/// the `Unknown` domain. `err` is left untouched on success.
pub(crate) fn guard<T, F>(err: *mut *mut btck_Error, default: T, f: F) -> T
where
    F: FnOnce() -> Result<T, KernelError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => value,
        Ok(Err(error)) => {
            unsafe { raise(err, &error) };
            default
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|text| text.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic at the C boundary".to_string());
            log::error!("Caught panic: {}", message);
            unsafe { raise(err, &KernelError::Internal(message)) };
            default
        }
    }
}

/// Like [`guard`] for entry points without an error out-parameter.
pub(crate) fn guard_infallible<T, F>(default: T, f: F) -> T
where
    F: FnOnce() -> T,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or(default)
}

/// Views a caller-provided `(pointer, length)` pair as a byte slice. A null
/// pointer is accepted only with length zero.
///
/// # Safety
/// A non-null `data` must be valid for `len` bytes for the lifetime `'a`.
pub(crate) unsafe fn bytes<'a>(data: *const c_void, len: usize) -> Result<&'a [u8], KernelError> {
    if data.is_null() {
        if len == 0 {
            return Ok(&[]);
        }
        return Err(KernelError::InvalidArgument(format!(
            "null buffer with length {}",
            len
        )));
    }
    Ok(std::slice::from_raw_parts(data as *const u8, len))
}

/// Reads a caller-provided UTF-8 string of `len` bytes.
///
/// # Safety
/// Same as [`bytes`].
pub(crate) unsafe fn to_str<'a>(text: *const c_char, len: usize) -> Result<&'a str, KernelError> {
    let raw = bytes(text as *const c_void, len)?;
    std::str::from_utf8(raw)
        .map_err(|err| KernelError::InvalidArgument(format!("string is not UTF-8: {}", err)))
}

/// Writes `text` into `buf` with `snprintf` semantics: at most `len - 1`
/// bytes are copied, the result is always NUL-terminated when `len > 0`,
/// and the full length of `text` is returned.
///
/// # Safety
/// A non-null `buf` must be valid for `len` bytes.
pub(crate) unsafe fn write_c_string(text: &str, buf: *mut c_char, len: usize) -> c_int {
    if !buf.is_null() && len > 0 {
        let copied = text.len().min(len - 1);
        ptr::copy_nonoverlapping(text.as_ptr(), buf as *mut u8, copied);
        *buf.add(copied) = 0;
    }
    c_int::try_from(text.len()).unwrap_or(c_int::MAX)
}

/// Stores `value` into an optional out-parameter.
///
/// # Safety
/// `out` must be null or valid for writes.
pub(crate) unsafe fn store<T>(out: *mut T, value: T) {
    if !out.is_null() {
        out.write(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::error::{btck_Error_Code, btck_Error_Domain, btck_Error_Free};
    use std::ffi::CStr;

    #[test]
    fn test_guard_leaves_err_untouched_on_success() {
        let mut err: *mut btck_Error = ptr::null_mut();
        let value = guard(&mut err, 0, || Ok(42));
        assert_eq!(value, 42);
        assert!(err.is_null());
    }

    #[test]
    fn test_guard_reports_failure_and_panics() {
        let mut err: *mut btck_Error = ptr::null_mut();
        let value = guard(&mut err, -1, || Err(KernelError::OutOfBounds { index: 4, len: 2 }));
        assert_eq!(value, -1);
        unsafe {
            assert_eq!(btck_Error_Code(err), 1);
            btck_Error_Free(err);
        }

        let mut err: *mut btck_Error = ptr::null_mut();
        let value: i32 = guard(&mut err, 7, || panic!("boom"));
        assert_eq!(value, 7);
        unsafe {
            assert_eq!(CStr::from_ptr(btck_Error_Domain(err)).to_str().unwrap(), "Unknown");
            btck_Error_Free(err);
        }

        // Without an out-parameter the failure is only signalled by the default.
        assert!(guard(ptr::null_mut(), ptr::null::<u8>(), || Err(KernelError::SerializationFailed)).is_null());
    }

    #[test]
    fn test_bytes_null_handling() {
        unsafe {
            assert!(bytes(ptr::null(), 0).unwrap().is_empty());
            assert!(bytes(ptr::null(), 3).is_err());
            let data = [1u8, 2, 3];
            assert_eq!(bytes(data.as_ptr() as *const c_void, 2).unwrap(), &[1, 2]);
        }
    }

    #[test]
    fn test_write_c_string_truncates() {
        let mut buf = [0x7f as c_char; 5];
        unsafe {
            assert_eq!(write_c_string("DERSIG", buf.as_mut_ptr(), buf.len()), 6);
            assert_eq!(CStr::from_ptr(buf.as_ptr()).to_str().unwrap(), "DERS");
            assert_eq!(write_c_string("ALL", ptr::null_mut(), 0), 3);
            assert_eq!(write_c_string("ALL", buf.as_mut_ptr(), buf.len()), 3);
            assert_eq!(CStr::from_ptr(buf.as_ptr()).to_str().unwrap(), "ALL");
        }
    }

    #[test]
    fn test_c_conversions() {
        assert_eq!(to_c_bool(true), 1);
        assert_eq!(to_c_result(false), -1);
        assert!(success(0));
        assert!(!success(1));
    }
}
