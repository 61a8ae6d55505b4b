use std::{
    ffi::{c_char, CStr},
    fmt, ptr,
};

use btck::ffi::error::{
    btck_Error, btck_Error_Code, btck_Error_Domain, btck_Error_Free, btck_Error_Message,
};

/// The error domains reported by the C API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Memory,
    Parse,
    Index,
    Verification,
    Value,
    Lookup,
    Io,
    Unknown,
}

impl ErrorKind {
    fn from_domain(domain: &str) -> ErrorKind {
        match domain {
            btck::domain::MEMORY => ErrorKind::Memory,
            btck::domain::PARSE => ErrorKind::Parse,
            btck::domain::INDEX => ErrorKind::Index,
            btck::domain::VERIFICATION => ErrorKind::Verification,
            btck::domain::VALUE => ErrorKind::Value,
            btck::domain::LOOKUP => ErrorKind::Lookup,
            btck::domain::IO => ErrorKind::Io,
            _ => ErrorKind::Unknown,
        }
    }
}

/// A failure reported through the C error channel, copied out of the
/// native error object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    domain: String,
    code: i32,
    message: String,
}

impl Error {
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::from_domain(&self.domain)
    }

    pub(crate) fn new(domain: &str, code: i32, message: impl Into<String>) -> Error {
        Error {
            domain: domain.to_string(),
            code,
            message: message.into(),
        }
    }

    pub(crate) fn null_handle(name: &str) -> Error {
        Error::new(
            btck::domain::UNKNOWN,
            -1,
            format!("{} handle is null", name),
        )
    }

    /// Copies and frees a native error.
    ///
    /// # Safety
    /// `err` must be a live error (or the out-of-memory sentinel) that is
    /// not used afterwards.
    unsafe fn take(err: *mut btck_Error) -> Error {
        let error = Error {
            domain: text(btck_Error_Domain(err)),
            code: btck_Error_Code(err),
            message: text(btck_Error_Message(err)),
        };
        btck_Error_Free(err);
        log::debug!("C call failed: {}", error);
        error
    }
}

unsafe fn text(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.domain, self.code, self.message)
    }
}

impl std::error::Error for Error {}

/// Calls a fallible C function with a fresh error slot. The native error,
/// if one was raised, is always freed.
pub(crate) fn check<T>(f: impl FnOnce(*mut *mut btck_Error) -> T) -> Result<T, Error> {
    let mut err: *mut btck_Error = ptr::null_mut();
    let value = f(&mut err);
    if err.is_null() {
        Ok(value)
    } else {
        Err(unsafe { Error::take(err) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btck::ffi::error::btck_Error_New;

    #[test]
    fn test_check_copies_and_frees() {
        let result: Result<(), Error> = check(|err| unsafe {
            *err = btck_Error_New(c"LookupError".as_ptr(), 1, c"missing".as_ptr());
        });
        let error = result.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Lookup);
        assert_eq!(error.code(), 1);
        assert_eq!(error.to_string(), "[LookupError:1] missing");
    }

    #[test]
    fn test_unknown_domain() {
        let error = check(|err| unsafe {
            *err = btck_Error_New(c"Custom".as_ptr(), 9, ptr::null());
        })
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unknown);
        assert_eq!(error.domain(), "Custom");
        assert_eq!(error.message(), "");
    }
}
