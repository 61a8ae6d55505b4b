//! The C error channel.
//!
//! Failures are reported through a heap-allocated `btck_Error` written to
//! the caller's `btck_Error**` out-parameter. Nothing is allocated on
//! success. If the error itself cannot be allocated, the static
//! out-of-memory sentinel is handed out instead; freeing it is a no-op.

use std::{
    alloc::{alloc, dealloc, Layout},
    ffi::{c_char, c_int, CStr, CString},
    ptr,
};

use crate::{domain, KernelError};

enum Text {
    Static(&'static CStr),
    Owned(CString),
}

impl Text {
    fn as_ptr(&self) -> *const c_char {
        match self {
            Text::Static(text) => text.as_ptr(),
            Text::Owned(text) => text.as_ptr(),
        }
    }
}

/// One failure occurrence: a domain tag, a code within the domain and a
/// human-readable message.
pub struct btck_Error {
    code: c_int,
    domain: Option<Text>,
    message: Option<Text>,
}

static OUT_OF_MEMORY: btck_Error = btck_Error {
    code: -1,
    domain: Some(Text::Static(c"Memory")),
    message: Some(Text::Static(c"Out of memory")),
};

pub(crate) fn out_of_memory() -> *mut btck_Error {
    &OUT_OF_MEMORY as *const btck_Error as *mut btck_Error
}

fn is_sentinel(error: *const btck_Error) -> bool {
    ptr::eq(error, &OUT_OF_MEMORY)
}

/// Copies `bytes` into a `CString` without aborting on allocation failure.
/// Interior NUL bytes are dropped.
fn try_cstring(bytes: &[u8]) -> Option<CString> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(bytes.len() + 1).ok()?;
    buffer.extend(bytes.iter().copied().filter(|byte| *byte != 0));
    CString::new(buffer).ok()
}

fn static_domain(name: &str) -> Option<&'static CStr> {
    match name {
        domain::MEMORY => Some(c"Memory"),
        domain::PARSE => Some(c"ParseError"),
        domain::INDEX => Some(c"IndexError"),
        domain::VERIFICATION => Some(c"VerificationError"),
        domain::VALUE => Some(c"ValueError"),
        domain::LOOKUP => Some(c"LookupError"),
        domain::IO => Some(c"IoError"),
        domain::UNKNOWN => Some(c"Unknown"),
        _ => None,
    }
}

fn allocate(error: btck_Error) -> *mut btck_Error {
    let layout = Layout::new::<btck_Error>();
    let raw = unsafe { alloc(layout) } as *mut btck_Error;
    if raw.is_null() {
        return out_of_memory();
    }
    unsafe { raw.write(error) };
    raw
}

/// Creates an error object. Never fails: on allocation failure the
/// out-of-memory sentinel is returned.
pub(crate) fn new_error(domain: Option<&[u8]>, code: c_int, message: Option<&[u8]>) -> *mut btck_Error {
    let domain = match domain {
        None => None,
        Some(bytes) => match std::str::from_utf8(bytes).ok().and_then(static_domain) {
            Some(text) => Some(Text::Static(text)),
            None => match try_cstring(bytes) {
                Some(text) => Some(Text::Owned(text)),
                None => return out_of_memory(),
            },
        },
    };
    let message = match message {
        None => None,
        Some(bytes) => match try_cstring(bytes) {
            Some(text) => Some(Text::Owned(text)),
            None => return out_of_memory(),
        },
    };
    allocate(btck_Error {
        code,
        domain,
        message,
    })
}

pub(crate) fn from_kernel_error(error: &KernelError) -> *mut btck_Error {
    if let KernelError::OutOfMemory = error {
        return out_of_memory();
    }
    new_error(
        Some(error.domain().as_bytes()),
        error.code(),
        Some(error.to_string().as_bytes()),
    )
}

/// Stores `error` in `err` if the caller asked for error details.
///
/// # Safety
/// `err` must be null or valid for writes.
pub(crate) unsafe fn raise(err: *mut *mut btck_Error, error: &KernelError) {
    log::debug!("Reporting {} error {}: {}", error.domain(), error.code(), error);
    if !err.is_null() {
        *err = from_kernel_error(error);
    }
}

/// Creates an error object with copies of `domain` and `message`, either of
/// which may be null.
///
/// # Safety
/// `domain` and `message` must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn btck_Error_New(
    domain: *const c_char,
    code: c_int,
    message: *const c_char,
) -> *mut btck_Error {
    let domain = (!domain.is_null()).then(|| CStr::from_ptr(domain).to_bytes());
    let message = (!message.is_null()).then(|| CStr::from_ptr(message).to_bytes());
    new_error(domain, code, message)
}

/// Frees an error. Null and the out-of-memory sentinel are ignored, so
/// freeing either any number of times is safe.
///
/// # Safety
/// `error` must be null, the sentinel, or an error not yet freed.
#[no_mangle]
pub unsafe extern "C" fn btck_Error_Free(error: *mut btck_Error) {
    if error.is_null() || is_sentinel(error) {
        return;
    }
    ptr::drop_in_place(error);
    dealloc(error as *mut u8, Layout::new::<btck_Error>());
}

/// # Safety
/// `error` must be a live error.
#[no_mangle]
pub unsafe extern "C" fn btck_Error_Code(error: *const btck_Error) -> c_int {
    match error.as_ref() {
        Some(error) => error.code,
        None => 0,
    }
}

/// The domain tag, valid until the error is freed. May be null.
///
/// # Safety
/// `error` must be a live error.
#[no_mangle]
pub unsafe extern "C" fn btck_Error_Domain(error: *const btck_Error) -> *const c_char {
    error
        .as_ref()
        .and_then(|error| error.domain.as_ref())
        .map_or(ptr::null(), Text::as_ptr)
}

/// The message, valid until the error is freed. May be null.
///
/// # Safety
/// `error` must be a live error.
#[no_mangle]
pub unsafe extern "C" fn btck_Error_Message(error: *const btck_Error) -> *const c_char {
    error
        .as_ref()
        .and_then(|error| error.message.as_ref())
        .map_or(ptr::null(), Text::as_ptr)
}
