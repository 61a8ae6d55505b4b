use std::{fmt, ptr::NonNull};

use btck::ffi::{
    error::btck_Error,
    block::{btck_Block, btck_Block_Release, btck_Block_Retain},
    chain::{btck_Chain, btck_Chain_Release, btck_Chain_Retain},
    script::{btck_ScriptPubkey, btck_ScriptPubkey_Release, btck_ScriptPubkey_Retain},
    transaction::{
        btck_Transaction, btck_TransactionOutput, btck_TransactionOutput_Release,
        btck_TransactionOutput_Retain, btck_Transaction_Release, btck_Transaction_Retain,
    },
};

use crate::{error::check, Error};

pub(crate) mod sealed {
    /// Reference-counting entry points of one C handle type.
    pub trait Capability {
        const NAME: &'static str;

        /// # Safety
        /// `ptr` must be a live handle.
        unsafe fn retain(ptr: *const Self) -> *mut Self;

        /// # Safety
        /// `ptr` must be a live handle; the caller's reference is consumed.
        unsafe fn release(ptr: *const Self);
    }
}

use sealed::Capability;

/// One owned reference to a C handle.
///
/// Dropping releases the reference; cloning retains another one, so clones
/// share the underlying object.
pub struct Owned<T: Capability> {
    ptr: NonNull<T>,
}

// Handles are immutable after construction and their reference counts are
// atomic.
unsafe impl<T: Capability> Send for Owned<T> {}
unsafe impl<T: Capability> Sync for Owned<T> {}

impl<T: Capability> Owned<T> {
    /// Takes ownership of a reference returned by the C API.
    ///
    /// # Safety
    /// `ptr` must be null or a handle whose reference the caller owns.
    pub(crate) unsafe fn from_raw(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Owned { ptr })
    }

    pub(crate) fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }
}

/// Calls a C constructor or accessor and takes ownership of the handle it
/// returns.
pub(crate) fn check_owned<T: Capability>(
    f: impl FnOnce(*mut *mut btck_Error) -> *mut T,
) -> Result<Owned<T>, Error> {
    let ptr = check(f)?;
    owned(ptr)
}

/// Takes ownership of a handle returned by an infallible accessor.
pub(crate) fn owned<T: Capability>(ptr: *mut T) -> Result<Owned<T>, Error> {
    unsafe { Owned::from_raw(ptr) }.ok_or_else(|| Error::null_handle(T::NAME))
}

impl<T: Capability> Clone for Owned<T> {
    fn clone(&self) -> Self {
        unsafe { T::retain(self.as_ptr()) };
        Owned { ptr: self.ptr }
    }
}

impl<T: Capability> Drop for Owned<T> {
    fn drop(&mut self) {
        unsafe { T::release(self.as_ptr()) }
    }
}

impl<T: Capability> fmt::Debug for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:p})", T::NAME, self.ptr)
    }
}

macro_rules! capability {
    ($raw:ty, $name:literal, $retain:path, $release:path) => {
        impl Capability for $raw {
            const NAME: &'static str = $name;

            unsafe fn retain(ptr: *const Self) -> *mut Self {
                $retain(ptr)
            }

            unsafe fn release(ptr: *const Self) {
                $release(ptr)
            }
        }
    };
}

capability!(
    btck_ScriptPubkey,
    "ScriptPubkey",
    btck_ScriptPubkey_Retain,
    btck_ScriptPubkey_Release
);
capability!(
    btck_TransactionOutput,
    "TransactionOutput",
    btck_TransactionOutput_Retain,
    btck_TransactionOutput_Release
);
capability!(
    btck_Transaction,
    "Transaction",
    btck_Transaction_Retain,
    btck_Transaction_Release
);
capability!(btck_Block, "Block", btck_Block_Retain, btck_Block_Release);
capability!(btck_Chain, "Chain", btck_Chain_Retain, btck_Chain_Release);
