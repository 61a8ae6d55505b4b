//! Reference-counted opaque handles.
//!
//! Every handle given to C is the data pointer of an [`Arc`]. Retaining a
//! handle bumps the strong count and returns the same pointer; releasing
//! it drops one count. The object is destroyed with its last reference,
//! so children handed out by an accessor stay valid after the parent is
//! released.

use std::sync::Arc;

use crate::KernelError;

/// Types exported to C as opaque handles.
pub trait Handle: Send + Sync + Sized + 'static {
    /// Type name used in diagnostics.
    const NAME: &'static str;

    /// Hands one reference to the caller.
    fn into_handle(shared: Arc<Self>) -> *mut Self {
        Arc::into_raw(shared) as *mut Self
    }

    /// Wraps a freshly constructed value in a handle with one reference.
    fn new_handle(value: Self) -> *mut Self {
        Self::into_handle(Arc::new(value))
    }

    /// Borrows the object behind `handle`.
    ///
    /// # Safety
    /// `handle` must be null or a live handle of this type. The borrow must
    /// not outlive the caller's reference.
    unsafe fn borrow<'a>(handle: *const Self) -> Result<&'a Self, KernelError> {
        handle
            .as_ref()
            .ok_or_else(|| KernelError::InvalidArgument(format!("null {} handle", Self::NAME)))
    }

    /// Takes out an additional shared reference to the object behind
    /// `handle`, leaving the caller's reference untouched.
    ///
    /// # Safety
    /// Same as [`Handle::borrow`].
    unsafe fn shared(handle: *const Self) -> Result<Arc<Self>, KernelError> {
        Self::borrow(handle)?;
        Arc::increment_strong_count(handle);
        Ok(Arc::from_raw(handle))
    }

    /// # Safety
    /// `handle` must be null or a live handle of this type.
    unsafe fn retain(handle: *const Self) -> *mut Self {
        if !handle.is_null() {
            Arc::increment_strong_count(handle);
        }
        handle as *mut Self
    }

    /// # Safety
    /// `handle` must be null or a live handle of this type. The caller's
    /// reference is consumed.
    unsafe fn release(handle: *const Self) {
        if handle.is_null() {
            return;
        }
        log::trace!("Releasing {} handle {:p}", Self::NAME, handle);
        Arc::decrement_strong_count(handle);
    }

    /// Creates an independent object with equal contents.
    ///
    /// # Safety
    /// Same as [`Handle::borrow`].
    unsafe fn copy(handle: *const Self) -> Result<*mut Self, KernelError>
    where
        Self: Clone,
    {
        Ok(Self::new_handle(Self::borrow(handle)?.clone()))
    }
}

/// Exports `_Retain` and `_Release` for a handle type, and `_Copy` when
/// a copy symbol is named.
macro_rules! export_handle {
    ($ty:ty, $retain:ident, $release:ident) => {
        /// Adds a reference and returns the same handle.
        ///
        /// # Safety
        /// The handle must be null or live.
        #[no_mangle]
        pub unsafe extern "C" fn $retain(handle: *const $ty) -> *mut $ty {
            <$ty as $crate::ffi::handle::Handle>::retain(handle)
        }

        /// Drops a reference. The object is destroyed with its last one.
        ///
        /// # Safety
        /// The handle must be null or live, and is not usable afterwards.
        #[no_mangle]
        pub unsafe extern "C" fn $release(handle: *const $ty) {
            <$ty as $crate::ffi::handle::Handle>::release(handle)
        }
    };
    ($ty:ty, $retain:ident, $release:ident, $copy:ident) => {
        $crate::ffi::handle::export_handle!($ty, $retain, $release);

        /// Creates a new object with its own reference count. Immutable
        /// children are shared with the source.
        ///
        /// # Safety
        /// The handle must be live; `err` must be null or writable.
        #[no_mangle]
        pub unsafe extern "C" fn $copy(
            handle: *const $ty,
            err: *mut *mut $crate::ffi::error::btck_Error,
        ) -> *mut $ty {
            $crate::ffi::c_helpers::guard(err, std::ptr::null_mut(), || {
                <$ty as $crate::ffi::handle::Handle>::copy(handle)
            })
        }
    };
}

pub(crate) use export_handle;
