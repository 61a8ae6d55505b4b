use std::ffi::c_void;

use btck::ffi::script::{
    btck_ScriptPubkey, btck_ScriptPubkey_AsBytes, btck_ScriptPubkey_Copy,
    btck_ScriptPubkey_Equal, btck_ScriptPubkey_New, btck_ScriptPubkey_ToBytes,
};

use crate::{
    c_serialize,
    handle::{check_owned, Owned},
    Error,
};

/// A script public key.
#[derive(Debug, Clone)]
pub struct ScriptPubkey {
    pub(crate) inner: Owned<btck_ScriptPubkey>,
}

impl ScriptPubkey {
    pub fn new(raw: &[u8]) -> Result<Self, Error> {
        let inner = check_owned(|err| unsafe {
            btck_ScriptPubkey_New(raw.as_ptr() as *const c_void, raw.len(), err)
        })?;
        Ok(ScriptPubkey { inner })
    }

    /// Creates an independent copy instead of another reference.
    pub fn deep_copy(&self) -> Result<Self, Error> {
        let inner = check_owned(|err| unsafe { btck_ScriptPubkey_Copy(self.inner.as_ptr(), err) })?;
        Ok(ScriptPubkey { inner })
    }

    /// The script bytes, borrowed from the native object.
    pub fn as_bytes(&self) -> &[u8] {
        let mut len = 0;
        let data = unsafe { btck_ScriptPubkey_AsBytes(self.inner.as_ptr(), &mut len) };
        if data.is_null() || len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(data, len) }
    }

    /// Serializes through the streaming interface.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        c_serialize(|write, userdata, err| unsafe {
            btck_ScriptPubkey_ToBytes(self.inner.as_ptr(), Some(write), userdata, err)
        })
    }
}

impl PartialEq for ScriptPubkey {
    fn eq(&self, other: &Self) -> bool {
        unsafe { btck_ScriptPubkey_Equal(self.inner.as_ptr(), other.inner.as_ptr()) == 1 }
    }
}

impl Eq for ScriptPubkey {}

impl TryFrom<&[u8]> for ScriptPubkey {
    type Error = Error;

    fn try_from(raw: &[u8]) -> Result<Self, Self::Error> {
        ScriptPubkey::new(raw)
    }
}
