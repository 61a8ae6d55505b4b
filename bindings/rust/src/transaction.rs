use std::{ffi::c_void, fmt};

use btck::ffi::transaction::{
    btck_Transaction, btck_TransactionOutput, btck_TransactionOutput_Copy,
    btck_TransactionOutput_Equal, btck_TransactionOutput_GetAmount,
    btck_TransactionOutput_GetScriptPubkey, btck_TransactionOutput_New, btck_Transaction_At,
    btck_Transaction_AsBytes, btck_Transaction_Copy, btck_Transaction_CountInputs,
    btck_Transaction_CountOutputs, btck_Transaction_GetSize, btck_Transaction_GetTxid,
    btck_Transaction_New, btck_Transaction_ToBytes, btck_Transaction_ToString,
};

use crate::{
    c_serialize,
    children::{Children, Parent},
    handle::{check_owned, owned, Owned},
    Error, ScriptPubkey,
};

/// A transaction output: an amount and the script locking it.
#[derive(Debug, Clone)]
pub struct TransactionOutput {
    pub(crate) inner: Owned<btck_TransactionOutput>,
}

impl TransactionOutput {
    pub fn new(script_pubkey: &ScriptPubkey, amount: i64) -> Result<Self, Error> {
        let inner = check_owned(|err| unsafe {
            btck_TransactionOutput_New(script_pubkey.inner.as_ptr(), amount, err)
        })?;
        Ok(TransactionOutput { inner })
    }

    pub fn amount(&self) -> i64 {
        unsafe { btck_TransactionOutput_GetAmount(self.inner.as_ptr()) }
    }

    /// The script of this output, sharing the native object.
    pub fn script_pubkey(&self) -> Result<ScriptPubkey, Error> {
        let inner = owned(unsafe { btck_TransactionOutput_GetScriptPubkey(self.inner.as_ptr()) })?;
        Ok(ScriptPubkey { inner })
    }

    pub fn deep_copy(&self) -> Result<Self, Error> {
        let inner =
            check_owned(|err| unsafe { btck_TransactionOutput_Copy(self.inner.as_ptr(), err) })?;
        Ok(TransactionOutput { inner })
    }
}

impl PartialEq for TransactionOutput {
    fn eq(&self, other: &Self) -> bool {
        unsafe { btck_TransactionOutput_Equal(self.inner.as_ptr(), other.inner.as_ptr()) == 1 }
    }
}

impl Eq for TransactionOutput {}

/// A parsed transaction.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub(crate) inner: Owned<btck_Transaction>,
}

impl Transaction {
    pub fn new(raw: &[u8]) -> Result<Self, Error> {
        let inner = check_owned(|err| unsafe {
            btck_Transaction_New(raw.as_ptr() as *const c_void, raw.len(), err)
        })?;
        Ok(Transaction { inner })
    }

    pub fn deep_copy(&self) -> Result<Self, Error> {
        let inner = check_owned(|err| unsafe { btck_Transaction_Copy(self.inner.as_ptr(), err) })?;
        Ok(Transaction { inner })
    }

    pub fn input_count(&self) -> usize {
        unsafe { btck_Transaction_CountInputs(self.inner.as_ptr()) }
    }

    pub fn output_count(&self) -> usize {
        unsafe { btck_Transaction_CountOutputs(self.inner.as_ptr()) }
    }

    pub fn output(&self, index: usize) -> Result<TransactionOutput, Error> {
        let inner =
            check_owned(|err| unsafe { btck_Transaction_At(self.inner.as_ptr(), index, err) })?;
        Ok(TransactionOutput { inner })
    }

    /// A lazy view over the outputs.
    pub fn outputs(&self) -> Children<'_, Transaction> {
        Children::new(self)
    }

    /// The txid in internal byte order.
    pub fn txid(&self) -> [u8; 32] {
        let mut txid = [0u8; 32];
        unsafe { btck_Transaction_GetTxid(self.inner.as_ptr(), txid.as_mut_ptr()) };
        txid
    }

    pub fn size(&self) -> usize {
        unsafe { btck_Transaction_GetSize(self.inner.as_ptr()) }
    }

    /// The serialized transaction, borrowed from the native object.
    pub fn as_bytes(&self) -> &[u8] {
        let mut len = 0;
        let data = unsafe { btck_Transaction_AsBytes(self.inner.as_ptr(), &mut len) };
        if data.is_null() || len == 0 {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(data, len) }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        c_serialize(|write, userdata, err| unsafe {
            btck_Transaction_ToBytes(self.inner.as_ptr(), Some(write), userdata, err)
        })
    }

    /// The multi-line description produced by the library.
    pub fn describe(&self) -> Result<String, Error> {
        let bytes = c_serialize(|write, userdata, err| unsafe {
            btck_Transaction_ToString(self.inner.as_ptr(), Some(write), userdata, err)
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Parent for Transaction {
    type Child = TransactionOutput;

    fn child_count(&self) -> usize {
        self.output_count()
    }

    fn child_at(&self, index: usize) -> Result<TransactionOutput, Error> {
        self.output(index)
    }
}

impl TryFrom<&[u8]> for Transaction {
    type Error = Error;

    fn try_from(raw: &[u8]) -> Result<Self, Self::Error> {
        Transaction::new(raw)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.describe().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
