pub mod block;
pub mod range;
pub mod script;
pub mod transaction;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_utils;

use bitcoin::consensus::{deserialize_partial, Decodable};

use crate::KernelError;

pub use block::{Block, BlockHash};
pub use range::{Iter, Range, Sequence};
pub use script::ScriptPubkey;
pub use transaction::{Transaction, TransactionOutput};
pub use verify::{
    check_arguments, flags_to_string, parse_flags, verify, verify_with, ScriptCheck,
    ScriptVerifier, VerificationError, VERIFY_ALL, VERIFY_ALL_PRE_TAPROOT,
    VERIFY_CHECKLOCKTIMEVERIFY, VERIFY_CHECKSEQUENCEVERIFY, VERIFY_CLEANSTACK, VERIFY_DERSIG,
    VERIFY_NONE, VERIFY_NULLDUMMY, VERIFY_P2SH, VERIFY_TAPROOT, VERIFY_WITNESS,
};

#[cfg(feature = "bitcoinconsensus")]
pub use verify::ConsensusVerifier;

/// Copies `bytes` into a fresh buffer, reporting allocation failure instead
/// of aborting.
pub(crate) fn try_copy(bytes: &[u8]) -> Result<Vec<u8>, KernelError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(bytes.len())
        .map_err(|_| KernelError::OutOfMemory)?;
    buffer.extend_from_slice(bytes);
    Ok(buffer)
}

/// Decodes exactly one consensus-encoded `T` from `raw`.
pub(crate) fn decode<T: Decodable>(what: &'static str, raw: &[u8]) -> Result<T, KernelError> {
    let (value, consumed) = deserialize_partial::<T>(raw).map_err(|err| KernelError::Parse {
        what,
        reason: err.to_string(),
    })?;
    if consumed != raw.len() {
        return Err(KernelError::TrailingData {
            what,
            consumed,
            total: raw.len(),
        });
    }
    Ok(value)
}
