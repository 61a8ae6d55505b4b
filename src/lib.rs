//! A stable C ABI over bitcoin consensus objects.
//!
//! The crate exposes scripts, transactions, blocks and an active chain as
//! reference-counted opaque handles, together with a script verification
//! entry point that validates its arguments before handing them to the
//! consensus script interpreter. The Rust types in [`core`] and [`state`]
//! are usable directly; [`ffi`] exports the same functionality with
//! `btck_`-prefixed C symbols.

use std::{fmt, io};

pub mod core;
pub mod ffi;
pub mod logging;
pub mod state;

/// Error domains reported through [`KernelError::domain`] and the C error
/// channel. Bindings dispatch on these strings to pick a native exception.
pub mod domain {
    pub const MEMORY: &str = "Memory";
    pub const PARSE: &str = "ParseError";
    pub const INDEX: &str = "IndexError";
    pub const VERIFICATION: &str = "VerificationError";
    pub const VALUE: &str = "ValueError";
    pub const LOOKUP: &str = "LookupError";
    pub const IO: &str = "IoError";
    pub const UNKNOWN: &str = "Unknown";
}

/// A collection of errors emitted by this library
#[derive(Debug)]
pub enum KernelError {
    OutOfMemory,
    Parse {
        what: &'static str,
        reason: String,
    },
    TrailingData {
        what: &'static str,
        consumed: usize,
        total: usize,
    },
    OutOfBounds {
        index: usize,
        len: usize,
    },
    ScriptVerify(VerificationError),
    InvalidFlags(u32),
    InvalidLength {
        expected: usize,
        actual: usize,
    },
    InvalidArgument(String),
    NotFound(BlockHash),
    SerializationFailed,
    Io(io::Error),
    Internal(String),
}

impl KernelError {
    /// The domain tag this error is reported under.
    pub fn domain(&self) -> &'static str {
        match self {
            KernelError::OutOfMemory => domain::MEMORY,
            KernelError::Parse { .. } | KernelError::TrailingData { .. } => domain::PARSE,
            KernelError::OutOfBounds { .. } => domain::INDEX,
            KernelError::ScriptVerify(_) => domain::VERIFICATION,
            KernelError::InvalidFlags(_)
            | KernelError::InvalidLength { .. }
            | KernelError::InvalidArgument(_) => domain::VALUE,
            KernelError::NotFound(_) => domain::LOOKUP,
            KernelError::SerializationFailed | KernelError::Io(_) => domain::IO,
            KernelError::Internal(_) => domain::UNKNOWN,
        }
    }

    /// The numeric code within [`KernelError::domain`].
    pub fn code(&self) -> i32 {
        match self {
            KernelError::OutOfMemory => -1,
            KernelError::Parse { .. } => 1,
            KernelError::TrailingData { .. } => 2,
            KernelError::OutOfBounds { .. } => 1,
            KernelError::ScriptVerify(err) => err.code(),
            KernelError::InvalidLength { .. } => 1,
            KernelError::InvalidFlags(_) => 2,
            KernelError::InvalidArgument(_) => 3,
            KernelError::NotFound(_) => 1,
            KernelError::SerializationFailed => 5,
            KernelError::Io(err) => err.raw_os_error().unwrap_or(-1),
            KernelError::Internal(_) => -1,
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::OutOfMemory => write!(f, "Out of memory"),
            KernelError::Parse { what, reason } => {
                write!(f, "Failed to parse {}: {}", what, reason)
            }
            KernelError::TrailingData {
                what,
                consumed,
                total,
            } => write!(
                f,
                "Trailing data after {}: consumed {} of {} bytes",
                what, consumed, total
            ),
            KernelError::OutOfBounds { index, len } => {
                write!(f, "Index {} out of range for length {}", index, len)
            }
            KernelError::ScriptVerify(err) => write!(f, "{}", err),
            KernelError::InvalidFlags(flags) => {
                write!(f, "Unknown verification flags: {:#x}", flags)
            }
            KernelError::InvalidLength { expected, actual } => {
                write!(f, "Invalid length: expected {}, got {}", expected, actual)
            }
            KernelError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            KernelError::NotFound(hash) => write!(f, "Block {} is not in the chain", hash),
            KernelError::SerializationFailed => write!(f, "Serialization failed"),
            KernelError::Io(err) => write!(f, "I/O error: {}", err),
            KernelError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for KernelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KernelError::ScriptVerify(err) => Some(err),
            KernelError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<VerificationError> for KernelError {
    fn from(err: VerificationError) -> Self {
        KernelError::ScriptVerify(err)
    }
}

impl From<io::Error> for KernelError {
    fn from(err: io::Error) -> Self {
        KernelError::Io(err)
    }
}

pub use crate::core::{
    flags_to_string, parse_flags, verify, verify_with, Block, BlockHash, Range, ScriptCheck,
    ScriptPubkey, ScriptVerifier, Sequence, Transaction, TransactionOutput, VerificationError,
};

#[cfg(feature = "bitcoinconsensus")]
pub use crate::core::ConsensusVerifier;

pub use crate::logging::{disable_logging, set_logger, Log, LogLevel, Logger};

pub use crate::state::{Chain, ChainOptions, ChainType};

pub use crate::core::verify::{
    VERIFY_ALL, VERIFY_ALL_PRE_TAPROOT, VERIFY_CHECKLOCKTIMEVERIFY, VERIFY_CHECKSEQUENCEVERIFY,
    VERIFY_CLEANSTACK, VERIFY_DERSIG, VERIFY_NONE, VERIFY_NULLDUMMY, VERIFY_P2SH, VERIFY_TAPROOT,
    VERIFY_WITNESS,
};

pub mod prelude {
    pub use crate::core::{Range, Sequence};
    pub use crate::{Block, BlockHash, Chain, KernelError, ScriptPubkey, Transaction, TransactionOutput};
}
