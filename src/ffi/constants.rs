use std::ffi::{c_int, c_uint};

pub type btck_VerificationFlags = c_uint;
pub type btck_VerificationError = c_int;
pub type btck_ChainType = c_int;
pub type btck_LogLevel = c_int;

// Verification Flags
pub const BTCK_VERIFICATION_FLAGS_NONE: btck_VerificationFlags = 0;
pub const BTCK_VERIFICATION_FLAGS_P2SH: btck_VerificationFlags = 1 << 0;
pub const BTCK_VERIFICATION_FLAGS_DERSIG: btck_VerificationFlags = 1 << 2;
pub const BTCK_VERIFICATION_FLAGS_NULLDUMMY: btck_VerificationFlags = 1 << 4;
pub const BTCK_VERIFICATION_FLAGS_CLEANSTACK: btck_VerificationFlags = 1 << 8;
pub const BTCK_VERIFICATION_FLAGS_CHECKLOCKTIMEVERIFY: btck_VerificationFlags = 1 << 9;
pub const BTCK_VERIFICATION_FLAGS_CHECKSEQUENCEVERIFY: btck_VerificationFlags = 1 << 10;
pub const BTCK_VERIFICATION_FLAGS_WITNESS: btck_VerificationFlags = 1 << 11;
pub const BTCK_VERIFICATION_FLAGS_TAPROOT: btck_VerificationFlags = 1 << 17;
pub const BTCK_VERIFICATION_FLAGS_ALL: btck_VerificationFlags = BTCK_VERIFICATION_FLAGS_P2SH
    | BTCK_VERIFICATION_FLAGS_DERSIG
    | BTCK_VERIFICATION_FLAGS_NULLDUMMY
    | BTCK_VERIFICATION_FLAGS_CHECKLOCKTIMEVERIFY
    | BTCK_VERIFICATION_FLAGS_CHECKSEQUENCEVERIFY
    | BTCK_VERIFICATION_FLAGS_WITNESS
    | BTCK_VERIFICATION_FLAGS_TAPROOT;

// Verification Errors
pub const BTCK_VERIFICATION_ERROR_TX_INPUT_INDEX: btck_VerificationError = 0;
pub const BTCK_VERIFICATION_ERROR_INVALID_FLAGS: btck_VerificationError = 1;
pub const BTCK_VERIFICATION_ERROR_INVALID_FLAGS_COMBINATION: btck_VerificationError = 2;
pub const BTCK_VERIFICATION_ERROR_SPENT_OUTPUTS_REQUIRED: btck_VerificationError = 3;
pub const BTCK_VERIFICATION_ERROR_SPENT_OUTPUTS_MISMATCH: btck_VerificationError = 4;

// Chain Types
pub const BTCK_CHAIN_TYPE_MAINNET: btck_ChainType = 0;
pub const BTCK_CHAIN_TYPE_TESTNET: btck_ChainType = 1;
pub const BTCK_CHAIN_TYPE_TESTNET_4: btck_ChainType = 2;
pub const BTCK_CHAIN_TYPE_SIGNET: btck_ChainType = 3;
pub const BTCK_CHAIN_TYPE_REGTEST: btck_ChainType = 4;

// Log Levels
pub const BTCK_LOG_LEVEL_TRACE: btck_LogLevel = 0;
pub const BTCK_LOG_LEVEL_DEBUG: btck_LogLevel = 1;
pub const BTCK_LOG_LEVEL_INFO: btck_LogLevel = 2;
pub const BTCK_LOG_LEVEL_WARNING: btck_LogLevel = 3;
pub const BTCK_LOG_LEVEL_ERROR: btck_LogLevel = 4;
