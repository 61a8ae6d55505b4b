use std::{
    borrow::Borrow,
    error::Error,
    ffi::CStr,
    fmt::{self, Display, Formatter},
};

use crate::{
    core::{script::ScriptPubkey, transaction::Transaction, transaction::TransactionOutput},
    ffi::{
        btck_VerificationError, BTCK_VERIFICATION_ERROR_INVALID_FLAGS,
        BTCK_VERIFICATION_ERROR_INVALID_FLAGS_COMBINATION,
        BTCK_VERIFICATION_ERROR_SPENT_OUTPUTS_MISMATCH,
        BTCK_VERIFICATION_ERROR_SPENT_OUTPUTS_REQUIRED, BTCK_VERIFICATION_ERROR_TX_INPUT_INDEX,
        BTCK_VERIFICATION_FLAGS_ALL, BTCK_VERIFICATION_FLAGS_CHECKLOCKTIMEVERIFY,
        BTCK_VERIFICATION_FLAGS_CHECKSEQUENCEVERIFY, BTCK_VERIFICATION_FLAGS_CLEANSTACK,
        BTCK_VERIFICATION_FLAGS_DERSIG, BTCK_VERIFICATION_FLAGS_NONE,
        BTCK_VERIFICATION_FLAGS_NULLDUMMY, BTCK_VERIFICATION_FLAGS_P2SH,
        BTCK_VERIFICATION_FLAGS_TAPROOT, BTCK_VERIFICATION_FLAGS_WITNESS,
    },
    KernelError,
};

pub const VERIFY_NONE: u32 = BTCK_VERIFICATION_FLAGS_NONE;

pub const VERIFY_P2SH: u32 = BTCK_VERIFICATION_FLAGS_P2SH;

pub const VERIFY_DERSIG: u32 = BTCK_VERIFICATION_FLAGS_DERSIG;

pub const VERIFY_NULLDUMMY: u32 = BTCK_VERIFICATION_FLAGS_NULLDUMMY;

pub const VERIFY_CHECKLOCKTIMEVERIFY: u32 = BTCK_VERIFICATION_FLAGS_CHECKLOCKTIMEVERIFY;

pub const VERIFY_CHECKSEQUENCEVERIFY: u32 = BTCK_VERIFICATION_FLAGS_CHECKSEQUENCEVERIFY;

pub const VERIFY_WITNESS: u32 = BTCK_VERIFICATION_FLAGS_WITNESS;

pub const VERIFY_TAPROOT: u32 = BTCK_VERIFICATION_FLAGS_TAPROOT;

pub const VERIFY_ALL: u32 = BTCK_VERIFICATION_FLAGS_ALL;

/// Requires a clean stack after evaluation. Accepted by [`verify`] and
/// checked against the combination rules, but `libbitcoinconsensus` has no
/// clean stack rule, so [`ConsensusVerifier`] drops it before evaluating.
/// Not part of [`VERIFY_ALL`] and not rendered by [`flags_to_string`].
pub const VERIFY_CLEANSTACK: u32 = BTCK_VERIFICATION_FLAGS_CLEANSTACK;

pub const VERIFY_ALL_PRE_TAPROOT: u32 = VERIFY_P2SH
    | VERIFY_DERSIG
    | VERIFY_NULLDUMMY
    | VERIFY_CHECKLOCKTIMEVERIFY
    | VERIFY_CHECKSEQUENCEVERIFY
    | VERIFY_WITNESS;

const VERIFY_ACCEPTED: u32 = VERIFY_ALL | VERIFY_CLEANSTACK;

/// Flag names in rendering order.
const FLAG_NAMES: [(u32, &str); 7] = [
    (VERIFY_P2SH, "P2SH"),
    (VERIFY_DERSIG, "DERSIG"),
    (VERIFY_NULLDUMMY, "NULLDUMMY"),
    (VERIFY_CHECKLOCKTIMEVERIFY, "CHECKLOCKTIMEVERIFY"),
    (VERIFY_CHECKSEQUENCEVERIFY, "CHECKSEQUENCEVERIFY"),
    (VERIFY_WITNESS, "WITNESS"),
    (VERIFY_TAPROOT, "TAPROOT"),
];

/// Renders a flag set as `"ALL"`, `"NONE"` or the `" | "`-joined names of
/// the set bits in canonical order.
///
/// # Errors
/// [`KernelError::InvalidFlags`] if `flags` has bits outside [`VERIFY_ALL`].
pub fn flags_to_string(flags: u32) -> Result<String, KernelError> {
    if flags == VERIFY_ALL {
        return Ok("ALL".to_string());
    }
    if flags == VERIFY_NONE {
        return Ok("NONE".to_string());
    }
    if flags & !VERIFY_ALL != 0 {
        return Err(KernelError::InvalidFlags(flags));
    }
    let names: Vec<&str> = FLAG_NAMES
        .iter()
        .filter(|(flag, _)| flags & flag != 0)
        .map(|(_, name)| *name)
        .collect();
    Ok(names.join(" | "))
}

/// Parses the output of [`flags_to_string`]. Names are matched exactly and
/// may appear in any order.
pub fn parse_flags(text: &str) -> Result<u32, KernelError> {
    match text.trim() {
        "ALL" => return Ok(VERIFY_ALL),
        "NONE" => return Ok(VERIFY_NONE),
        _ => {}
    }
    text.split('|').try_fold(VERIFY_NONE, |acc, name| {
        let name = name.trim();
        FLAG_NAMES
            .iter()
            .find(|(_, known)| *known == name)
            .map(|(flag, _)| acc | flag)
            .ok_or_else(|| KernelError::InvalidArgument(format!("unknown flag name '{}'", name)))
    })
}

/// A contract violation detected before the script interpreter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum VerificationError {
    TxInputIndex = BTCK_VERIFICATION_ERROR_TX_INPUT_INDEX,
    InvalidFlags = BTCK_VERIFICATION_ERROR_INVALID_FLAGS,
    InvalidFlagsCombination = BTCK_VERIFICATION_ERROR_INVALID_FLAGS_COMBINATION,
    SpentOutputsRequired = BTCK_VERIFICATION_ERROR_SPENT_OUTPUTS_REQUIRED,
    SpentOutputsMismatch = BTCK_VERIFICATION_ERROR_SPENT_OUTPUTS_MISMATCH,
}

impl VerificationError {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// The message as a C string, shared with the C API.
    pub fn c_message(self) -> &'static CStr {
        match self {
            VerificationError::TxInputIndex => c"The provided input index is out of range of the actual number of inputs of the transaction.",
            VerificationError::InvalidFlags => c"The provided bitfield for the flags was invalid.",
            VerificationError::InvalidFlagsCombination => {
                c"The flags were combined in an invalid way."
            }
            VerificationError::SpentOutputsRequired => {
                c"The taproot flag was set, so valid spent_outputs have to be provided."
            }
            VerificationError::SpentOutputsMismatch => {
                c"The number of spent outputs does not match the number of inputs of the tx."
            }
        }
    }

    pub fn message(self) -> &'static str {
        self.c_message().to_str().unwrap_or_default()
    }
}

impl TryFrom<btck_VerificationError> for VerificationError {
    type Error = KernelError;

    fn try_from(value: btck_VerificationError) -> Result<Self, Self::Error> {
        match value {
            BTCK_VERIFICATION_ERROR_TX_INPUT_INDEX => Ok(VerificationError::TxInputIndex),
            BTCK_VERIFICATION_ERROR_INVALID_FLAGS => Ok(VerificationError::InvalidFlags),
            BTCK_VERIFICATION_ERROR_INVALID_FLAGS_COMBINATION => {
                Ok(VerificationError::InvalidFlagsCombination)
            }
            BTCK_VERIFICATION_ERROR_SPENT_OUTPUTS_REQUIRED => {
                Ok(VerificationError::SpentOutputsRequired)
            }
            BTCK_VERIFICATION_ERROR_SPENT_OUTPUTS_MISMATCH => {
                Ok(VerificationError::SpentOutputsMismatch)
            }
            _ => Err(KernelError::InvalidArgument(format!(
                "unknown verification error code {}",
                value
            ))),
        }
    }
}

impl Display for VerificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl Error for VerificationError {}

/// Checks the verification arguments in order; the first violated rule wins.
pub fn check_arguments(
    input_count: usize,
    spent_outputs_len: usize,
    input_index: u32,
    flags: u32,
) -> Result<(), VerificationError> {
    if flags & !VERIFY_ACCEPTED != 0 {
        return Err(VerificationError::InvalidFlags);
    }

    let cleanstack = flags & VERIFY_CLEANSTACK != 0;
    let p2sh = flags & VERIFY_P2SH != 0;
    let witness = flags & VERIFY_WITNESS != 0;
    let taproot = flags & VERIFY_TAPROOT != 0;

    if (cleanstack && !p2sh && !witness) || (witness && !p2sh) {
        return Err(VerificationError::InvalidFlagsCombination);
    }

    if taproot && spent_outputs_len == 0 {
        return Err(VerificationError::SpentOutputsRequired);
    }

    if spent_outputs_len != 0 && spent_outputs_len != input_count {
        return Err(VerificationError::SpentOutputsMismatch);
    }

    if input_index as usize >= input_count {
        return Err(VerificationError::TxInputIndex);
    }

    Ok(())
}

/// The arguments of one script check, after [`check_arguments`] passed.
pub struct ScriptCheck<'a> {
    pub script_pubkey: &'a ScriptPubkey,
    pub amount: i64,
    pub tx_to: &'a Transaction,
    pub spent_outputs: &'a [&'a TransactionOutput],
    pub input_index: u32,
    pub flags: u32,
}

/// Runs the script interpreter for one input.
///
/// Returns `Ok(false)` when the script fails to validate. Errors are
/// reserved for requests the interpreter could not evaluate.
pub trait ScriptVerifier: Send + Sync {
    fn verify_script(&self, check: &ScriptCheck<'_>) -> Result<bool, KernelError>;
}

/// Script interpreter backed by `libbitcoinconsensus`.
#[cfg(feature = "bitcoinconsensus")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusVerifier;

#[cfg(feature = "bitcoinconsensus")]
impl ScriptVerifier for ConsensusVerifier {
    fn verify_script(&self, check: &ScriptCheck<'_>) -> Result<bool, KernelError> {
        use bitcoinconsensus::{Error as ConsensusError, Utxo};

        let utxos: Vec<Utxo> = check
            .spent_outputs
            .iter()
            .map(|output| {
                let script = output.script_pubkey_ref().as_bytes();
                Utxo {
                    script_pubkey: script.as_ptr(),
                    script_pubkey_len: script.len() as _,
                    value: output.amount(),
                }
            })
            .collect();
        let spent_outputs = if utxos.is_empty() {
            None
        } else {
            Some(utxos.as_slice())
        };

        let result = bitcoinconsensus::verify_with_flags(
            check.script_pubkey.as_bytes(),
            check.amount as u64,
            check.tx_to.as_bytes(),
            spent_outputs,
            check.input_index as usize,
            interpreter_flags(check.flags),
        );

        match result {
            Ok(()) => Ok(true),
            Err(ConsensusError::ERR_SCRIPT) => Ok(false),
            Err(ConsensusError::ERR_TX_INDEX) => Err(VerificationError::TxInputIndex.into()),
            Err(ConsensusError::ERR_INVALID_FLAGS) => Err(VerificationError::InvalidFlags.into()),
            Err(ConsensusError::ERR_SPENT_OUTPUTS_REQUIRED) => {
                Err(VerificationError::SpentOutputsRequired.into())
            }
            Err(ConsensusError::ERR_SPENT_OUTPUTS_MISMATCH) => {
                Err(VerificationError::SpentOutputsMismatch.into())
            }
            Err(err) => Err(KernelError::Internal(format!(
                "script interpreter rejected the request: {:?}",
                err
            ))),
        }
    }
}

/// The flags handed to `libbitcoinconsensus`, which rejects any bit outside
/// its own ALL set.
pub fn interpreter_flags(flags: u32) -> u32 {
    flags & VERIFY_ALL
}

#[cfg(not(feature = "bitcoinconsensus"))]
struct UnavailableVerifier;

#[cfg(not(feature = "bitcoinconsensus"))]
impl ScriptVerifier for UnavailableVerifier {
    fn verify_script(&self, _check: &ScriptCheck<'_>) -> Result<bool, KernelError> {
        Err(KernelError::Internal(
            "no script interpreter linked".to_string(),
        ))
    }
}

/// Verifies a transaction input against its corresponding output script.
///
/// # Arguments
/// * `script_pubkey` - The output script to verify against
/// * `amount` - The amount of the spent output, needed when the witness flag is set
/// * `tx_to` - The transaction containing the input to verify
/// * `spent_outputs` - The outputs spent by every input of `tx_to`, or empty
/// * `input_index` - The index of the input within `tx_to` to verify
/// * `flags` - The script rules to enforce
///
/// # Returns
/// * `Ok(true)` if the script validates, `Ok(false)` if it does not
/// * [`KernelError::ScriptVerify`] if the arguments violate the verification contract
pub fn verify<T: Borrow<TransactionOutput>>(
    script_pubkey: &ScriptPubkey,
    amount: i64,
    tx_to: &Transaction,
    spent_outputs: &[T],
    input_index: u32,
    flags: u32,
) -> Result<bool, KernelError> {
    #[cfg(feature = "bitcoinconsensus")]
    let verifier = ConsensusVerifier;
    #[cfg(not(feature = "bitcoinconsensus"))]
    let verifier = UnavailableVerifier;

    verify_with(
        &verifier,
        script_pubkey,
        amount,
        tx_to,
        spent_outputs,
        input_index,
        flags,
    )
}

/// Same as [`verify`], with an explicit script interpreter.
pub fn verify_with<V, T>(
    verifier: &V,
    script_pubkey: &ScriptPubkey,
    amount: i64,
    tx_to: &Transaction,
    spent_outputs: &[T],
    input_index: u32,
    flags: u32,
) -> Result<bool, KernelError>
where
    V: ScriptVerifier + ?Sized,
    T: Borrow<TransactionOutput>,
{
    if let Err(err) = check_arguments(
        tx_to.input_count(),
        spent_outputs.len(),
        input_index,
        flags,
    ) {
        log::debug!(
            "Rejecting verification of input {} of {}: {}",
            input_index,
            tx_to.txid(),
            err
        );
        return Err(KernelError::ScriptVerify(err));
    }

    let spent_outputs: Vec<&TransactionOutput> =
        spent_outputs.iter().map(|output| output.borrow()).collect();
    let check = ScriptCheck {
        script_pubkey,
        amount,
        tx_to,
        spent_outputs: &spent_outputs,
        input_index,
        flags,
    };
    let valid = verifier.verify_script(&check)?;
    log::trace!(
        "Input {} of {} verified: {}",
        input_index,
        tx_to.txid(),
        valid
    );
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_utils::spend_tx;
    use bitcoin::consensus::serialize;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct CountingVerifier {
        calls: AtomicUsize,
        result: bool,
    }

    impl CountingVerifier {
        fn new(result: bool) -> Self {
            CountingVerifier {
                calls: AtomicUsize::new(0),
                result,
            }
        }
    }

    impl ScriptVerifier for CountingVerifier {
        fn verify_script(&self, check: &ScriptCheck<'_>) -> Result<bool, KernelError> {
            assert!((check.input_index as usize) < check.tx_to.input_count());
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result)
        }
    }

    fn two_input_tx() -> Transaction {
        Transaction::new(&serialize(&spend_tx(2, &[(10, &[0x51][..])]))).unwrap()
    }

    fn outputs(count: usize) -> Vec<Arc<TransactionOutput>> {
        let script = Arc::new(ScriptPubkey::new(&[0x51]).unwrap());
        (0..count)
            .map(|_| Arc::new(TransactionOutput::new(Arc::clone(&script), 10)))
            .collect()
    }

    fn run(spent: usize, input_index: u32, flags: u32) -> (Result<bool, KernelError>, usize) {
        let verifier = CountingVerifier::new(true);
        let script = ScriptPubkey::new(&[0x51]).unwrap();
        let result = verify_with(
            &verifier,
            &script,
            10,
            &two_input_tx(),
            &outputs(spent),
            input_index,
            flags,
        );
        (result, verifier.calls.load(Ordering::SeqCst))
    }

    fn verification_error(result: Result<bool, KernelError>) -> VerificationError {
        match result {
            Err(KernelError::ScriptVerify(err)) => err,
            other => panic!("expected a verification error, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_all_pre_taproot() {
        let expected = VERIFY_P2SH
            | VERIFY_DERSIG
            | VERIFY_NULLDUMMY
            | VERIFY_CHECKLOCKTIMEVERIFY
            | VERIFY_CHECKSEQUENCEVERIFY
            | VERIFY_WITNESS;

        assert_eq!(VERIFY_ALL_PRE_TAPROOT, expected);
        assert_eq!(VERIFY_ALL, expected | VERIFY_TAPROOT);
        assert_eq!(VERIFY_ALL & VERIFY_CLEANSTACK, 0);
    }

    #[test]
    fn test_flags_all_and_none_pass() {
        assert!(matches!(run(2, 0, VERIFY_ALL), (Ok(true), 1)));
        assert!(matches!(run(0, 1, VERIFY_NONE), (Ok(true), 1)));
    }

    #[test]
    fn test_unknown_bits_are_invalid_flags() {
        let (result, calls) = run(2, 0, VERIFY_ALL | (1 << 30));
        assert_eq!(verification_error(result), VerificationError::InvalidFlags);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_invalid_flag_combinations() {
        for flags in [VERIFY_CLEANSTACK, VERIFY_WITNESS, VERIFY_CLEANSTACK | VERIFY_WITNESS] {
            let (result, _) = run(0, 0, flags);
            assert_eq!(
                verification_error(result),
                VerificationError::InvalidFlagsCombination
            );
        }
        assert!(run(0, 0, VERIFY_CLEANSTACK | VERIFY_P2SH).0.is_ok());
        assert!(run(0, 0, VERIFY_CLEANSTACK | VERIFY_P2SH | VERIFY_WITNESS).0.is_ok());
    }

    #[test]
    fn test_interpreter_flags_drop_cleanstack() {
        assert_eq!(
            interpreter_flags(VERIFY_CLEANSTACK | VERIFY_P2SH),
            VERIFY_P2SH
        );
        assert_eq!(interpreter_flags(VERIFY_ALL), VERIFY_ALL);
        assert_eq!(interpreter_flags(VERIFY_CLEANSTACK), VERIFY_NONE);
    }

    #[cfg(feature = "bitcoinconsensus")]
    #[test]
    fn test_cleanstack_reaches_interpreter_as_boolean() {
        let script = ScriptPubkey::new(&[0x51]).unwrap();
        let spent: Vec<Arc<TransactionOutput>> = Vec::new();
        for flags in [VERIFY_P2SH, VERIFY_P2SH | VERIFY_CLEANSTACK] {
            // A script outcome, never an argument error.
            let result = verify(&script, 0, &two_input_tx(), &spent, 0, flags);
            assert!(matches!(result, Ok(_)), "{:?}", result);
        }
    }

    #[test]
    fn test_spent_output_rules() {
        let (result, _) = run(0, 0, VERIFY_ALL);
        assert_eq!(
            verification_error(result),
            VerificationError::SpentOutputsRequired
        );
        let (result, _) = run(1, 0, VERIFY_ALL_PRE_TAPROOT);
        assert_eq!(
            verification_error(result),
            VerificationError::SpentOutputsMismatch
        );
        let (result, _) = run(3, 0, VERIFY_NONE);
        assert_eq!(
            verification_error(result),
            VerificationError::SpentOutputsMismatch
        );
    }

    #[test]
    fn test_input_index() {
        let (result, calls) = run(0, 2, VERIFY_NONE);
        assert_eq!(verification_error(result), VerificationError::TxInputIndex);
        assert_eq!(calls, 0);
        assert!(run(0, 1, VERIFY_NONE).0.is_ok());
    }

    #[test]
    fn test_rule_priority() {
        // Every rule violated at once: unknown bits win.
        let (result, _) = run(1, 9, (1 << 30) | VERIFY_WITNESS | VERIFY_TAPROOT);
        assert_eq!(verification_error(result), VerificationError::InvalidFlags);
        // Combination beats taproot without outputs.
        let (result, _) = run(0, 9, VERIFY_WITNESS | VERIFY_TAPROOT);
        assert_eq!(
            verification_error(result),
            VerificationError::InvalidFlagsCombination
        );
        // Missing outputs beat a bad input index.
        let (result, _) = run(0, 9, VERIFY_ALL);
        assert_eq!(
            verification_error(result),
            VerificationError::SpentOutputsRequired
        );
        // Count mismatch beats a bad input index.
        let (result, _) = run(1, 9, VERIFY_NONE);
        assert_eq!(
            verification_error(result),
            VerificationError::SpentOutputsMismatch
        );
    }

    #[test]
    fn test_script_failure_is_not_an_error() {
        let verifier = CountingVerifier::new(false);
        let script = ScriptPubkey::new(&[0x51]).unwrap();
        let spent: Vec<Arc<TransactionOutput>> = Vec::new();
        let result = verify_with(&verifier, &script, 0, &two_input_tx(), &spent, 0, VERIFY_P2SH);
        assert!(matches!(result, Ok(false)));
    }

    #[test]
    fn test_render_flags() {
        assert_eq!(flags_to_string(VERIFY_ALL).unwrap(), "ALL");
        assert_eq!(flags_to_string(VERIFY_NONE).unwrap(), "NONE");
        assert_eq!(
            flags_to_string(VERIFY_TAPROOT | VERIFY_WITNESS).unwrap(),
            "WITNESS | TAPROOT"
        );
        assert_eq!(
            flags_to_string(VERIFY_ALL_PRE_TAPROOT).unwrap(),
            "P2SH | DERSIG | NULLDUMMY | CHECKLOCKTIMEVERIFY | CHECKSEQUENCEVERIFY | WITNESS"
        );
        assert!(matches!(
            flags_to_string(VERIFY_CLEANSTACK),
            Err(KernelError::InvalidFlags(_))
        ));
        assert!(flags_to_string(1 << 31).is_err());
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!(parse_flags("ALL").unwrap(), VERIFY_ALL);
        assert_eq!(parse_flags("NONE").unwrap(), VERIFY_NONE);
        assert_eq!(
            parse_flags("TAPROOT | P2SH").unwrap(),
            VERIFY_TAPROOT | VERIFY_P2SH
        );
        let rendered = flags_to_string(VERIFY_P2SH | VERIFY_NULLDUMMY).unwrap();
        assert_eq!(parse_flags(&rendered).unwrap(), VERIFY_P2SH | VERIFY_NULLDUMMY);
        assert!(parse_flags("P2SH | CLEANSTACK").is_err());
        assert!(parse_flags("").is_err());
    }

    #[test]
    fn test_error_codes_and_messages() {
        for code in 0..5 {
            let err = VerificationError::try_from(code).unwrap();
            assert_eq!(err.code(), code);
            assert!(err.message().ends_with('.'));
            assert_eq!(err.c_message().to_bytes(), err.message().as_bytes());
        }
        assert!(VerificationError::try_from(5).is_err());
        assert_eq!(
            VerificationError::SpentOutputsRequired.to_string(),
            "The taproot flag was set, so valid spent_outputs have to be provided."
        );
    }
}
