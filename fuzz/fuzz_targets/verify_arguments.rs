#![no_main]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use arbitrary::Arbitrary;
use btck::{
    core::check_arguments, verify_with, KernelError, ScriptCheck, ScriptPubkey, ScriptVerifier,
    Transaction, TransactionOutput,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
pub struct SpentOutput {
    pub value: i64,
    pub script_pubkey: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
pub struct VerifyInput {
    pub script_pubkey: Vec<u8>,
    pub amount: i64,
    pub tx_to: Vec<u8>,
    pub input_index: u32,
    pub flags: u32,
    pub spent_outputs: Vec<SpentOutput>,
}

/// Records that the interpreter was reached and accepts everything.
#[derive(Default)]
struct Reached(AtomicBool);

impl ScriptVerifier for Reached {
    fn verify_script(&self, check: &ScriptCheck<'_>) -> Result<bool, KernelError> {
        assert!((check.input_index as usize) < check.tx_to.input_count());
        self.0.store(true, Ordering::Relaxed);
        Ok(true)
    }
}

fuzz_target!(|data: VerifyInput| {
    let Ok(tx_to) = Transaction::new(&data.tx_to) else {
        return;
    };
    let Ok(script_pubkey) = ScriptPubkey::new(&data.script_pubkey) else {
        return;
    };
    let spent_outputs: Vec<TransactionOutput> = data
        .spent_outputs
        .iter()
        .filter_map(|output| {
            let script = ScriptPubkey::new(&output.script_pubkey).ok()?;
            Some(TransactionOutput::new(Arc::new(script), output.value))
        })
        .collect();

    let expected = check_arguments(
        tx_to.input_count(),
        spent_outputs.len(),
        data.input_index,
        data.flags,
    );

    let verifier = Reached::default();
    let result = verify_with(
        &verifier,
        &script_pubkey,
        data.amount,
        &tx_to,
        &spent_outputs,
        data.input_index,
        data.flags,
    );

    match expected {
        Ok(()) => {
            assert!(matches!(result, Ok(true)));
            assert!(verifier.0.load(Ordering::Relaxed));
        }
        Err(err) => {
            assert!(matches!(result, Err(KernelError::ScriptVerify(e)) if e == err));
            assert!(!verifier.0.load(Ordering::Relaxed));
        }
    }
});
