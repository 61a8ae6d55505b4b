use std::{fmt, fmt::Write as _, io, sync::Arc};

use bitcoin::{consensus::serialize, Txid, TxOut};

use crate::{
    core::{decode, range::Range, range::Sequence, script::ScriptPubkey, try_copy},
    KernelError,
};

/// A single transaction output containing a value and spending conditions.
///
/// The amount is kept as a signed 64-bit value and is not range checked;
/// invalid amounts are rejected by the interpreter during verification.
/// The script pubkey is shared with every handle that retrieved it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutput {
    amount: i64,
    script_pubkey: Arc<ScriptPubkey>,
}

impl TransactionOutput {
    /// Creates a new transaction output sharing `script_pubkey`.
    pub fn new(script_pubkey: Arc<ScriptPubkey>, amount: i64) -> TransactionOutput {
        TransactionOutput {
            amount,
            script_pubkey,
        }
    }

    pub(crate) fn from_tx_out(output: &TxOut) -> TransactionOutput {
        TransactionOutput {
            amount: output.value.to_sat() as i64,
            script_pubkey: Arc::new(ScriptPubkey::from(output.script_pubkey.clone())),
        }
    }

    /// Returns the amount of this output in satoshis.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Returns a new reference to the script pubkey of this output.
    pub fn script_pubkey(&self) -> Arc<ScriptPubkey> {
        Arc::clone(&self.script_pubkey)
    }

    pub fn script_pubkey_ref(&self) -> &ScriptPubkey {
        &self.script_pubkey
    }
}

impl fmt::Display for TransactionOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TransactionOutput(amount={}, script_pubkey={})",
            self.amount, self.script_pubkey
        )
    }
}

/// A parsed transaction.
///
/// Keeps the exact bytes it was parsed from, so serialization reproduces the
/// input. Outputs are materialized once and handed out as shared references.
#[derive(Debug, Clone)]
pub struct Transaction {
    tx: bitcoin::Transaction,
    raw: Vec<u8>,
    txid: Txid,
    outputs: Vec<Arc<TransactionOutput>>,
    display: String,
}

impl Transaction {
    /// Parses a transaction from its consensus encoding.
    ///
    /// # Errors
    /// Returns [`KernelError::Parse`] for malformed bytes and
    /// [`KernelError::TrailingData`] if bytes remain after the transaction.
    pub fn new(raw: &[u8]) -> Result<Self, KernelError> {
        let tx = decode::<bitcoin::Transaction>("transaction", raw)?;
        Ok(Self::with_raw(tx, try_copy(raw)?))
    }

    pub(crate) fn from_consensus(tx: bitcoin::Transaction) -> Self {
        let raw = serialize(&tx);
        Self::with_raw(tx, raw)
    }

    fn with_raw(tx: bitcoin::Transaction, raw: Vec<u8>) -> Self {
        let txid = tx.txid();
        let outputs = tx
            .output
            .iter()
            .map(|output| Arc::new(TransactionOutput::from_tx_out(output)))
            .collect();
        let display = describe(&tx, &txid);
        Transaction {
            tx,
            raw,
            txid,
            outputs,
            display,
        }
    }

    pub fn txid(&self) -> Txid {
        self.txid
    }

    pub fn input_count(&self) -> usize {
        self.tx.input.len()
    }

    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Returns a new reference to the output at `index`.
    ///
    /// # Errors
    /// Returns [`KernelError::OutOfBounds`] if `index` is out of range.
    pub fn output(&self, index: usize) -> Result<Arc<TransactionOutput>, KernelError> {
        self.outputs
            .get(index)
            .cloned()
            .ok_or(KernelError::OutOfBounds {
                index,
                len: self.outputs.len(),
            })
    }

    /// A view over the outputs of this transaction.
    pub fn outputs(self: &Arc<Self>) -> Range<Transaction> {
        Range::new(Arc::clone(self))
    }

    /// The serialized transaction, borrowed for the lifetime of `self`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Size of the serialized transaction in bytes.
    pub fn size(&self) -> usize {
        self.raw.len()
    }

    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> Result<(), KernelError> {
        writer
            .write_all(&self.raw)
            .map_err(|_| KernelError::SerializationFailed)
    }

    pub fn as_consensus(&self) -> &bitcoin::Transaction {
        &self.tx
    }
}

fn describe(tx: &bitcoin::Transaction, txid: &Txid) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Transaction(txid={}, version={}, inputs={}, outputs={}, lock_time={})",
        txid,
        tx.version.0,
        tx.input.len(),
        tx.output.len(),
        tx.lock_time.to_consensus_u32()
    );
    for input in &tx.input {
        let _ = writeln!(
            out,
            "    Input(prevout={}, script_sig={}, sequence={})",
            input.previous_output,
            hex::encode(input.script_sig.as_bytes()),
            input.sequence.0
        );
        if !input.witness.is_empty() {
            let items: Vec<String> = input.witness.iter().map(hex::encode).collect();
            let _ = writeln!(out, "    Witness({})", items.join(", "));
        }
    }
    for output in &tx.output {
        let _ = writeln!(
            out,
            "    Output(amount={}, script_pubkey={})",
            output.value.to_sat(),
            hex::encode(output.script_pubkey.as_bytes())
        );
    }
    out
}

impl Sequence for Transaction {
    type Item = Arc<TransactionOutput>;

    fn len(&self) -> usize {
        self.outputs.len()
    }

    fn item(&self, index: usize) -> Self::Item {
        Arc::clone(&self.outputs[index])
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Transaction {}

impl TryFrom<&[u8]> for Transaction {
    type Error = KernelError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Transaction::new(bytes)
    }
}

impl From<&Transaction> for Vec<u8> {
    fn from(tx: &Transaction) -> Self {
        tx.raw.clone()
    }
}

impl From<Transaction> for Vec<u8> {
    fn from(tx: Transaction) -> Self {
        tx.raw
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}
