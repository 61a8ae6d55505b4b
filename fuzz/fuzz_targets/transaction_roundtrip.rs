#![no_main]
use std::sync::Arc;

use btck::{prelude::*, Transaction};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(transaction) = Transaction::try_from(data) else {
        return;
    };

    // Only exact encodings parse, so the stored bytes are the input.
    assert_eq!(transaction.as_bytes(), data);

    let mut written = Vec::new();
    transaction.write_to(&mut written).unwrap();
    assert_eq!(written, data);

    let roundtrip = Transaction::try_from(written.as_slice())
        .expect("Serialized transaction should deserialize");
    assert_eq!(roundtrip, transaction);
    assert_eq!(roundtrip.txid(), transaction.txid());

    let tx = Arc::new(transaction);
    let outputs = tx.outputs();
    assert_eq!(outputs.len(), tx.output_count());
    assert_eq!(outputs.iter().count(), tx.output_count());
    assert!(outputs.get(tx.output_count()).is_err());

    for (i, output) in outputs.iter().enumerate().take(10) {
        let indexed = tx.output(i).unwrap();
        assert_eq!(indexed.amount(), output.amount());
        assert_eq!(indexed.script_pubkey().as_bytes(), output.script_pubkey().as_bytes());
    }
});
