#![no_main]
use std::sync::Arc;

use btck::{prelude::*, Block};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(block) = Block::try_from(data) else {
        return;
    };

    let serialized: Vec<u8> = (&block).into();
    assert_eq!(serialized, data);

    let roundtrip =
        Block::try_from(serialized.as_slice()).expect("Serialized block should deserialize");
    assert_eq!(roundtrip.hash(), block.hash());
    assert_eq!(roundtrip.prev_hash(), block.prev_hash());

    let block = Arc::new(block);
    let transactions = block.transactions();
    assert_eq!(transactions.len(), block.transaction_count());
    for tx in transactions.iter().take(5) {
        assert_eq!(Transaction::try_from(tx.as_bytes()).unwrap(), *tx);
    }
});
