use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bitcoin::{
    absolute::LockTime, block::Header, block::Version as BlockVersion, hashes::Hash,
    transaction::Version, Amount, CompactTarget, OutPoint, ScriptBuf, Sequence, TxIn, TxMerkleNode,
    TxOut, Witness,
};

macro_rules! test_entity_requirements {
    ($test_name:ident, $entity:ty) => {
        #[test]
        fn $test_name() {
            fn assert_clone<T: Clone>() {}
            fn assert_send_sync<T: Send + Sync>() {}
            fn assert_debug<T: std::fmt::Debug>() {}

            assert_clone::<$entity>();
            assert_send_sync::<$entity>();
            assert_send_sync::<std::sync::Arc<$entity>>();
            assert_debug::<$entity>();
        }
    };
}

pub(crate) use test_entity_requirements;

/// Payload that counts how often it has been dropped.
#[derive(Debug)]
pub(crate) struct DropCounter(pub Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) fn spend_tx(inputs: usize, outputs: &[(u64, &[u8])]) -> bitcoin::Transaction {
    bitcoin::Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: (0..inputs)
            .map(|vout| TxIn {
                previous_output: OutPoint {
                    txid: bitcoin::Txid::from_byte_array([0x11; 32]),
                    vout: vout as u32,
                },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
            .collect(),
        output: outputs
            .iter()
            .map(|(value, script)| TxOut {
                value: Amount::from_sat(*value),
                script_pubkey: ScriptBuf::from_bytes(script.to_vec()),
            })
            .collect(),
    }
}

pub(crate) fn coinbase_tx(height: u8) -> bitcoin::Transaction {
    bitcoin::Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: ScriptBuf::from_bytes(vec![0x01, height, 0x51]),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(50 * 100_000_000),
            script_pubkey: ScriptBuf::from_bytes(vec![0x51]),
        }],
    }
}

/// Builds a block on top of `prev` carrying a coinbase and `extra` transactions.
pub(crate) fn make_block(
    prev: bitcoin::BlockHash,
    height: u8,
    extra: Vec<bitcoin::Transaction>,
) -> bitcoin::Block {
    let mut txdata = vec![coinbase_tx(height)];
    txdata.extend(extra);
    let mut block = bitcoin::Block {
        header: Header {
            version: BlockVersion::from_consensus(4),
            prev_blockhash: prev,
            merkle_root: TxMerkleNode::all_zeros(),
            time: 1_296_688_602 + u32::from(height),
            bits: CompactTarget::from_consensus(0x207fffff),
            nonce: 0,
        },
        txdata,
    };
    if let Some(root) = block.compute_merkle_root() {
        block.header.merkle_root = root;
    }
    block
}

/// A linear chain of `len` blocks starting from a block with an all-zero parent.
pub(crate) fn make_chain(len: u8) -> Vec<bitcoin::Block> {
    let mut blocks: Vec<bitcoin::Block> = Vec::new();
    for height in 0..len {
        let prev = blocks
            .last()
            .map(|block| block.block_hash())
            .unwrap_or_else(bitcoin::BlockHash::all_zeros);
        blocks.push(make_block(prev, height, vec![]));
    }
    blocks
}
