//! The active chain read from a node's block files.
//!
//! The [`Chain`] links a set of blocks by their parent hash and keeps the
//! tallest branch, providing access to blocks by height and lookup by
//! hash. It is immutable once opened, so concurrent reads need no locking.

use std::{collections::HashMap, sync::Arc};

use crate::{
    core::range::{Range, Sequence},
    state::{blockfiles, ChainOptions, ChainType},
    Block, BlockHash, KernelError,
};

/// Represents the active chain for querying and traversal.
///
/// Blocks are ordered from genesis (height 0) to the tip.
///
/// # Examples
/// ```no_run
/// use btck::{Chain, ChainOptions, ChainType, KernelError};
///
/// let options = ChainOptions::builder("/data")
///     .chain_type(ChainType::Regtest)
///     .build()?;
/// let chain = Chain::open(&options)?;
///
/// println!("Chain height: {}", chain.height());
/// if let Some(tip) = chain.tip() {
///     println!("Tip hash: {}", tip.hash());
/// }
/// # Ok::<(), KernelError>(())
/// ```
#[derive(Debug)]
pub struct Chain {
    blocks: Vec<Arc<Block>>,
    heights: HashMap<BlockHash, usize>,
    chain_type: Option<ChainType>,
}

impl Chain {
    /// Reads the block files described by `options` and links them into the
    /// active chain.
    ///
    /// # Errors
    /// Returns [`KernelError::Io`] if the block files cannot be read and
    /// [`KernelError::Parse`] if a record is malformed.
    pub fn open(options: &ChainOptions) -> Result<Chain, KernelError> {
        log::info!(
            "Opening {:?} chain from {}",
            options.chain_type(),
            options.blocks_dir().display()
        );
        let blocks = blockfiles::read_blocks(options.blocks_dir(), options.chain_type().magic())?;
        let mut chain = Chain::from_blocks(blocks);
        chain.chain_type = Some(options.chain_type());
        log::info!(
            "Loaded chain with height {}{}",
            chain.height(),
            chain
                .tip()
                .map(|tip| format!(", tip {}", tip.hash()))
                .unwrap_or_default()
        );
        Ok(chain)
    }

    /// Links `blocks` by parent hash and keeps the tallest branch. Among
    /// branches of equal height the one whose tip comes first wins.
    pub fn from_blocks(blocks: Vec<Block>) -> Chain {
        let mut positions: HashMap<BlockHash, usize> = HashMap::with_capacity(blocks.len());
        for (position, block) in blocks.iter().enumerate() {
            positions.entry(block.hash()).or_insert(position);
        }

        let mut children: HashMap<BlockHash, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        for (position, block) in blocks.iter().enumerate() {
            if positions.get(&block.hash()) != Some(&position) {
                log::debug!("Skipping duplicate block {}", block.hash());
                continue;
            }
            if positions.contains_key(&block.prev_hash()) {
                children.entry(block.prev_hash()).or_default().push(position);
            } else {
                roots.push(position);
            }
        }

        let mut best: Option<(usize, usize)> = None;
        for root in roots {
            let mut stack = vec![(root, 0usize)];
            while let Some((position, depth)) = stack.pop() {
                let better = match best {
                    None => true,
                    Some((best_position, best_depth)) => {
                        depth > best_depth || (depth == best_depth && position < best_position)
                    }
                };
                if better {
                    best = Some((position, depth));
                }
                if let Some(next) = children.get(&blocks[position].hash()) {
                    stack.extend(next.iter().map(|child| (*child, depth + 1)));
                }
            }
        }

        let mut path = Vec::new();
        let mut cursor = best.map(|(position, _)| position);
        while let Some(position) = cursor {
            path.push(position);
            cursor = positions.get(&blocks[position].prev_hash()).copied();
        }
        path.reverse();

        let mut slots: Vec<Option<Block>> = blocks.into_iter().map(Some).collect();
        let blocks: Vec<Arc<Block>> = path
            .into_iter()
            .filter_map(|position| slots[position].take().map(Arc::new))
            .collect();
        let heights = blocks
            .iter()
            .enumerate()
            .map(|(height, block)| (block.hash(), height))
            .collect();

        Chain {
            blocks,
            heights,
            chain_type: None,
        }
    }

    /// The network this chain was opened for, if it was read from disk.
    pub fn chain_type(&self) -> Option<ChainType> {
        self.chain_type
    }

    /// Returns the height of the chain tip, or -1 for an empty chain.
    pub fn height(&self) -> i32 {
        self.blocks.len() as i32 - 1
    }

    /// Number of blocks in the chain, one more than [`Chain::height`].
    pub fn size(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Returns a new reference to the block at `height`.
    ///
    /// # Errors
    /// Returns [`KernelError::OutOfBounds`] above the tip.
    pub fn at(&self, height: usize) -> Result<Arc<Block>, KernelError> {
        self.blocks
            .get(height)
            .cloned()
            .ok_or(KernelError::OutOfBounds {
                index: height,
                len: self.blocks.len(),
            })
    }

    pub fn tip(&self) -> Option<Arc<Block>> {
        self.blocks.last().cloned()
    }

    /// Returns the height of the block with `hash`, or `None` if it is not
    /// part of the chain.
    pub fn find(&self, hash: &BlockHash) -> Option<usize> {
        self.heights.get(hash).copied()
    }

    /// Like [`Chain::find`], but a missing block is an error.
    ///
    /// # Errors
    /// Returns [`KernelError::NotFound`] if the block is not in the chain.
    pub fn block_index(&self, hash: &BlockHash) -> Result<usize, KernelError> {
        self.find(hash).ok_or(KernelError::NotFound(*hash))
    }

    pub fn contains(&self, hash: &BlockHash) -> bool {
        self.heights.contains_key(hash)
    }

    /// A view over the blocks from genesis to tip.
    pub fn blocks(self: &Arc<Self>) -> Range<Chain> {
        Range::new(Arc::clone(self))
    }
}

impl Sequence for Chain {
    type Item = Arc<Block>;

    fn len(&self) -> usize {
        self.blocks.len()
    }

    fn item(&self, index: usize) -> Self::Item {
        Arc::clone(&self.blocks[index])
    }
}
