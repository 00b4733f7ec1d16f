use std::fmt;
use tracing::debug;

use super::chain::Blockchain;

/// A single inconsistency found while walking the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainFault {
    /// Stored hash differs from the hash of the block's current fields.
    HashMismatch { index: u64, stored: String, computed: String },
    /// `previous_hash` does not match the predecessor's stored hash.
    BrokenLink { index: u64, expected: String, found: String },
    /// Block sits at `index` but claims a different position.
    IndexMismatch { index: u64, found: u64 },
    /// Hash lacks the leading zeros the chain difficulty demands.
    InsufficientWork { index: u64, difficulty: usize },
}

impl ChainFault {
    pub fn index(&self) -> u64 {
        match self {
            ChainFault::HashMismatch { index, .. }
            | ChainFault::BrokenLink { index, .. }
            | ChainFault::IndexMismatch { index, .. }
            | ChainFault::InsufficientWork { index, .. } => *index,
        }
    }

    /// Hash and link faults are the ones that make a chain invalid.
    pub fn breaks_integrity(&self) -> bool {
        matches!(self, ChainFault::HashMismatch { .. } | ChainFault::BrokenLink { .. })
    }
}

impl fmt::Display for ChainFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainFault::HashMismatch { index, stored, computed } => {
                write!(f, "Block #{}: stored hash {} but content hashes to {}", index, stored, computed)
            }
            ChainFault::BrokenLink { index, expected, found } => {
                write!(f, "Block #{}: previous hash {} does not match predecessor {}", index, found, expected)
            }
            ChainFault::IndexMismatch { index, found } => {
                write!(f, "Block at position {} carries index {}", index, found)
            }
            ChainFault::InsufficientWork { index, difficulty } => {
                write!(f, "Block #{}: hash lacks {} leading zeros", index, difficulty)
            }
        }
    }
}

impl Blockchain {
    /// Every stored hash matches its content and every block after genesis
    /// points at its predecessor's stored hash. An empty chain is valid.
    pub fn is_chain_valid(&self) -> bool {
        for (i, block) in self.blocks.iter().enumerate() {
            if !block.is_hash_consistent() {
                debug!(index = block.index, "stored hash does not match block content");
                return false;
            }
            if i > 0 && block.previous_hash != self.blocks[i - 1].hash {
                debug!(index = block.index, "block does not link to its predecessor");
                return false;
            }
        }
        true
    }

    /// Walk the whole chain and report every fault found, in block order.
    pub fn audit(&self) -> Vec<ChainFault> {
        let mut faults = Vec::new();

        for (i, block) in self.blocks.iter().enumerate() {
            let position = i as u64;

            if block.index != position {
                faults.push(ChainFault::IndexMismatch { index: position, found: block.index });
            }

            let computed = block.calculate_hash();
            if computed != block.hash {
                faults.push(ChainFault::HashMismatch {
                    index: position,
                    stored: block.hash.clone(),
                    computed,
                });
            }

            if i == 0 {
                continue;
            }

            let expected = &self.blocks[i - 1].hash;
            if &block.previous_hash != expected {
                faults.push(ChainFault::BrokenLink {
                    index: position,
                    expected: expected.clone(),
                    found: block.previous_hash.clone(),
                });
            }

            if !block.meets_difficulty(self.difficulty()) {
                faults.push(ChainFault::InsufficientWork { index: position, difficulty: self.difficulty() });
            }
        }

        faults
    }
}
