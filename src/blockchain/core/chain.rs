use crate::config::Config;
use crate::error::{ChainError, Result};
use crate::miner::{self, MiningConfig};
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};

use super::block::{timestamp_now, Block, GENESIS_PREVIOUS_HASH};

/// Longest zero prefix a lowercase hex SHA-256 digest can carry.
pub const MAX_DIFFICULTY: usize = 64;
pub const DEFAULT_DIFFICULTY: usize = 4;
pub const GENESIS_DATA: &str = "Genesis Block";

#[derive(Debug, Clone)]
pub struct Blockchain {
    pub(crate) blocks: Vec<Block>,
    difficulty: usize,
    mining: MiningConfig,
    genesis_data: String,
}

impl Blockchain {
    /// Create an empty chain. The genesis block is added separately.
    pub fn new(difficulty: usize) -> Result<Self> {
        Self::with_mining_config(difficulty, MiningConfig::default())
    }

    pub fn with_mining_config(difficulty: usize, mining: MiningConfig) -> Result<Self> {
        if difficulty > MAX_DIFFICULTY {
            return Err(ChainError::InvalidDifficulty(difficulty));
        }
        Ok(Blockchain {
            blocks: Vec::new(),
            difficulty,
            mining,
            genesis_data: GENESIS_DATA.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let mut chain = Self::with_mining_config(config.chain.difficulty, config.miner.to_mining_config()?)?;
        chain.genesis_data = config.chain.genesis_data.clone();
        Ok(chain)
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn mining_config(&self) -> &MiningConfig {
        &self.mining
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get_block(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    pub fn get_latest_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    fn tail(&self) -> Result<&Block> {
        self.get_latest_block().ok_or(ChainError::NotInitialized)
    }

    /// Append the genesis block. Only valid on an empty chain.
    pub fn create_genesis_block(&mut self) -> Result<&Block> {
        if !self.blocks.is_empty() {
            return Err(ChainError::AlreadyInitialized);
        }
        let genesis = Block::new(0, timestamp_now(), self.genesis_data.clone(), GENESIS_PREVIOUS_HASH);
        info!(hash = %genesis.hash, "created genesis block");
        self.blocks.push(genesis);
        Ok(&self.blocks[0])
    }

    /// Build the next block, already linked to the current tail, ready for mining.
    pub fn build_candidate_block(&self, data: &str) -> Result<Block> {
        let tail = self.tail()?;
        ensure_data(data)?;
        Ok(Block::new(
            self.blocks.len() as u64,
            timestamp_now(),
            data,
            tail.hash.clone(),
        ))
    }

    /// Search for a nonce satisfying the chain difficulty, within the configured bounds.
    pub fn mine_block(&self, block: Block) -> Result<Block> {
        self.tail()?;
        miner::mine_block(block, self.difficulty, &self.mining, None)
    }

    /// Like [`mine_block`](Self::mine_block) but also stops once `cancel` is set.
    pub fn mine_block_with_cancel(&self, block: Block, cancel: &AtomicBool) -> Result<Block> {
        self.tail()?;
        miner::mine_block(block, self.difficulty, &self.mining, Some(cancel))
    }

    /// Link `new_block` to the current tail and append it.
    ///
    /// The block is stamped with the next index and the tail's hash, which
    /// changes the hash the nonce was found for. When the linked block falls
    /// short of the difficulty target it is mined again before being
    /// appended, so every appended block carries valid work.
    pub fn add_block(&mut self, new_block: Block) -> Result<&Block> {
        self.link_and_append(new_block, None)
    }

    /// Like [`add_block`](Self::add_block) but a re-mine also stops once `cancel` is set.
    pub fn add_block_with_cancel(&mut self, new_block: Block, cancel: &AtomicBool) -> Result<&Block> {
        self.link_and_append(new_block, Some(cancel))
    }

    fn link_and_append(&mut self, mut new_block: Block, cancel: Option<&AtomicBool>) -> Result<&Block> {
        let tail_hash = self.tail()?.hash.clone();
        ensure_data(&new_block.data)?;

        let position = self.blocks.len();
        new_block.index = position as u64;
        new_block.previous_hash = tail_hash;
        new_block.rehash();
        if !new_block.meets_difficulty(self.difficulty) {
            warn!(
                index = new_block.index,
                "block misses the difficulty target once linked, mining again"
            );
            new_block = miner::mine_block(new_block, self.difficulty, &self.mining, cancel)?;
        }

        info!(index = new_block.index, nonce = new_block.nonce, hash = %new_block.hash, "appended block");
        self.blocks.push(new_block);
        Ok(&self.blocks[position])
    }

    /// Convenience for the usual build → mine → append sequence.
    pub fn mine_and_append(&mut self, data: &str) -> Result<&Block> {
        let candidate = self.build_candidate_block(data)?;
        let mined = self.mine_block(candidate)?;
        self.add_block(mined)
    }

    /// Overwrite a stored block's data in place and recompute its hash.
    ///
    /// Successors keep their old `previous_hash`, so the chain stops
    /// validating. Returns the data that was replaced.
    pub fn tamper_block(&mut self, index: u64, new_data: &str) -> Result<String> {
        if self.blocks.is_empty() {
            return Err(ChainError::NotInitialized);
        }
        ensure_data(new_data)?;
        let block = usize::try_from(index)
            .ok()
            .and_then(|i| self.blocks.get_mut(i))
            .ok_or(ChainError::BlockNotFound(index))?;

        let old_data = std::mem::replace(&mut block.data, new_data.to_string());
        block.rehash();
        warn!(index, old = %old_data, new = %new_data, "block data tampered");
        Ok(old_data)
    }

    /// Pretty JSON array of every block with all fields.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.blocks)?)
    }
}

fn ensure_data(data: &str) -> Result<()> {
    if data.is_empty() {
        return Err(ChainError::EmptyData);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AbortReason;

    fn initialized(difficulty: usize) -> Blockchain {
        let mut chain = Blockchain::new(difficulty).unwrap();
        chain.create_genesis_block().unwrap();
        chain
    }

    #[test]
    fn test_new_chain_is_empty() {
        let chain = Blockchain::new(4).unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.difficulty(), 4);
        assert!(chain.get_latest_block().is_none());
    }

    #[test]
    fn test_rejects_impossible_difficulty() {
        assert_eq!(Blockchain::new(65).unwrap_err(), ChainError::InvalidDifficulty(65));
        assert!(Blockchain::new(MAX_DIFFICULTY).is_ok());
    }

    #[test]
    fn test_genesis_block() {
        let mut chain = Blockchain::new(4).unwrap();
        let genesis = chain.create_genesis_block().unwrap().clone();

        assert_eq!(chain.len(), 1);
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, "0");
        assert_eq!(genesis.data, GENESIS_DATA);
        assert_eq!(genesis.nonce, 0);
        assert!(genesis.is_hash_consistent());
        assert_eq!(chain.get_latest_block(), Some(&genesis));
    }

    #[test]
    fn test_genesis_twice_is_rejected() {
        let mut chain = initialized(1);
        assert_eq!(chain.create_genesis_block().unwrap_err(), ChainError::AlreadyInitialized);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_operations_before_genesis() {
        let mut chain = Blockchain::new(1).unwrap();
        let orphan = Block::new(1, timestamp_now(), "A", "0");

        assert_eq!(chain.build_candidate_block("A").unwrap_err(), ChainError::NotInitialized);
        assert_eq!(chain.mine_block(orphan.clone()).unwrap_err(), ChainError::NotInitialized);
        assert_eq!(chain.add_block(orphan).unwrap_err(), ChainError::NotInitialized);
        assert_eq!(chain.tamper_block(0, "X").unwrap_err(), ChainError::NotInitialized);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_candidate_links_to_tail() {
        let chain = initialized(1);
        let candidate = chain.build_candidate_block("payload").unwrap();
        assert_eq!(candidate.index, 1);
        assert_eq!(candidate.previous_hash, chain.blocks()[0].hash);
        assert_eq!(candidate.nonce, 0);
        assert!(candidate.is_hash_consistent());
    }

    #[test]
    fn test_empty_data_is_rejected() {
        let mut chain = initialized(1);
        assert_eq!(chain.build_candidate_block("").unwrap_err(), ChainError::EmptyData);
        assert_eq!(chain.tamper_block(0, "").unwrap_err(), ChainError::EmptyData);

        let blank = Block::new(1, timestamp_now(), "", chain.blocks()[0].hash.clone());
        assert_eq!(chain.add_block(blank).unwrap_err(), ChainError::EmptyData);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_whitespace_data_is_a_payload() {
        let mut chain = initialized(1);
        let candidate = chain.build_candidate_block("   ").unwrap();
        let mined = chain.mine_block(candidate).unwrap();
        assert_eq!(chain.add_block(mined).unwrap().data, "   ");
    }

    #[test]
    fn test_sibling_candidates_get_sequential_indices() {
        let mut chain = initialized(1);
        let first = chain.build_candidate_block("A").unwrap();
        let second = chain.build_candidate_block("B").unwrap();
        assert_eq!(first.index, second.index);

        let first = chain.mine_block(first).unwrap();
        let second = chain.mine_block(second).unwrap();
        chain.add_block(first).unwrap();
        let appended = chain.add_block(second).unwrap().clone();

        assert_eq!(appended.index, 2);
        assert_eq!(appended.previous_hash, chain.blocks()[1].hash);
        assert!(appended.meets_difficulty(1));
        let indices: Vec<u64> = chain.blocks().iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert!(chain.is_chain_valid());
        assert!(chain.audit().is_empty());
    }

    #[test]
    fn test_mined_block_meets_difficulty() {
        let chain = initialized(2);
        let candidate = chain.build_candidate_block("A").unwrap();
        let mined = chain.mine_block(candidate).unwrap();
        assert!(mined.hash.starts_with("00"));
        assert!(mined.is_hash_consistent());
    }

    #[test]
    fn test_add_block_appends_linked_block() {
        let mut chain = initialized(2);
        let first = chain.mine_and_append("A").unwrap().clone();
        let second = chain.mine_and_append("B").unwrap().clone();

        assert_eq!(chain.len(), 3);
        assert_eq!(first.index, 1);
        assert_eq!(second.index, 2);
        assert_eq!(first.previous_hash, chain.blocks()[0].hash);
        assert_eq!(second.previous_hash, first.hash);
        assert!(second.meets_difficulty(2));
    }

    #[test]
    fn test_add_block_restamps_and_remines_stale_link() {
        let mut chain = initialized(2);
        let stale = Block::new(1, timestamp_now(), "A", "not-the-tail");
        let mined = chain.mine_block(stale).unwrap();

        let appended = chain.add_block(mined).unwrap().clone();
        assert_eq!(appended.previous_hash, chain.blocks()[0].hash);
        assert!(appended.is_hash_consistent());
        assert!(appended.meets_difficulty(2));
    }

    #[test]
    fn test_add_block_remine_respects_bounds() {
        let mining = MiningConfig::default().with_max_attempts(0);
        let mut chain = Blockchain::with_mining_config(64, mining).unwrap();
        chain.create_genesis_block().unwrap();

        let stale = Block::new(1, timestamp_now(), "A", "elsewhere");
        let err = chain.add_block(stale).unwrap_err();
        assert_eq!(
            err,
            ChainError::MiningAborted { attempts: 0, reason: AbortReason::AttemptLimit }
        );
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_add_block_remine_can_be_cancelled() {
        let mut chain = initialized(64);
        let stale = Block::new(1, timestamp_now(), "A", "elsewhere");
        let cancel = AtomicBool::new(true);

        let err = chain.add_block_with_cancel(stale, &cancel).unwrap_err();
        assert_eq!(
            err,
            ChainError::MiningAborted { attempts: 0, reason: AbortReason::Cancelled }
        );
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_mine_with_cancel() {
        let mut chain = initialized(64);
        let candidate = chain.build_candidate_block("A").unwrap();
        let cancel = AtomicBool::new(true);
        let err = chain.mine_block_with_cancel(candidate, &cancel).unwrap_err();
        assert!(matches!(err, ChainError::MiningAborted { reason: AbortReason::Cancelled, .. }));
    }

    #[test]
    fn test_tamper_block() {
        let mut chain = initialized(1);
        chain.mine_and_append("A").unwrap();
        let before = chain.blocks()[1].hash.clone();

        let old = chain.tamper_block(1, "X").unwrap();
        assert_eq!(old, "A");

        let tampered = &chain.blocks()[1];
        assert_eq!(tampered.data, "X");
        assert_ne!(tampered.hash, before);
        assert!(tampered.is_hash_consistent());
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_tamper_missing_block() {
        let mut chain = initialized(1);
        assert_eq!(chain.tamper_block(5, "X").unwrap_err(), ChainError::BlockNotFound(5));
    }

    #[test]
    fn test_from_config() {
        let config = Config::from_toml_str(
            "[chain]\ndifficulty = 1\ngenesis_data = \"Hello\"\n\n[miner]\nmax_attempts = 100000",
        )
        .unwrap();
        let mut chain = Blockchain::from_config(&config).unwrap();
        assert_eq!(chain.difficulty(), 1);
        assert_eq!(chain.mining_config().max_attempts, Some(100_000));
        assert_eq!(chain.create_genesis_block().unwrap().data, "Hello");
    }

    #[test]
    fn test_to_json_lists_all_fields() {
        let mut chain = initialized(0);
        chain.mine_and_append("A").unwrap();
        let json: serde_json::Value = serde_json::from_str(&chain.to_json().unwrap()).unwrap();
        let blocks = json.as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        for key in ["index", "timestamp", "data", "previous_hash", "nonce", "hash"] {
            assert!(blocks[1].get(key).is_some(), "missing {}", key);
        }
        assert_eq!(blocks[1]["data"], "A");
    }
}
