//! Proof-of-work nonce search.
//!
//! The search is strictly sequential. Bounds are optional: with the default
//! [`MiningConfig`] the loop runs until a matching hash turns up, exactly like
//! an unbounded miner. An attempt cap, a wall-clock timeout and a cancel flag
//! can each stop it early; the latter two are polled every `check_interval`
//! attempts so the hot loop stays cheap.

use crate::blockchain::Block;
use crate::error::{AbortReason, ChainError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningConfig {
    pub max_attempts: Option<u64>,
    pub timeout: Option<Duration>,
    pub check_interval: u64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            timeout: None,
            check_interval: 10_000,
        }
    }
}

impl MiningConfig {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_check_interval(mut self, check_interval: u64) -> Self {
        self.check_interval = check_interval;
        self
    }
}

/// Increment `block.nonce` until its hash starts with `difficulty` zero hex
/// characters. The current nonce is tried first, so a block that already
/// satisfies the target is returned untouched.
pub fn mine_block(
    mut block: Block,
    difficulty: usize,
    config: &MiningConfig,
    cancel: Option<&AtomicBool>,
) -> Result<Block> {
    let started = Instant::now();
    let interval = config.check_interval.max(1);
    let mut attempts: u64 = 0;

    while !block.meets_difficulty(difficulty) {
        if config.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(aborted(attempts, AbortReason::AttemptLimit));
        }

        if attempts % interval == 0 {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(aborted(attempts, AbortReason::Cancelled));
            }
            if config.timeout.is_some_and(|limit| started.elapsed() >= limit) {
                return Err(aborted(attempts, AbortReason::Timeout));
            }
            if attempts > 0 {
                debug!(index = block.index, attempts, nonce = block.nonce, "still mining");
            }
        }

        block.nonce = block
            .nonce
            .checked_add(1)
            .ok_or_else(|| aborted(attempts, AbortReason::NonceExhausted))?;
        block.rehash();
        attempts += 1;
    }

    debug!(
        index = block.index,
        attempts,
        nonce = block.nonce,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "found proof-of-work"
    );
    Ok(block)
}

fn aborted(attempts: u64, reason: AbortReason) -> ChainError {
    ChainError::MiningAborted { attempts, reason }
}
