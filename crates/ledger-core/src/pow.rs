use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::error::{LedgerError, Result};
use crate::Block;

/// How many nonces to try between cancellation and deadline checks.
const CHECK_INTERVAL: u64 = 1024;

/// Bounds on the nonce search. `Default` is unbounded, matching the
/// reference behavior where a small fixed difficulty always terminates.
#[derive(Clone, Debug, Default)]
pub struct MineBudget {
    /// Give up after this many nonce attempts.
    pub max_iterations: Option<u64>,
    /// Give up once the search has run this long.
    pub max_duration: Option<Duration>,
}

impl MineBudget {
    pub const UNBOUNDED: MineBudget = MineBudget {
        max_iterations: None,
        max_duration: None,
    };

    pub fn iterations(max: u64) -> Self {
        Self {
            max_iterations: Some(max),
            max_duration: None,
        }
    }
}

/// Cooperative cancellation handle for an in-flight nonce search. Cloning
/// shares the flag, so any holder can cancel a search started elsewhere.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Brute-force nonce search: starting from zero, increment until the header
/// digest rendered as lowercase hex begins with `difficulty` `'0'`
/// characters. Deterministic for fixed header fields, so re-mining the same
/// candidate always reproduces the same nonce and hash.
///
/// Returns `MiningTimeout` when the budget is exhausted and
/// `MiningCancelled` when the token fires; in both cases no partial result
/// is produced.
pub fn mine_block(
    mut block: Block,
    difficulty: u32,
    budget: &MineBudget,
    cancel: &CancelToken,
) -> Result<Block> {
    let target = "0".repeat(difficulty as usize);
    let started = Instant::now();
    info!(index = block.index, difficulty, "mining block");

    let mut nonce: u64 = 0;
    loop {
        if nonce % CHECK_INTERVAL == 0 {
            if cancel.is_cancelled() {
                return Err(LedgerError::MiningCancelled);
            }
            if let Some(limit) = budget.max_duration {
                if started.elapsed() >= limit {
                    return Err(LedgerError::MiningTimeout);
                }
            }
        }
        if let Some(max) = budget.max_iterations {
            if nonce >= max {
                return Err(LedgerError::MiningTimeout);
            }
        }

        block.nonce = nonce;
        let hash = block.header_hash();
        if hash.starts_with(&target) {
            info!(
                index = block.index,
                nonce,
                hash,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "block mined"
            );
            block.hash = hash;
            return Ok(block);
        }
        nonce += 1;
    }
}
