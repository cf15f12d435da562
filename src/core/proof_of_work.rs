use crate::core::Block;
use crate::error::{LedgerError, Result};
use crate::utils::sha256_hex_upper;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};

// How many hashes run between budget checks
const BUDGET_CHECK_INTERVAL: u64 = 1024;

const HASH_RATE_SAMPLE: &str = "00000000";

/// Brute-force nonce search over a borrowed block.
///
/// The search always continues from the block's current nonce, so a block
/// that was partially searched before picks up where it stopped.
pub struct ProofOfWork<'a> {
    block: &'a mut Block,
    difficulty: u32,
}

/// Limits on a mining search: a shared cancel flag and an optional deadline.
///
/// Clones share the same flag, so any clone can cancel the search.
#[derive(Debug, Clone, Default)]
pub struct MiningBudget {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl MiningBudget {
    pub fn unbounded() -> MiningBudget {
        MiningBudget::default()
    }

    pub fn with_deadline(timeout: Duration) -> MiningBudget {
        MiningBudget {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Deadline when `timeout` is set, unbounded otherwise
    pub fn from_timeout(timeout: Option<Duration>) -> MiningBudget {
        match timeout {
            Some(timeout) => MiningBudget::with_deadline(timeout),
            None => MiningBudget::unbounded(),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_exhausted(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

impl<'a> ProofOfWork<'a> {
    pub fn new_proof_of_work(block: &'a mut Block) -> ProofOfWork<'a> {
        let difficulty = block.get_difficulty();
        ProofOfWork { block, difficulty }
    }

    /// Check a block's seal against its own difficulty
    pub fn validate(block: &Block) -> bool {
        Self::meets_target(&block.calculate_hash(), block.get_difficulty())
    }

    pub fn meets_target(hash: &str, difficulty: u32) -> bool {
        let difficulty = difficulty as usize;
        hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
    }

    /// Search until sealed. Unbounded: occupies the calling thread until a
    /// seal is found. A block that is already sealed is returned unchanged.
    pub fn run(&mut self) -> Result<String> {
        let hash = self.run_with(&MiningBudget::unbounded())?;
        debug!(
            "Sealed block {} at nonce {}: {hash}",
            self.block.get_index(),
            self.block.get_nonce()
        );
        Ok(hash)
    }

    /// Same search as `run`, abandoned once the budget is exhausted
    pub fn run_with(&mut self, budget: &MiningBudget) -> Result<String> {
        let mut hash = self.block.calculate_hash();
        let mut attempts: u64 = 0;
        while !Self::meets_target(&hash, self.difficulty) {
            attempts += 1;
            if attempts % BUDGET_CHECK_INTERVAL == 0 && budget.is_exhausted() {
                debug!(
                    "Mining of block {} abandoned after {attempts} hashes",
                    self.block.get_index()
                );
                return Err(LedgerError::MiningCancelled);
            }
            self.block.increment_nonce()?;
            hash = self.block.calculate_hash();
        }
        Ok(hash)
    }
}

/// Hash a fixed string for `window` and report hashes per second
pub fn estimate_hash_rate(window: Duration) -> u64 {
    let start = Instant::now();
    let mut count: u64 = 0;
    while start.elapsed() <= window {
        black_box(sha256_hex_upper(black_box(HASH_RATE_SAMPLE)));
        count += 1;
    }
    let elapsed = start.elapsed().as_secs_f64();
    if elapsed == 0.0 {
        return count;
    }
    (count as f64 / elapsed) as u64
}
