//! Core ledger functionality
//!
//! This module contains the fundamental ledger components: blocks, the
//! proof-of-work miner, and the ledger with its validate and repair passes.

pub mod block;
pub mod blockchain;
pub mod proof_of_work;

pub use block::{Block, MAX_DIFFICULTY};
pub use blockchain::{Ledger, LedgerView};
pub use proof_of_work::{estimate_hash_rate, MiningBudget, ProofOfWork};
