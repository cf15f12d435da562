use crate::core::ProofOfWork;
use crate::error::{LedgerError, Result};
use crate::utils::serialization::timestamp_format;
use crate::utils::{current_timestamp, sha256_hex_upper, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A SHA-256 hex digest has 64 characters, so no seal can ask for more zeros.
pub const MAX_DIFFICULTY: u32 = 64;

const GENESIS_PAYLOAD: &str = "Genesis";

/// One ledger entry. Serializes to the `entries` shape of the ledger view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    index: u64,
    #[serde(with = "timestamp_format")]
    created_at: NaiveDateTime,
    payload: String,
    previous_hash: String,
    nonce: u64,
    difficulty: u32,
}

impl Block {
    /// Build an unmined block with an empty hash pointer and nonce 0
    pub fn new(
        index: u64,
        created_at: NaiveDateTime,
        payload: &str,
        difficulty: u32,
    ) -> Result<Block> {
        if difficulty == 0 || difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::InvalidDifficulty(difficulty));
        }

        Ok(Block {
            index,
            created_at,
            payload: payload.to_string(),
            previous_hash: String::new(),
            nonce: 0,
            difficulty,
        })
    }

    /// Mined genesis block for a fresh ledger
    pub fn generate_genesis_block(difficulty: u32) -> Result<(Block, String)> {
        let mut block = Block::new(0, current_timestamp(), GENESIS_PAYLOAD, difficulty)?;
        let hash = ProofOfWork::new_proof_of_work(&mut block).run()?;
        Ok((block, hash))
    }

    /// The exact text that gets hashed. Field order and the timestamp format
    /// must stay fixed or independently written peers stop agreeing.
    pub fn canonical_form(&self) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.index,
            self.created_at.format(TIMESTAMP_FORMAT),
            self.payload,
            self.previous_hash,
            self.nonce,
            self.difficulty
        )
        .to_uppercase()
    }

    pub fn calculate_hash(&self) -> String {
        sha256_hex_upper(&self.canonical_form())
    }

    /// True when the first `difficulty` hex digits of the hash are all zero
    pub fn is_sealed(&self) -> bool {
        ProofOfWork::validate(self)
    }

    pub fn get_index(&self) -> u64 {
        self.index
    }

    pub fn get_created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn get_payload(&self) -> &str {
        self.payload.as_str()
    }

    pub fn get_previous_hash(&self) -> &str {
        self.previous_hash.as_str()
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_difficulty(&self) -> u32 {
        self.difficulty
    }

    pub(crate) fn set_previous_hash(&mut self, previous_hash: String) {
        self.previous_hash = previous_hash;
    }

    pub(crate) fn set_payload(&mut self, payload: &str) {
        self.payload = payload.to_string();
    }

    /// Advance the nonce by one. The nonce never wraps back to zero.
    pub(crate) fn increment_nonce(&mut self) -> Result<()> {
        self.nonce = self
            .nonce
            .checked_add(1)
            .ok_or(LedgerError::NonceExhausted(self.index))?;
        Ok(())
    }
}
