// This is the ledger itself: an in-memory, append-only list of sealed blocks
// plus the cached chain hash. Corruption and repair live here too so the
// tamper-detection story can be exercised end to end.

use crate::core::{Block, MiningBudget, ProofOfWork};
use crate::error::{LedgerError, Result};
use crate::utils::current_timestamp;
use log::{info, warn};
use serde::{Deserialize, Serialize};

// The ledger owns its blocks; nothing outside this module can reorder them
#[derive(Debug, Clone)]
pub struct Ledger {
    blocks: Vec<Block>, // Never empty: the genesis block is mined in `new`
    chain_hash: String, // Hash of the most recently sealed block
}

/// Serialized form of the whole ledger (`option 3`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerView {
    pub entries: Vec<Block>,
    pub chain_hash: String,
}

impl Ledger {
    // A fresh ledger always starts with a mined genesis block
    pub fn new(genesis_difficulty: u32) -> Result<Ledger> {
        info!("Mining genesis block with difficulty {genesis_difficulty}");
        let (genesis, chain_hash) = Block::generate_genesis_block(genesis_difficulty)?;
        info!("Genesis block sealed: {chain_hash}");

        Ok(Ledger {
            blocks: vec![genesis],
            chain_hash,
        })
    }

    pub fn get_chain_size(&self) -> usize {
        self.blocks.len()
    }

    pub fn get_chain_hash(&self) -> &str {
        self.chain_hash.as_str()
    }

    pub fn get_latest_block(&self) -> &Block {
        // `blocks` is never empty, the genesis block is always present
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn get_block(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    // When I want to add a transaction: mine it first, commit only on success
    pub fn append(&mut self, payload: &str, difficulty: u32) -> Result<&Block> {
        self.append_with(payload, difficulty, &MiningBudget::unbounded())
    }

    pub fn append_with(
        &mut self,
        payload: &str,
        difficulty: u32,
        budget: &MiningBudget,
    ) -> Result<&Block> {
        let index = self.blocks.len() as u64;
        let mut block = Block::new(index, current_timestamp(), payload, difficulty)?;
        block.set_previous_hash(self.get_latest_block().calculate_hash());

        info!("Starting proof-of-work for block {index} with difficulty {difficulty}");
        let hash = ProofOfWork::new_proof_of_work(&mut block).run_with(budget)?;
        info!("Proof-of-work completed for block {index}: {hash}");

        self.blocks.push(block);
        self.chain_hash = hash;
        Ok(self.get_latest_block())
    }

    /// Chain validity.
    ///
    /// A single-block chain must be sealed and match the cached chain hash.
    /// Longer chains check every adjacent pair for the hash pointer and both
    /// seals; the cached chain hash is not consulted on that path.
    pub fn is_valid(&self) -> bool {
        self.first_invalid_block().is_none()
    }

    /// Index at which validation fails, if any
    pub fn first_invalid_block(&self) -> Option<u64> {
        if self.blocks.len() == 1 {
            let genesis = &self.blocks[0];
            let hash = genesis.calculate_hash();
            let sealed = ProofOfWork::meets_target(&hash, genesis.get_difficulty());
            return if sealed && hash == self.chain_hash {
                None
            } else {
                Some(genesis.get_index())
            };
        }

        for pair in self.blocks.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            let prev_hash = prev.calculate_hash();
            if curr.get_previous_hash() != prev_hash {
                return Some(curr.get_index());
            }
            if !ProofOfWork::meets_target(&prev_hash, prev.get_difficulty()) {
                return Some(prev.get_index());
            }
            if !curr.is_sealed() {
                return Some(curr.get_index());
            }
        }
        None
    }

    /// Overwrite a block's payload in place without re-mining
    pub fn corrupt(&mut self, index: u64, new_payload: &str) -> Result<()> {
        let size = self.blocks.len();
        let block = usize::try_from(index)
            .ok()
            .and_then(|i| self.blocks.get_mut(i))
            .ok_or(LedgerError::BlockIndexOutOfRange { index, size })?;

        warn!("Corrupting block {index}: payload now {new_payload:?}");
        block.set_payload(new_payload);
        Ok(())
    }

    pub fn repair(&mut self) -> Result<usize> {
        self.repair_with(&MiningBudget::unbounded())
    }

    /// Single forward pass: every block that is not sealed under its own
    /// difficulty is re-mined from its current nonce, and the new hash is
    /// written into the successor's pointer (or the chain hash for the tail).
    /// Sealed blocks are left alone even if their successor's pointer is
    /// stale. Returns how many blocks were re-mined.
    pub fn repair_with(&mut self, budget: &MiningBudget) -> Result<usize> {
        let mut remined = 0;
        for i in 0..self.blocks.len() {
            if self.blocks[i].is_sealed() {
                continue;
            }

            let mut candidate = self.blocks[i].clone();
            let new_hash = ProofOfWork::new_proof_of_work(&mut candidate).run_with(budget)?;
            info!(
                "Re-mined block {i}: nonce {} -> {}",
                self.blocks[i].get_nonce(),
                candidate.get_nonce()
            );
            self.blocks[i] = candidate;
            remined += 1;

            match self.blocks.get_mut(i + 1) {
                Some(next) => next.set_previous_hash(new_hash),
                None => self.chain_hash = new_hash,
            }
        }
        Ok(remined)
    }

    pub fn to_view(&self) -> LedgerView {
        LedgerView {
            entries: self.blocks.clone(),
            chain_hash: self.chain_hash.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_view())?)
    }

    #[cfg(test)]
    pub(crate) fn block_mut(&mut self, index: usize) -> &mut Block {
        &mut self.blocks[index]
    }
}
