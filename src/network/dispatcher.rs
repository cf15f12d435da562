use crate::core::{estimate_hash_rate, Ledger, MiningBudget};
use crate::error::Result;
use crate::network::protocol::Command;
use log::info;
use std::time::{Duration, Instant};

/// What the session loop should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(String),
    Terminate,
}

/// Maps authenticated commands onto ledger operations.
///
/// The dispatcher holds no ledger state of its own; the server passes its
/// ledger in for every command.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    mining_timeout: Option<Duration>,
    hash_rate_window: Duration,
}

impl CommandDispatcher {
    pub fn new(mining_timeout: Option<Duration>, hash_rate_window: Duration) -> Self {
        Self {
            mining_timeout,
            hash_rate_window,
        }
    }

    pub fn dispatch(&self, ledger: &mut Ledger, command: Command) -> Result<Outcome> {
        info!("Dispatching option {}", command.option());
        let reply = match command {
            Command::Status => self.status(ledger),
            Command::Append {
                difficulty,
                payload,
            } => {
                let start = Instant::now();
                let budget = MiningBudget::from_timeout(self.mining_timeout);
                let index = ledger.append_with(&payload, difficulty, &budget)?.get_index();
                format!(
                    "Block {index} added.\nTotal execution time to add this block was {} milliseconds",
                    start.elapsed().as_millis()
                )
            }
            Command::Validate => {
                let start = Instant::now();
                let first_invalid = ledger.first_invalid_block();
                if let Some(index) = first_invalid {
                    info!("Chain verification failed at block {index}");
                }
                let valid = first_invalid.is_none();
                format!(
                    "Chain verification: {valid}\nTotal execution time required to verify the chain was {} milliseconds",
                    start.elapsed().as_millis()
                )
            }
            Command::View => ledger.to_json()?,
            Command::Corrupt {
                block_index,
                new_payload,
            } => {
                ledger.corrupt(block_index, &new_payload)?;
                format!("Block {block_index} now holds {new_payload}")
            }
            Command::Repair => {
                let start = Instant::now();
                let budget = MiningBudget::from_timeout(self.mining_timeout);
                let remined = ledger.repair_with(&budget)?;
                format!(
                    "Repaired {remined} block(s).\nTotal execution time required to repair the chain was {} milliseconds",
                    start.elapsed().as_millis()
                )
            }
            Command::Exit => return Ok(Outcome::Terminate),
        };
        Ok(Outcome::Reply(reply))
    }

    fn status(&self, ledger: &Ledger) -> String {
        let latest = ledger.get_latest_block();
        format!(
            "Current size of chain: {}\nCurrent hashes per second by this machine: {}\nDifficulty of most recent block: {}\nNonce for most recent block: {}\nChain hash: {}",
            ledger.get_chain_size(),
            estimate_hash_rate(self.hash_rate_window),
            latest.get_difficulty(),
            latest.get_nonce(),
            ledger.get_chain_hash()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LedgerView;
    use crate::error::LedgerError;

    fn dispatcher() -> CommandDispatcher {
        CommandDispatcher::new(None, Duration::from_millis(10))
    }

    fn reply(outcome: Outcome) -> String {
        match outcome {
            Outcome::Reply(text) => text,
            Outcome::Terminate => panic!("expected a reply"),
        }
    }

    #[test]
    fn test_status_reports_latest_block() {
        let mut ledger = Ledger::new(1).unwrap();
        let text = reply(dispatcher().dispatch(&mut ledger, Command::Status).unwrap());

        assert!(text.contains("Current size of chain: 1"));
        assert!(text.contains("Difficulty of most recent block: 1"));
        assert!(text.contains(&format!("Chain hash: {}", ledger.get_chain_hash())));
    }

    #[test]
    fn test_append_validate_view() {
        let mut ledger = Ledger::new(1).unwrap();
        let dispatcher = dispatcher();

        let append = Command::Append {
            difficulty: 2,
            payload: "A pays B 10".to_string(),
        };
        reply(dispatcher.dispatch(&mut ledger, append).unwrap());
        assert_eq!(ledger.get_chain_size(), 2);

        let text = reply(dispatcher.dispatch(&mut ledger, Command::Validate).unwrap());
        assert!(text.contains("Chain verification: true"));

        let json = reply(dispatcher.dispatch(&mut ledger, Command::View).unwrap());
        let view: LedgerView = serde_json::from_str(&json).unwrap();
        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[1].get_payload(), "A pays B 10");
    }

    #[test]
    fn test_validate_reports_broken_link() {
        let mut ledger = Ledger::new(1).unwrap();
        let dispatcher = dispatcher();
        ledger.append("A pays B 10", 1).unwrap();
        ledger.block_mut(1).set_previous_hash("BOGUS".to_string());

        let text = reply(dispatcher.dispatch(&mut ledger, Command::Validate).unwrap());
        assert!(text.starts_with("Chain verification: false\n"));
    }

    #[test]
    fn test_corrupt_then_repair() {
        let mut ledger = Ledger::new(1).unwrap();
        let dispatcher = dispatcher();
        ledger.append("A pays B 10", 2).unwrap();

        let corrupt = Command::Corrupt {
            block_index: 1,
            new_payload: "A pays B 10000".to_string(),
        };
        let text = reply(dispatcher.dispatch(&mut ledger, corrupt).unwrap());
        assert_eq!(text, "Block 1 now holds A pays B 10000");

        reply(dispatcher.dispatch(&mut ledger, Command::Repair).unwrap());
        assert!(ledger.is_valid());
    }

    #[test]
    fn test_rejections_leave_ledger_alone() {
        let mut ledger = Ledger::new(1).unwrap();
        let before = ledger.to_view();
        let dispatcher = dispatcher();

        let bad_index = Command::Corrupt {
            block_index: 5,
            new_payload: "x".to_string(),
        };
        assert!(matches!(
            dispatcher.dispatch(&mut ledger, bad_index),
            Err(LedgerError::BlockIndexOutOfRange { .. })
        ));

        let bad_difficulty = Command::Append {
            difficulty: 0,
            payload: "x".to_string(),
        };
        assert_eq!(
            dispatcher.dispatch(&mut ledger, bad_difficulty),
            Err(LedgerError::InvalidDifficulty(0))
        );
        assert_eq!(ledger.to_view(), before);
    }

    #[test]
    fn test_mining_timeout_cancels_append() {
        let mut ledger = Ledger::new(1).unwrap();
        let dispatcher = CommandDispatcher::new(Some(Duration::ZERO), Duration::from_millis(10));

        let append = Command::Append {
            difficulty: 40,
            payload: "unreachable".to_string(),
        };
        assert_eq!(
            dispatcher.dispatch(&mut ledger, append),
            Err(LedgerError::MiningCancelled)
        );
        assert_eq!(ledger.get_chain_size(), 1);
    }

    #[test]
    fn test_exit_terminates() {
        let mut ledger = Ledger::new(1).unwrap();
        assert_eq!(
            dispatcher().dispatch(&mut ledger, Command::Exit),
            Ok(Outcome::Terminate)
        );
    }
}
