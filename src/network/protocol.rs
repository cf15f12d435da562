//! Wire messages exchanged between the ledger server and its clients.
//!
//! Each direction carries a stream of JSON objects over one TCP connection:
//! clients send [`CommandEnvelope`]s, the server answers with [`Response`]s.

use crate::auth::{sign, signing_message};
use crate::error::{LedgerError, Result};
use crate::utils::serialization::decimal;
use crate::wallet::KeyPair;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

pub const OPTION_STATUS: u8 = 0;
pub const OPTION_APPEND: u8 = 1;
pub const OPTION_VALIDATE: u8 = 2;
pub const OPTION_VIEW: u8 = 3;
pub const OPTION_CORRUPT: u8 = 4;
pub const OPTION_REPAIR: u8 = 5;
pub const OPTION_EXIT: u8 = 6;

/// Signed request. Big integers travel as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEnvelope {
    pub identity: String,
    #[serde(with = "decimal")]
    pub public_key_e: BigUint,
    #[serde(with = "decimal")]
    pub public_key_n: BigUint,
    pub option: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_payload: Option<String>,
    pub signature: String,
}

/// A ledger command, decoded from an authenticated envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Append { difficulty: u32, payload: String },
    Validate,
    View,
    Corrupt { block_index: u64, new_payload: String },
    Repair,
    Exit,
}

/// Reply to one command: exactly one of `result` or `error` is set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Command {
    pub fn option(&self) -> u8 {
        match self {
            Command::Status => OPTION_STATUS,
            Command::Append { .. } => OPTION_APPEND,
            Command::Validate => OPTION_VALIDATE,
            Command::View => OPTION_VIEW,
            Command::Corrupt { .. } => OPTION_CORRUPT,
            Command::Repair => OPTION_REPAIR,
            Command::Exit => OPTION_EXIT,
        }
    }
}

impl TryFrom<&CommandEnvelope> for Command {
    type Error = LedgerError;

    fn try_from(envelope: &CommandEnvelope) -> Result<Command> {
        let command = match envelope.option {
            OPTION_STATUS => Command::Status,
            OPTION_APPEND => Command::Append {
                difficulty: envelope
                    .difficulty
                    .ok_or_else(|| missing_field("difficulty", envelope.option))?,
                payload: envelope
                    .payload
                    .clone()
                    .ok_or_else(|| missing_field("payload", envelope.option))?,
            },
            OPTION_VALIDATE => Command::Validate,
            OPTION_VIEW => Command::View,
            OPTION_CORRUPT => Command::Corrupt {
                block_index: envelope
                    .block_index
                    .ok_or_else(|| missing_field("blockIndex", envelope.option))?,
                new_payload: envelope
                    .new_payload
                    .clone()
                    .ok_or_else(|| missing_field("newPayload", envelope.option))?,
            },
            OPTION_REPAIR => Command::Repair,
            OPTION_EXIT => Command::Exit,
            other => return Err(LedgerError::UnknownOption(other)),
        };
        Ok(command)
    }
}

fn missing_field(field: &str, option: u8) -> LedgerError {
    LedgerError::MalformedCommand(format!("option {option} requires {field}"))
}

impl CommandEnvelope {
    /// Build and sign the envelope for `command` with `keys`
    pub fn signed(keys: &KeyPair, command: &Command) -> Result<CommandEnvelope> {
        let mut envelope = CommandEnvelope {
            identity: keys.identity(),
            public_key_e: keys.get_e().clone(),
            public_key_n: keys.get_n().clone(),
            option: command.option(),
            difficulty: None,
            payload: None,
            block_index: None,
            new_payload: None,
            signature: String::new(),
        };
        match command {
            Command::Append {
                difficulty,
                payload,
            } => {
                envelope.difficulty = Some(*difficulty);
                envelope.payload = Some(payload.clone());
            }
            Command::Corrupt {
                block_index,
                new_payload,
            } => {
                envelope.block_index = Some(*block_index);
                envelope.new_payload = Some(new_payload.clone());
            }
            _ => {}
        }

        let message = signing_message(
            &envelope.identity,
            &keys.public_key_text(),
            envelope.option,
            &envelope.signed_fields(),
        );
        envelope.signature = sign(&message, keys.get_d(), keys.get_n())?;
        Ok(envelope)
    }

    /// Option-specific fields covered by the signature, in signing order.
    /// Absent fields sign as empty text.
    pub fn signed_fields(&self) -> Vec<String> {
        match self.option {
            OPTION_APPEND => vec![
                self.difficulty.map(|d| d.to_string()).unwrap_or_default(),
                self.payload.clone().unwrap_or_default(),
            ],
            OPTION_CORRUPT => vec![
                self.block_index.map(|i| i.to_string()).unwrap_or_default(),
                self.new_payload.clone().unwrap_or_default(),
            ],
            _ => Vec::new(),
        }
    }
}

impl Response {
    pub fn success(result: String) -> Response {
        Response {
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: &LedgerError) -> Response {
        Response {
            result: None,
            error: Some(error.to_string()),
        }
    }

    pub fn into_result(self) -> Result<String> {
        match (self.result, self.error) {
            (_, Some(error)) => Err(LedgerError::Rejected(error)),
            (Some(result), None) => Ok(result),
            (None, None) => Err(LedgerError::Serialization(
                "Response carries neither result nor error".to_string(),
            )),
        }
    }
}
