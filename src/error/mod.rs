//! Error handling for the ledger
//!
//! This module provides the error type shared by the ledger, the
//! authentication layer and the network session loop.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error types for ledger, authentication and transport operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The claimed identity does not match the public key it came with
    IdentityMismatch,
    /// The signature does not verify against the claimed public key
    SignatureMismatch,
    /// An option code outside 0-6 (protocol violation, ends the session)
    UnknownOption(u8),
    /// A known option arrived without the fields it needs
    MalformedCommand(String),
    /// Corruption targeted a block that does not exist
    BlockIndexOutOfRange { index: u64, size: usize },
    /// Difficulty outside the reachable 1..=64 range
    InvalidDifficulty(u32),
    /// A mining search was abandoned before it found a seal
    MiningCancelled,
    /// The nonce of the given block reached `u64::MAX` without a seal
    NonceExhausted(u64),
    /// The server answered a command with an error reply
    Rejected(String),
    /// Connection level failures
    Transport(String),
    /// Digest or big-integer primitives failed or are unusable
    Crypto(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// Configuration errors
    Config(String),
    /// File I/O errors
    Io(String),
}

impl LedgerError {
    /// Errors after which the session loop closes the connection.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LedgerError::UnknownOption(_)
                | LedgerError::Transport(_)
                | LedgerError::Serialization(_)
        )
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::IdentityMismatch => {
                write!(f, "Identity mismatch: the public key does not match the identity")
            }
            LedgerError::SignatureMismatch => {
                write!(f, "Signature mismatch: the signature does not match")
            }
            LedgerError::UnknownOption(option) => write!(f, "Unknown option: {option}"),
            LedgerError::MalformedCommand(msg) => write!(f, "Malformed command: {msg}"),
            LedgerError::BlockIndexOutOfRange { index, size } => {
                write!(
                    f,
                    "Block index {index} out of range (chain size {size})"
                )
            }
            LedgerError::InvalidDifficulty(difficulty) => {
                write!(f, "Invalid difficulty {difficulty}: must be between 1 and 64")
            }
            LedgerError::MiningCancelled => write!(f, "Mining cancelled before a seal was found"),
            LedgerError::NonceExhausted(index) => {
                write!(f, "Nonce space of block {index} exhausted without a seal")
            }
            LedgerError::Rejected(msg) => write!(f, "Command rejected: {msg}"),
            LedgerError::Transport(msg) => write!(f, "Transport error: {msg}"),
            LedgerError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(LedgerError::UnknownOption(9).is_fatal());
        assert!(LedgerError::Transport("reset".to_string()).is_fatal());
        assert!(!LedgerError::IdentityMismatch.is_fatal());
        assert!(!LedgerError::SignatureMismatch.is_fatal());
        assert!(!LedgerError::MiningCancelled.is_fatal());
    }

    #[test]
    fn test_display_names_failed_check() {
        assert!(LedgerError::IdentityMismatch
            .to_string()
            .contains("public key does not match"));
        assert!(LedgerError::SignatureMismatch
            .to_string()
            .contains("signature does not match"));
    }
}
