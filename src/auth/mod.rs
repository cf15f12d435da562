//! Request authentication
//!
//! Signing and verification built directly on modular exponentiation, and
//! the check every command envelope passes before it reaches the ledger.

pub mod authenticator;

pub use authenticator::{sign, signing_message, verify, verify_identity, Authenticator};
