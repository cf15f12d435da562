//! Configuration management
//!
//! This module handles the settings for the ledger server and the client:
//! listen address, genesis difficulty, key size and mining limits.

pub mod settings;

pub use settings::{Config, GLOBAL_CONFIG};
