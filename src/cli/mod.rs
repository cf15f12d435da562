//! Command-line interface
//!
//! This module contains the CLI commands and argument parsing
//! for the ledger server and client.

pub mod commands;

pub use commands::{Command, Opt};
