//! # Sealchain - My Tamper-Evident Ledger
//!
//! This is an append-only ledger where every record is hash-linked to the one
//! before it and sealed with proof-of-work. Remote operators drive it over TCP,
//! and every command they send is signed with an RSA-style key pair built
//! straight on modular exponentiation.
//!
//! ## What I Built
//! - **Hash chain**: blocks with a fixed canonical form, hashed with SHA-256
//! - **Miner**: brute-force nonce search, optionally bounded by a deadline
//! - **Validator and repairer**: one linear pass each over the chain
//! - **Keys and identities**: probable-prime key generation, identities sliced
//!   from the public key text
//! - **Authenticated commands**: signed JSON envelopes over a TCP session
//!
//! ## How I Organized My Code
//! - `core/`: blocks, proof-of-work, the ledger with validate/corrupt/repair
//! - `wallet/`: prime search, key pairs, identities, the client key file
//! - `auth/`: signing, verification and envelope authentication
//! - `network/`: wire protocol, dispatcher, server session loop, client
//! - `config/`: environment-driven settings
//! - `utils/`: SHA-256 helpers, timestamps, serde adapters
//! - `cli/`: command-line interface for the server and the client
//!
//! ## When I Need to Understand Something
//! 1. `core/block.rs` for the canonical form that gets hashed
//! 2. `core/blockchain.rs` for validation and repair
//! 3. `auth/authenticator.rs` for the order of the security checks
//! 4. `network/server.rs` for how a session runs

pub mod auth;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod network;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use auth::{sign, verify, verify_identity, Authenticator};
pub use config::{Config, GLOBAL_CONFIG};
pub use crate::core::{Block, Ledger, LedgerView, MiningBudget, ProofOfWork};
pub use error::{LedgerError, Result};
pub use network::{
    Command, CommandDispatcher, CommandEnvelope, LedgerClient, Response, Server, SessionEnd,
};
pub use utils::sha256_hex_upper;
pub use wallet::{derive_identity, KeyPair, KeyStore};
