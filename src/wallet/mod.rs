//! Key management
//!
//! This module handles key pair generation on top of a probable-prime
//! search, the identity derived from a public key, and the on-disk key file
//! the command-line client uses.

pub mod keystore;
pub mod primes;
#[allow(clippy::module_inception)]
pub mod wallet;

pub use keystore::{KeyStore, KEY_FILE};
pub use wallet::{
    derive_identity, public_key_text, KeyPair, IDENTITY_LEN, MIN_PRIME_BITS, PUBLIC_EXPONENT,
};
