//! Utility functions and helpers
//!
//! This module contains the digest wrapper, the clock used for block
//! timestamps, and the serde adapters for text-encoded fields.

pub mod crypto;
pub mod serialization;

pub use crypto::{current_timestamp, sha256_digest, sha256_hex_upper, TIMESTAMP_FORMAT};
