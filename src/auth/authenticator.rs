use crate::error::{LedgerError, Result};
use crate::network::protocol::CommandEnvelope;
use crate::utils::sha256_digest;
use crate::wallet::{derive_identity, public_key_text};
use log::warn;
use num_bigint::BigUint;
use num_traits::Zero;

/// Digest of the message as a non-negative integer. Reading the bytes as
/// unsigned is the same as prepending a zero byte to force a positive sign.
fn digest_as_integer(message: &str) -> BigUint {
    BigUint::from_bytes_be(sha256_digest(message.as_bytes()).as_slice())
}

/// `SHA256(message)^d mod n`, rendered in decimal
pub fn sign(message: &str, d: &BigUint, n: &BigUint) -> Result<String> {
    if n.is_zero() {
        return Err(LedgerError::Crypto("Modulus must be non-zero".to_string()));
    }
    let m = digest_as_integer(message);
    Ok(m.modpow(d, n).to_str_radix(10))
}

/// True when `signature^e mod n` equals the message digest
pub fn verify(message: &str, signature: &str, e: &BigUint, n: &BigUint) -> bool {
    if n.is_zero() {
        return false;
    }
    let Some(signature) = BigUint::parse_bytes(signature.as_bytes(), 10) else {
        return false;
    };
    signature.modpow(e, n) == digest_as_integer(message)
}

pub fn verify_identity(public_key_text: &str, claimed_identity: &str) -> bool {
    derive_identity(public_key_text) == claimed_identity
}

/// Text covered by a command signature: identity, public key text and
/// option, followed by any option-specific fields, joined by commas.
pub fn signing_message(
    identity: &str,
    public_key_text: &str,
    option: u8,
    fields: &[String],
) -> String {
    let mut message = format!("{identity},{public_key_text},{option}");
    for field in fields {
        message.push(',');
        message.push_str(field);
    }
    message
}

/// Gatekeeper run on every envelope before it reaches the ledger.
pub struct Authenticator;

impl Authenticator {
    /// Identity first, then signature. The signature is never examined for
    /// an envelope whose identity does not belong to its public key.
    pub fn authenticate(envelope: &CommandEnvelope) -> Result<()> {
        let key_text = public_key_text(&envelope.public_key_e, &envelope.public_key_n);

        if !verify_identity(&key_text, &envelope.identity) {
            warn!("Identity {} does not match its public key", envelope.identity);
            return Err(LedgerError::IdentityMismatch);
        }

        let message = signing_message(
            &envelope.identity,
            &key_text,
            envelope.option,
            &envelope.signed_fields(),
        );
        if !verify(
            &message,
            &envelope.signature,
            &envelope.public_key_e,
            &envelope.public_key_n,
        ) {
            warn!("Signature from {} does not verify", envelope.identity);
            return Err(LedgerError::SignatureMismatch);
        }

        Ok(())
    }
}
