use crate::error::{LedgerError, Result};
use crate::utils::serialization::decimal;
use crate::wallet::primes::generate_probable_prime;
use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PUBLIC_EXPONENT: u32 = 65537;

/// `n` has to exceed every 256-bit digest or signatures stop round-tripping
pub const MIN_PRIME_BITS: u64 = 160;

/// Number of trailing public-key bytes that make up an identity
pub const IDENTITY_LEN: usize = 20;

// Redraws allowed when p == q or gcd(e, phi) != 1
const MAX_KEY_ATTEMPTS: usize = 16;

/// RSA-style key pair: public `(e, n)`, private `d`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    #[serde(with = "decimal")]
    e: BigUint,
    #[serde(with = "decimal")]
    n: BigUint,
    #[serde(with = "decimal")]
    d: BigUint,
}

impl KeyPair {
    /// Draw two independent probable primes of `bits` bits and derive
    /// `n = p*q`, `d = e^-1 mod phi(n)` with `e = 65537`.
    pub fn generate(bits: u64, certainty: u32) -> Result<KeyPair> {
        if bits < MIN_PRIME_BITS {
            return Err(LedgerError::Crypto(format!(
                "Prime size {bits} is below the {MIN_PRIME_BITS}-bit minimum"
            )));
        }

        let mut rng = rand::thread_rng();
        let e = BigUint::from(PUBLIC_EXPONENT);
        for _ in 0..MAX_KEY_ATTEMPTS {
            let p = generate_probable_prime(bits, certainty, &mut rng)?;
            let q = generate_probable_prime(bits, certainty, &mut rng)?;
            if p == q {
                continue;
            }

            let phi = (&p - BigUint::one()) * (&q - BigUint::one());
            // modinv only fails when gcd(e, phi) != 1
            if let Some(d) = e.modinv(&phi) {
                return Ok(KeyPair { e, n: p * q, d });
            }
        }

        Err(LedgerError::Crypto(format!(
            "No usable prime pair after {MAX_KEY_ATTEMPTS} attempts"
        )))
    }

    pub fn from_parts(e: BigUint, n: BigUint, d: BigUint) -> KeyPair {
        KeyPair { e, n, d }
    }

    pub fn get_e(&self) -> &BigUint {
        &self.e
    }

    pub fn get_n(&self) -> &BigUint {
        &self.n
    }

    pub fn get_d(&self) -> &BigUint {
        &self.d
    }

    pub fn public_key_text(&self) -> String {
        public_key_text(&self.e, &self.n)
    }

    pub fn identity(&self) -> String {
        derive_identity(&self.public_key_text())
    }
}

// The private exponent stays out of logs
impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("e", &self.e.to_str_radix(10))
            .field("n", &self.n.to_str_radix(10))
            .finish_non_exhaustive()
    }
}

/// `e` and `n` in decimal, concatenated with no separator
pub fn public_key_text(e: &BigUint, n: &BigUint) -> String {
    format!("{}{}", e.to_str_radix(10), n.to_str_radix(10))
}

/// Identity of a public key: the trailing `IDENTITY_LEN` bytes of its UTF-8
/// text read as a big-endian unsigned integer, printed in decimal.
///
/// This is a byte slice, not a digest. Signer and verifier have to agree on
/// it exactly, so it must not be swapped for a hash on one side only.
pub fn derive_identity(public_key_text: &str) -> String {
    let bytes = public_key_text.as_bytes();
    let start = bytes.len().saturating_sub(IDENTITY_LEN);
    BigUint::from_bytes_be(&bytes[start..]).to_str_radix(10)
}
