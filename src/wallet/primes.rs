use crate::error::{LedgerError, Result};
use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::Rng;

// Trial division by these weeds out most candidates before Miller-Rabin runs
const SMALL_PRIMES: [u32; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97,
];

/// Miller-Rabin rounds for a certainty value: each round leaves at most a 1/4
/// chance of a composite slipping through, so `certainty` bits need half as
/// many rounds.
pub fn rounds_for_certainty(certainty: u32) -> u32 {
    certainty.div_ceil(2).max(1)
}

/// Random probable prime with exactly `bits` bits. The smallest prime has
/// two bits, so anything below that is rejected.
pub fn generate_probable_prime<R: Rng + ?Sized>(
    bits: u64,
    certainty: u32,
    rng: &mut R,
) -> Result<BigUint> {
    if bits < 2 {
        return Err(LedgerError::Crypto(format!(
            "No prime has exactly {bits} bit(s)"
        )));
    }
    let rounds = rounds_for_certainty(certainty);
    let top_bit = BigUint::one() << (bits - 1);
    loop {
        // Force the top bit for the exact length and the low bit for oddness
        let candidate = rng.gen_biguint(bits) | &top_bit | BigUint::one();
        if is_probable_prime(&candidate, rounds, rng) {
            return Ok(candidate);
        }
    }
}

pub fn is_probable_prime<R: Rng + ?Sized>(n: &BigUint, rounds: u32, rng: &mut R) -> bool {
    for p in SMALL_PRIMES {
        let p = BigUint::from(p);
        if *n == p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }
    if *n < BigUint::from(2u32) {
        return false;
    }

    let two = BigUint::from(2u32);
    let n_minus_one = n.clone() - 1u32;
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values() {
        let mut rng = rand::thread_rng();
        let primes = [2u32, 3, 5, 97, 101, 7919, 65537];
        let composites = [0u32, 1, 4, 91, 561, 7917, 65535];

        for p in primes {
            assert!(is_probable_prime(&BigUint::from(p), 20, &mut rng), "{p}");
        }
        for c in composites {
            assert!(!is_probable_prime(&BigUint::from(c), 20, &mut rng), "{c}");
        }
    }

    #[test]
    fn test_known_large_prime() {
        let mut rng = rand::thread_rng();
        // 2^127 - 1 is a Mersenne prime, 2^128 + 1 is not prime
        let mersenne = (BigUint::one() << 127u32) - 1u32;
        let fermat = (BigUint::one() << 128u32) + 1u32;
        assert!(is_probable_prime(&mersenne, 30, &mut rng));
        assert!(!is_probable_prime(&fermat, 30, &mut rng));
    }

    #[test]
    fn test_generated_prime_has_exact_length() {
        let mut rng = rand::thread_rng();
        let prime = generate_probable_prime(128, 40, &mut rng).unwrap();
        assert_eq!(prime.bits(), 128);
        assert!(is_probable_prime(&prime, 40, &mut rng));
    }

    #[test]
    fn test_too_few_bits_rejected() {
        let mut rng = rand::thread_rng();
        for bits in [0, 1] {
            assert!(matches!(
                generate_probable_prime(bits, 20, &mut rng),
                Err(LedgerError::Crypto(_))
            ));
        }
        let smallest = generate_probable_prime(2, 20, &mut rng).unwrap();
        assert_eq!(smallest, BigUint::from(3u32));
    }

    #[test]
    fn test_rounds_for_certainty() {
        assert_eq!(rounds_for_certainty(100), 50);
        assert_eq!(rounds_for_certainty(7), 4);
        assert_eq!(rounds_for_certainty(0), 1);
    }
}
