// Functions related to identification and generation of prime numbers.

use crate::{Error, Result};

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::Rng;
use tracing::trace;

pub const MILLER_RABIN_ROUNDS: u32 = 5;

// Cheap trial division applied to random candidates before Miller-Rabin.
const SMALL_ODD_PRIMES: &[u32] = &[
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199, 211, 223, 227, 229, 233, 239, 241, 251,
];

/// Probabilistic primality test. A composite passes with probability at
/// most `4^-rounds`; a prime always passes.
pub fn is_probable_prime<R: Rng + ?Sized>(candidate: &BigUint, rounds: u32, rng: &mut R) -> bool {
    let two = BigUint::from(2u64);
    let three = BigUint::from(3u64);
    if candidate < &two {
        return false;
    }
    if candidate == &two || candidate == &three {
        return true;
    }
    if (candidate % 2u32).is_zero() {
        return false;
    }

    miller_rabin(candidate, rounds, rng)
}

fn miller_rabin<R: Rng + ?Sized>(candidate: &BigUint, n_rounds: u32, rng: &mut R) -> bool {
    let one = BigUint::one();
    let two = BigUint::from(2u64);
    let n_minus_one = candidate - &one;

    // n - 1 = 2^r * d with d odd
    let r = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> r;

    'witness: for _ in 0..n_rounds {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, candidate);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..r {
            x = x.modpow(&two, candidate);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

/// Draws random `bits`-bit odd integers until one is prime.
pub fn generate_prime<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> Result<BigUint> {
    generate_prime_bounded(bits, MILLER_RABIN_ROUNDS, None, rng)
}

/// Like [`generate_prime`], but gives up with [`Error::GenerationExhausted`]
/// once `max_attempts` candidates have been drawn. `None` never gives up.
pub fn generate_prime_bounded<R: Rng + ?Sized>(
    bits: u64,
    rounds: u32,
    max_attempts: Option<u64>,
    rng: &mut R,
) -> Result<BigUint> {
    if bits < 2 {
        return Err(Error::InvalidBitLength(bits));
    }

    let mut attempts = 0u64;
    loop {
        if max_attempts.is_some_and(|max| attempts >= max) {
            return Err(Error::GenerationExhausted(attempts));
        }
        attempts += 1;

        let candidate = random_odd_with_bits(bits, rng);
        if has_small_factor(&candidate) {
            continue;
        }
        if is_probable_prime(&candidate, rounds, rng) {
            trace!(bits, attempts, "generated prime");
            return Ok(candidate);
        }
    }
}

fn random_odd_with_bits<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> BigUint {
    let mut candidate = rng.gen_biguint(bits);
    candidate.set_bit(bits - 1, true);
    candidate.set_bit(0, true);
    candidate
}

fn has_small_factor(candidate: &BigUint) -> bool {
    SMALL_ODD_PRIMES
        .iter()
        .any(|&p| (candidate % p).is_zero() && candidate != &BigUint::from(p))
}
