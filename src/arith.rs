// Modular arithmetic helpers shared by key generation and parameter search.

use crate::{Error, Result};

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};

/// Bezout coefficients alongside the greatest common divisor, such that
/// `a * x + b * y == gcd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedGcd {
    pub gcd: BigInt,
    pub x: BigInt,
    pub y: BigInt,
}

pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    let mut a = a.clone();
    let mut b = b.clone();
    while !b.is_zero() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    a
}

/// Iterative extended Euclidean algorithm, carrying the running coefficient
/// pairs instead of recursing.
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> ExtendedGcd {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let quotient = &old_r / &r;

        let next_r = &old_r - &quotient * &r;
        old_r = std::mem::replace(&mut r, next_r);

        let next_s = &old_s - &quotient * &s;
        old_s = std::mem::replace(&mut s, next_s);

        let next_t = &old_t - &quotient * &t;
        old_t = std::mem::replace(&mut t, next_t);
    }

    ExtendedGcd {
        gcd: old_r,
        x: old_s,
        y: old_t,
    }
}

/// Returns the unique `x` in `[0, m)` with `a * x == 1 (mod m)`.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Result<BigUint> {
    if m.is_zero() {
        return Err(Error::InverseDoesNotExist);
    }
    let m_int = BigInt::from(m.clone());
    let a_int = BigInt::from(a % m);

    let ExtendedGcd { gcd, x, .. } = extended_gcd(&a_int, &m_int);
    if !gcd.is_one() {
        return Err(Error::InverseDoesNotExist);
    }

    // Remainders of a negative dividend are negative, so shift back into range.
    let normalised = ((x % &m_int) + &m_int) % &m_int;
    Ok(normalised.magnitude().clone())
}

/// `base ^ exponent mod modulus`.
pub fn mod_pow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> Result<BigUint> {
    if modulus.is_zero() {
        return Err(Error::ZeroModulus);
    }
    Ok(base.modpow(exponent, modulus))
}
