// Fiat-Shamir challenge hashing for Schnorr signatures.

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

/// Fiat-Shamir challenge oracle `H(r, M)`, mapping a group element and a
/// message to an integer. Signer and verifier must use the same oracle.
pub trait ChallengeHash {
    fn challenge(&self, commitment: &BigUint, message: &[u8]) -> BigUint;
}

/// SHA-256 over the decimal digits of `r` followed by the message bytes,
/// read as a big-endian integer. The result is not reduced modulo `q`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256Challenge;

impl ChallengeHash for Sha256Challenge {
    fn challenge(&self, commitment: &BigUint, message: &[u8]) -> BigUint {
        let mut hasher = Sha256::new();
        hasher.update(commitment.to_str_radix(10).as_bytes());
        hasher.update(message);
        BigUint::from_bytes_be(&hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use num_traits::Num;
    use rstest::rstest;

    #[rstest]
    #[case(16, b"", "b17ef6d19c7a5b1ee83b907c595526dcb1eb06db8227d650d5dda0a9f4ce8cd9")]
    #[case(123, b"", "a665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3")]
    #[case(
        16,
        b"This is a signed message.",
        "d70ef182e7e75420504d96dee95a12ff173dc4e1f50964cea1b4c8e42e9cd0a3"
    )]
    fn sha256_challenge_hashes_decimal_commitment(
        #[case] commitment: u64,
        #[case] message: &[u8],
        #[case] expected_hex: &str,
    ) {
        let challenge = Sha256Challenge.challenge(&BigUint::from(commitment), message);

        assert_eq!(challenge, BigUint::from_str_radix(expected_hex, 16).unwrap());
    }

    #[test]
    fn sha256_challenge_concatenates_commitment_and_message() {
        let split = Sha256Challenge.challenge(&BigUint::from(12u64), b"3");
        let joined = Sha256Challenge.challenge(&BigUint::from(123u64), b"");

        assert_eq!(split, joined);
    }

    #[test]
    fn sha256_challenge_depends_on_message() {
        let r = BigUint::from(16u64);

        let a = Sha256Challenge.challenge(&r, b"This is a signed message.");
        let b = Sha256Challenge.challenge(&r, b"Tampered message");

        assert_ne!(a, b);
    }
}
