// Error types for parameter generation, key handling and signing.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The value and modulus share a factor, so no inverse exists.
    #[error("modular inverse does not exist")]
    InverseDoesNotExist,
    #[error("modulus must be non-zero")]
    ZeroModulus,
    /// `sign` was called before a keypair was generated or imported.
    #[error("no keypair has been generated")]
    NotKeyed,
    /// A bounded generation loop ran out of attempts.
    #[error("generation exhausted after {0} attempts")]
    GenerationExhausted(u64),
    #[error("cannot generate a prime of {0} bits")]
    InvalidBitLength(u64),
    #[error("invalid bit lengths: p_bits = {p_bits}, q_bits = {q_bits}")]
    InvalidBitLengths { p_bits: u64, q_bits: u64 },
    #[error("invalid group parameters: {0}")]
    InvalidParameters(&'static str),
    #[error("private key is not in [1, q-1]")]
    InvalidPrivateKey,
}
