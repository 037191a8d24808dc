// Schnorr signatures with Miller-Rabin backed group parameter generation.

mod arith;
mod error;
mod hash;
mod params;
mod prime;
mod schnorr;

pub use arith::{extended_gcd, gcd, mod_inverse, mod_pow, ExtendedGcd};
pub use error::{Error, Result};
pub use hash::{ChallengeHash, Sha256Challenge};
pub use params::{
    generate_parameters, GenerationConfig, GroupParameters, DEFAULT_P_BITS, DEFAULT_Q_BITS,
};
pub use prime::{generate_prime, generate_prime_bounded, is_probable_prime, MILLER_RABIN_ROUNDS};
pub use schnorr::{KeyPair, Schnorr, Signature};
