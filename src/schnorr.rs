// Schnorr signatures over the order-q subgroup of Z*_p.
//
// The public key is y = g^-x mod p, so a signature (e, s) with s = k + x * e
// satisfies g^s * y^e == g^k (mod p). Neither e nor s is reduced modulo q;
// exponentiation modulo p absorbs the difference because g has order q.

use std::fmt;

use crate::arith::mod_inverse;
use crate::hash::{ChallengeHash, Sha256Challenge};
use crate::params::{GenerationConfig, GroupParameters};
use crate::{Error, Result};

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// A private exponent `x` in `[1, q-1]` and the public key `y = (g^x)^-1 mod p`.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    private: BigUint,
    public: BigUint,
}

impl KeyPair {
    pub fn generate<R: Rng + ?Sized>(params: &GroupParameters, rng: &mut R) -> Result<Self> {
        let private = random_exponent(params.q(), rng);
        Self::from_private_key(params, private)
    }

    pub fn from_private_key(params: &GroupParameters, private: BigUint) -> Result<Self> {
        if private.is_zero() || &private >= params.q() {
            return Err(Error::InvalidPrivateKey);
        }
        let gx = params.g().modpow(&private, params.p());
        let public = mod_inverse(&gx, params.p())?;
        Ok(Self { private, public })
    }

    pub fn private_key(&self) -> &BigUint {
        &self.private
    }

    pub fn public_key(&self) -> &BigUint {
        &self.public
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private", &"<redacted>")
            .field("public", &self.public)
            .finish()
    }
}

/// A hash-derived challenge `e` and response `s`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub e: BigUint,
    pub s: BigUint,
}

/// A signer/verifier bound to one set of group parameters.
///
/// A fresh instance holds no keys and can only verify. Generating (or
/// importing) a keypair enables signing; generating again replaces the
/// keypair, after which earlier signatures no longer match the public key.
#[derive(Debug, Clone)]
pub struct Schnorr<H = Sha256Challenge> {
    params: GroupParameters,
    hasher: H,
    // None until a keypair is generated or imported.
    keys: Option<KeyPair>,
}

impl Schnorr<Sha256Challenge> {
    pub fn new(params: GroupParameters) -> Self {
        Self::with_hasher(params, Sha256Challenge)
    }

    /// Creates a scheme over freshly generated parameters of the default size.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
        Self::generate_with(&GenerationConfig::default(), rng)
    }

    pub fn generate_with<R: Rng + ?Sized>(config: &GenerationConfig, rng: &mut R) -> Result<Self> {
        Ok(Self::new(GroupParameters::generate_with(config, rng)?))
    }
}

impl<H: ChallengeHash> Schnorr<H> {
    pub fn with_hasher(params: GroupParameters, hasher: H) -> Self {
        Self {
            params,
            hasher,
            keys: None,
        }
    }

    pub fn parameters(&self) -> &GroupParameters {
        &self.params
    }

    pub fn is_keyed(&self) -> bool {
        self.keys.is_some()
    }

    pub fn key_pair(&self) -> Option<&KeyPair> {
        self.keys.as_ref()
    }

    pub fn public_key(&self) -> Option<&BigUint> {
        self.key_pair().map(KeyPair::public_key)
    }

    pub fn generate_keys<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&KeyPair> {
        let keys = KeyPair::generate(&self.params, rng)?;
        debug!(
            public_key = %keys.public_key(),
            replaced = self.is_keyed(),
            "generated keypair"
        );
        let keys: &KeyPair = self.keys.insert(keys);
        Ok(keys)
    }

    pub fn import_private_key(&mut self, private: BigUint) -> Result<&KeyPair> {
        let keys = KeyPair::from_private_key(&self.params, private)?;
        debug!(public_key = %keys.public_key(), "imported private key");
        let keys: &KeyPair = self.keys.insert(keys);
        Ok(keys)
    }

    /// Signs `message` with a fresh nonce drawn from `rng`. The nonce must
    /// never repeat across messages, so `rng` should be a CSPRNG.
    pub fn sign<R: Rng + ?Sized>(&self, message: &[u8], rng: &mut R) -> Result<Signature> {
        if !self.is_keyed() {
            return Err(Error::NotKeyed);
        }
        let nonce = random_exponent(self.params.q(), rng);
        self.sign_with_nonce(message, &nonce)
    }

    /// Checks `signature` against `public_key`. Works without local keys.
    pub fn verify(&self, message: &[u8], signature: &Signature, public_key: &BigUint) -> bool {
        let p = self.params.p();
        let gs = self.params.g().modpow(&signature.s, p);
        let ye = public_key.modpow(&signature.e, p);
        let commitment = (gs * ye) % p;

        let valid = self.hasher.challenge(&commitment, message) == signature.e;
        if !valid {
            trace!("rejected signature");
        }
        valid
    }

    /// Verifies each `(message, signature)` pair in parallel.
    pub fn verify_batch<M>(&self, items: &[(M, Signature)], public_key: &BigUint) -> Vec<bool>
    where
        M: AsRef<[u8]> + Sync,
        H: Sync,
    {
        items
            .par_iter()
            .map(|(message, signature)| self.verify(message.as_ref(), signature, public_key))
            .collect()
    }

    fn sign_with_nonce(&self, message: &[u8], nonce: &BigUint) -> Result<Signature> {
        let keys = self.key_pair().ok_or(Error::NotKeyed)?;
        let r = self.params.g().modpow(nonce, self.params.p());
        let e = self.hasher.challenge(&r, message);
        let s = nonce + keys.private_key() * &e;
        Ok(Signature { e, s })
    }
}

// Uniform in [1, q-1].
fn random_exponent<R: Rng + ?Sized>(q: &BigUint, rng: &mut R) -> BigUint {
    rng.gen_biguint_range(&BigUint::one(), q)
}
