// Schnorr group parameters: a prime p, a prime q dividing p - 1 and a
// generator g of the order-q subgroup of Z*_p.

use crate::prime::{generate_prime_bounded, is_probable_prime, MILLER_RABIN_ROUNDS};
use crate::{Error, Result};

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_P_BITS: u64 = 64;
pub const DEFAULT_Q_BITS: u64 = 32;

// Candidates k tried per bit of p before giving up on the current q. Some q
// admit no prime p = k * q + 1 of the requested length (p_bits = q_bits + 1
// leaves only k = 2), so the search must be able to move on to another q.
const MODULUS_ATTEMPTS_PER_BIT: u64 = 16;

/// Knobs for parameter generation. `max_attempts` bounds each retry loop
/// (the draws of `q`, the candidates for each `q` and `p`, and the search
/// for `g` separately); `None` retries until success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationConfig {
    pub p_bits: u64,
    pub q_bits: u64,
    pub rounds: u32,
    pub max_attempts: Option<u64>,
}

impl GenerationConfig {
    pub fn new(p_bits: u64, q_bits: u64) -> Self {
        Self {
            p_bits,
            q_bits,
            ..Self::default()
        }
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            p_bits: DEFAULT_P_BITS,
            q_bits: DEFAULT_Q_BITS,
            rounds: MILLER_RABIN_ROUNDS,
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGroupParameters")]
pub struct GroupParameters {
    p: BigUint,
    q: BigUint,
    g: BigUint,
}

#[derive(Deserialize)]
struct RawGroupParameters {
    p: BigUint,
    q: BigUint,
    g: BigUint,
}

impl TryFrom<RawGroupParameters> for GroupParameters {
    type Error = Error;

    fn try_from(raw: RawGroupParameters) -> Result<Self> {
        Self::new(raw.p, raw.q, raw.g)
    }
}

impl GroupParameters {
    /// Checks the subgroup structure of externally supplied parameters.
    /// Primality of `p` and `q` is the caller's responsibility; see
    /// [`GroupParameters::is_prime_order`].
    pub fn new(p: BigUint, q: BigUint, g: BigUint) -> Result<Self> {
        let one = BigUint::one();
        if p <= BigUint::from(2u64) {
            return Err(Error::InvalidParameters("p must be greater than 2"));
        }
        if q <= one {
            return Err(Error::InvalidParameters("q must be greater than 1"));
        }
        if !((&p - &one) % &q).is_zero() {
            return Err(Error::InvalidParameters("q does not divide p - 1"));
        }
        if g <= one || g >= p {
            return Err(Error::InvalidParameters("g must lie in (1, p)"));
        }
        if !g.modpow(&q, &p).is_one() {
            return Err(Error::InvalidParameters("g does not have order q"));
        }
        Ok(Self { p, q, g })
    }

    /// Generates parameters with the default bit lengths.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
        Self::generate_with(&GenerationConfig::default(), rng)
    }

    pub fn generate_with<R: Rng + ?Sized>(config: &GenerationConfig, rng: &mut R) -> Result<Self> {
        let GenerationConfig {
            p_bits,
            q_bits,
            rounds,
            max_attempts,
        } = *config;
        if q_bits < 2 || p_bits <= q_bits {
            return Err(Error::InvalidBitLengths { p_bits, q_bits });
        }

        let modulus_attempts = max_attempts.map_or(MODULUS_ATTEMPTS_PER_BIT * p_bits, |max| {
            max.min(MODULUS_ATTEMPTS_PER_BIT * p_bits)
        });

        let mut orders = 0u64;
        loop {
            if max_attempts.is_some_and(|max| orders >= max) {
                return Err(Error::GenerationExhausted(orders));
            }
            orders += 1;

            let q = generate_prime_bounded(q_bits, rounds, max_attempts, rng)?;
            debug!(q_bits, orders, "generated subgroup order");
            match find_modulus(&q, p_bits, rounds, Some(modulus_attempts), rng) {
                Ok(p) => {
                    let g = find_generator(&p, &q, max_attempts, rng)?;
                    return Ok(Self { p, q, g });
                }
                Err(Error::GenerationExhausted(_)) => {
                    debug!(p_bits, orders, "no modulus for subgroup order, redrawing");
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn q(&self) -> &BigUint {
        &self.q
    }

    pub fn g(&self) -> &BigUint {
        &self.g
    }

    /// Runs Miller-Rabin over both `p` and `q`.
    pub fn is_prime_order<R: Rng + ?Sized>(&self, rounds: u32, rng: &mut R) -> bool {
        is_probable_prime(&self.p, rounds, rng) && is_probable_prime(&self.q, rounds, rng)
    }
}

/// Generates parameters with `p_bits`-bit `p` and `q_bits`-bit `q`,
/// retrying until every step succeeds.
pub fn generate_parameters<R: Rng + ?Sized>(
    p_bits: u64,
    q_bits: u64,
    rng: &mut R,
) -> Result<GroupParameters> {
    GroupParameters::generate_with(&GenerationConfig::new(p_bits, q_bits), rng)
}

// Searches p = k * q + 1 with exactly p_bits bits.
fn find_modulus<R: Rng + ?Sized>(
    q: &BigUint,
    p_bits: u64,
    rounds: u32,
    max_attempts: Option<u64>,
    rng: &mut R,
) -> Result<BigUint> {
    let one = BigUint::one();
    let k_min = (&one << (p_bits - 1)) / q;
    let k_max = (&one << p_bits) / q;

    let mut attempts = 0u64;
    loop {
        if max_attempts.is_some_and(|max| attempts >= max) {
            return Err(Error::GenerationExhausted(attempts));
        }
        attempts += 1;

        let mut k = rng.gen_biguint_range(&k_min, &(&k_max + &one));
        // q is odd, so an even k makes p odd.
        if k.bit(0) {
            k += &one;
        }
        let p = &k * q + &one;
        if p.bits() == p_bits && is_probable_prime(&p, rounds, rng) {
            debug!(p_bits, attempts, "found modulus");
            return Ok(p);
        }
    }
}

fn find_generator<R: Rng + ?Sized>(
    p: &BigUint,
    q: &BigUint,
    max_attempts: Option<u64>,
    rng: &mut R,
) -> Result<BigUint> {
    let one = BigUint::one();
    let two = BigUint::from(2u64);
    let cofactor = (p - &one) / q;

    let mut attempts = 0u64;
    loop {
        if max_attempts.is_some_and(|max| attempts >= max) {
            return Err(Error::GenerationExhausted(attempts));
        }
        attempts += 1;

        // h in [2, p - 2]
        let h = rng.gen_biguint_range(&two, &(p - &one));
        let g = h.modpow(&cofactor, p);
        if g != one {
            return Ok(g);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{rngs::StdRng, SeedableRng};
    use rayon::prelude::*;
    use rstest::rstest;

    fn assert_group_invariants(params: &GroupParameters) {
        let one = BigUint::one();
        assert!(((params.p() - &one) % params.q()).is_zero());
        assert!(params.g().modpow(params.q(), params.p()).is_one());
        assert_ne!(params.g(), &one);
    }

    #[test]
    fn generated_parameters_satisfy_group_invariants() {
        (0..20u64).into_par_iter().for_each(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);

            let params = GroupParameters::generate(&mut rng).unwrap();

            assert_group_invariants(&params);
            assert_eq!(params.p().bits(), DEFAULT_P_BITS);
            assert_eq!(params.q().bits(), DEFAULT_Q_BITS);
            assert!(params.is_prime_order(20, &mut rng));
        });
    }

    #[rstest]
    #[case(16, 8)]
    #[case(128, 64)]
    #[case(256, 160)]
    fn generate_parameters_respects_bit_lengths(#[case] p_bits: u64, #[case] q_bits: u64) {
        let mut rng = StdRng::from_seed([101; 32]);

        let params = generate_parameters(p_bits, q_bits, &mut rng).unwrap();

        assert_group_invariants(&params);
        assert_eq!(params.p().bits(), p_bits);
        assert_eq!(params.q().bits(), q_bits);
    }

    #[rstest]
    #[case(5, 4)]
    #[case(9, 8)]
    #[case(17, 16)]
    #[case(33, 32)]
    fn generate_parameters_redraws_order_when_only_double_fits(
        #[case] p_bits: u64,
        #[case] q_bits: u64,
    ) {
        for seed in 0..10u64 {
            let mut rng = StdRng::seed_from_u64(seed);

            let params = generate_parameters(p_bits, q_bits, &mut rng).unwrap();

            assert_group_invariants(&params);
            assert_eq!(params.p().bits(), p_bits);
            assert_eq!(params.q().bits(), q_bits);
            assert_eq!(params.p(), &(params.q() * 2u32 + 1u32));
        }
    }

    #[test]
    fn find_modulus_gives_up_when_no_prime_of_the_length_exists() {
        let mut rng = StdRng::from_seed([101; 32]);
        let q = BigUint::from(13u64);

        // 2 * 13 + 1 = 27 is the only 5-bit candidate and is composite.
        let result = find_modulus(&q, 5, MILLER_RABIN_ROUNDS, Some(1_000), &mut rng);

        assert_eq!(result, Err(Error::GenerationExhausted(1_000)));
    }

    #[rstest]
    #[case(32, 32)]
    #[case(16, 32)]
    #[case(8, 1)]
    #[case(8, 0)]
    fn generate_parameters_rejects_invalid_bit_lengths(#[case] p_bits: u64, #[case] q_bits: u64) {
        let mut rng = StdRng::from_seed([101; 32]);

        let result = generate_parameters(p_bits, q_bits, &mut rng);

        assert_eq!(result, Err(Error::InvalidBitLengths { p_bits, q_bits }));
    }

    #[test]
    fn bounded_generation_reports_exhaustion() {
        let mut rng = StdRng::from_seed([101; 32]);
        let config = GenerationConfig::default().with_max_attempts(0);

        let result = GroupParameters::generate_with(&config, &mut rng);

        assert_eq!(result, Err(Error::GenerationExhausted(0)));
    }

    #[test]
    fn default_config_matches_reference_sizes() {
        let config = GenerationConfig::default();

        assert_eq!(config.p_bits, 64);
        assert_eq!(config.q_bits, 32);
        assert_eq!(config.rounds, MILLER_RABIN_ROUNDS);
        assert_eq!(config.max_attempts, None);
    }

    #[test]
    fn new_accepts_valid_small_group() {
        let params = GroupParameters::new(23u64.into(), 11u64.into(), 2u64.into()).unwrap();

        assert_group_invariants(&params);
    }

    #[rstest]
    #[case(2, 1, 1, "p must be greater than 2")]
    #[case(23, 1, 2, "q must be greater than 1")]
    #[case(23, 7, 2, "q does not divide p - 1")]
    #[case(23, 11, 1, "g must lie in (1, p)")]
    #[case(23, 11, 23, "g must lie in (1, p)")]
    #[case(23, 11, 5, "g does not have order q")]
    fn new_rejects_invalid_groups(
        #[case] p: u64,
        #[case] q: u64,
        #[case] g: u64,
        #[case] reason: &'static str,
    ) {
        let result = GroupParameters::new(p.into(), q.into(), g.into());

        assert_eq!(result, Err(Error::InvalidParameters(reason)));
    }

    #[test]
    fn deserialization_revalidates_parameters() {
        let valid: GroupParameters =
            serde_json::from_str(r#"{"p":[23],"q":[11],"g":[2]}"#).unwrap();
        let invalid = serde_json::from_str::<GroupParameters>(r#"{"p":[23],"q":[7],"g":[2]}"#);

        assert_eq!(valid.g(), &BigUint::from(2u64));
        assert!(invalid.is_err());
    }
}
