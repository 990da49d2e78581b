use crate::errors::PipelineError;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 31-bit non-negative random seed.
///
/// Freshly drawn seeds fall in `[0, 2^31 - 1)`. Caller-supplied seeds may use
/// the full 31-bit range `[0, 2^31 - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Seed(u32);

impl Seed {
    /// Exclusive upper bound of a fresh draw.
    pub const DRAW_BOUND: u32 = i32::MAX as u32;

    /// Largest value a caller may pin.
    pub const MAX: u32 = i32::MAX as u32;

    /// Validate a caller-supplied seed.
    pub fn new(value: u64) -> Result<Self, PipelineError> {
        if value > u64::from(Self::MAX) {
            return Err(PipelineError::Configuration(format!(
                "seed {value} is outside the 31-bit range [0, {}]",
                Self::MAX
            )));
        }
        Ok(Self(value as u32))
    }

    /// Draw a fresh seed from `rng`.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.random_range(0..Self::DRAW_BOUND))
    }

    /// The raw seed value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// A generator seeded with this value. Every stage that consumes
    /// randomness builds its own generator from its own seed.
    pub fn rng(self) -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(u64::from(self.0))
    }

    /// Derive a distinct, reproducible seed for sub-stream `stream`.
    ///
    /// Used when one pinned seed has to cover several draws (one per
    /// population group) without two draws sharing a value.
    pub fn derive(self, stream: u64) -> Self {
        let mixed = (u64::from(self.0) << 32) ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(mixed);
        Self::draw(&mut rng)
    }
}

impl TryFrom<u64> for Seed {
    type Error = PipelineError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Seed> for u64 {
    fn from(seed: Seed) -> u64 {
        u64::from(seed.0)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_range_validation() {
        assert!(Seed::new(0).is_ok());
        assert!(Seed::new(u64::from(Seed::MAX)).is_ok());
        assert!(matches!(
            Seed::new(1 << 31),
            Err(PipelineError::Configuration(_))
        ));
    }

    #[test]
    fn test_draw_within_bound() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        for _ in 0..1000 {
            assert!(Seed::draw(&mut rng).get() < Seed::DRAW_BOUND);
        }
    }

    #[test]
    fn test_derive_is_stable_and_distinct() {
        let base = Seed::new(42).unwrap();
        assert_eq!(base.derive(1), base.derive(1));
        assert_ne!(base.derive(1), base.derive(2));
    }

    #[test]
    fn test_seed_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Seed>("2147483648").is_err());
        let seed: Seed = serde_json::from_str("17").unwrap();
        assert_eq!(seed.get(), 17);
    }
}
