//! Source of the synthetic scaling factor used for estimated GDP.
//!
//! The estimate is `population * multiplier / exchange_rate` with a fresh multiplier drawn
//! uniformly from [`GDP_MULTIPLIER_MIN`, `GDP_MULTIPLIER_MAX`] for every country. It is not an
//! economic figure. Seeding pins the sequence so a run can be reproduced.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::{GDP_MULTIPLIER_MAX, GDP_MULTIPLIER_MIN};

pub struct GdpMultiplier {
    rng: StdRng,
}

impl GdpMultiplier {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when a seed is given, otherwise from OS entropy.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        seed.map(Self::seeded).unwrap_or_else(Self::from_entropy)
    }

    pub fn next_multiplier(&mut self) -> f64 {
        self.rng.gen_range(GDP_MULTIPLIER_MIN..=GDP_MULTIPLIER_MAX)
    }
}

/// `population * multiplier / rate` when a positive rate is known, else `0`.
pub fn estimate_gdp(population: u64, exchange_rate: Option<f64>, multiplier: f64) -> f64 {
    match exchange_rate {
        Some(rate) if rate > 0.0 => population as f64 * multiplier / rate,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_stays_in_range() {
        let mut m = GdpMultiplier::from_entropy();
        for _ in 0..1_000 {
            let v = m.next_multiplier();
            assert!((GDP_MULTIPLIER_MIN..=GDP_MULTIPLIER_MAX).contains(&v));
        }
    }

    #[test]
    fn test_seeded_sequences_repeat() {
        let mut a = GdpMultiplier::seeded(7);
        let mut b = GdpMultiplier::seeded(7);
        for _ in 0..10 {
            assert_eq!(a.next_multiplier(), b.next_multiplier());
        }
    }

    #[test]
    fn test_estimate_gdp() {
        assert_eq!(estimate_gdp(1_000, Some(4.0), 1_500.0), 375_000.0);
        assert_eq!(estimate_gdp(1_000, None, 1_500.0), 0.0);
        assert_eq!(estimate_gdp(1_000, Some(0.0), 1_500.0), 0.0);
        assert_eq!(estimate_gdp(0, Some(2.0), 1_500.0), 0.0);
    }
}
