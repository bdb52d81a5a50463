//! Synthetic rates used when the remote source cannot be reached.

use rand::Rng;
use remitfx_common::{RateOrigin, RateSnapshot};
use rust_decimal::Decimal;

/// Resolution of the uniform sample, in decimal places.
const SAMPLE_PLACES: u32 = 6;

/// Decimal places kept on generated rates.
const RATE_PLACES: u32 = 6;

/// Generates approximate rates around fixed base values.
///
/// Each rate is moved independently by `rate * (1 + (u - 0.5) * fluctuation)`
/// with `u` uniform in `[0, 1)`. The default fluctuation of 2% keeps every rate
/// within 1% of its base.
#[derive(Debug, Clone)]
pub struct SyntheticRates {
    /// Base USD to GBP rate.
    pub usd_to_gbp: Decimal,
    /// Base USD to ZAR rate.
    pub usd_to_zar: Decimal,
    /// Total spread of the perturbation.
    pub fluctuation: Decimal,
}

impl Default for SyntheticRates {
    fn default() -> Self {
        Self {
            usd_to_gbp: Decimal::new(79, 2),
            usd_to_zar: Decimal::new(1845, 2),
            fluctuation: Decimal::new(2, 2),
        }
    }
}

impl SyntheticRates {
    /// Generate a snapshot using the thread-local RNG.
    pub fn generate(&self) -> RateSnapshot {
        self.generate_with(&mut rand::thread_rng())
    }

    /// Generate a snapshot from the given random source.
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> RateSnapshot {
        let gbp = self.perturb(self.usd_to_gbp, sample_unit(rng));
        let zar = self.perturb(self.usd_to_zar, sample_unit(rng));
        RateSnapshot::new(gbp, zar, RateOrigin::Synthetic)
    }

    /// Apply the perturbation for a sample `unit` in `[0, 1)`.
    pub fn perturb(&self, rate: Decimal, unit: Decimal) -> Decimal {
        let factor = Decimal::ONE + (unit - Decimal::new(5, 1)) * self.fluctuation;
        (rate * factor).round_dp(RATE_PLACES)
    }

    /// Lowest rate `perturb` can produce for `rate`.
    pub fn lower_bound(&self, rate: Decimal) -> Decimal {
        rate * (Decimal::ONE - self.fluctuation / Decimal::TWO)
    }

    /// Highest rate `perturb` can produce for `rate`.
    pub fn upper_bound(&self, rate: Decimal) -> Decimal {
        rate * (Decimal::ONE + self.fluctuation / Decimal::TWO)
    }
}

fn sample_unit<R: Rng + ?Sized>(rng: &mut R) -> Decimal {
    let scale = 10u32.pow(SAMPLE_PLACES);
    Decimal::new(i64::from(rng.gen_range(0..scale)), SAMPLE_PLACES)
}
