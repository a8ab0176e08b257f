//! Population Stability Index (PSI).
//!
//! PSI compares two score (or feature) distributions over a shared set of
//! equal-width bins:
//!
//! ```text
//! PSI = Σ (c_i - b_i) * ln(c_i / b_i)
//! ```
//!
//! where `b_i` / `c_i` are the baseline / current fractions in bin `i`.
//! Fractions are floored at `1e-6` so an empty bin never produces `ln(0)`.
//! The summand is symmetric in `(b, c)`, hence so is PSI.

use serde::Serialize;

use crate::error::MetricsError;

pub const DEFAULT_PSI_BINS: usize = 10;

/// Floor applied to every bin fraction before taking a logarithm.
const FRACTION_FLOOR: f64 = 1e-6;

/// Conventional reading of a PSI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftLevel {
    /// PSI < 0.1
    Negligible,
    /// 0.1 ≤ PSI ≤ 0.25
    Moderate,
    /// PSI > 0.25
    Significant,
}

impl DriftLevel {
    pub fn label(self) -> &'static str {
        match self {
            DriftLevel::Negligible => "negligible",
            DriftLevel::Moderate => "moderate",
            DriftLevel::Significant => "significant",
        }
    }

    pub fn from_psi(psi: f64) -> Self {
        if psi < 0.1 {
            DriftLevel::Negligible
        } else if psi <= 0.25 {
            DriftLevel::Moderate
        } else {
            DriftLevel::Significant
        }
    }
}

/// Compute PSI between a baseline and a current distribution.
///
/// Degenerate inputs are not errors: an empty side, or no variance across
/// both sides, yields 0. A zero bin count is a caller error.
pub fn calculate_psi(baseline: &[f64], current: &[f64], bins: usize) -> Result<f64, MetricsError> {
    if bins == 0 {
        return Err(MetricsError::InvalidBinCount);
    }
    if baseline.is_empty() || current.is_empty() {
        return Ok(0.0);
    }

    let (lo, hi) = baseline
        .iter()
        .chain(current)
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if !(lo.is_finite() && hi.is_finite()) || hi <= lo {
        return Ok(0.0);
    }

    let b = bin_fractions(baseline, lo, hi, bins);
    let c = bin_fractions(current, lo, hi, bins);

    let psi = b
        .iter()
        .zip(&c)
        .map(|(&b, &c)| (c - b) * (c.ln() - b.ln()))
        .sum();
    Ok(psi)
}

/// Fraction of `values` in each of `bins` equal-width bins over `[lo, hi]`.
///
/// Bins are left-closed; the last bin also includes `hi`.
fn bin_fractions(values: &[f64], lo: f64, hi: f64, bins: usize) -> Vec<f64> {
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    let mut total = 0usize;

    for &v in values {
        if !v.is_finite() {
            continue;
        }
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
        total += 1;
    }

    let total = total.max(1) as f64;
    counts
        .into_iter()
        .map(|n| (n as f64 / total).clamp(FRACTION_FLOOR, 1.0))
        .collect()
}
