//! Seeded synthetic scored-population generation.
//!
//! Used by `mpm demo` and by tests that need large, reproducible populations.
//!
//! Each record draws a label from `Bernoulli(bad_rate)` and a latent risk
//! `separation * label + N(0, 1)`; the reported score is the logistic of that
//! latent. `separation = 0` gives label-independent scores (AUC ≈ 0.5).
//! The baseline is drawn from the same score mix with the latent shifted by
//! `-drift`, so `drift = 0` means a stable population.

use chrono::{Months, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{ScorePopulation, ScoreRecord};
use crate::error::AppError;
use crate::io::ingest::ScoredRow;

/// Shifts typical sigmoid scores toward the low end, like real PD outputs.
const LATENT_OFFSET: f64 = 1.5;

/// Thin-file accounts have less history, so the model separates them less well.
const THIN_FILE_SHARE: f64 = 0.3;
const THIN_FILE_SEPARATION_FACTOR: f64 = 0.6;

/// Per-vintage degradation applied when a sample spans several vintages.
const VINTAGE_SEPARATION_DECAY: f64 = 0.08;
const VINTAGE_LATENT_DRIFT: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub n: usize,
    pub bad_rate: f64,
    pub separation: f64,
    /// Latent shift between baseline and current scores.
    pub drift: f64,
    pub seed: u64,
    /// Tag rows with a `thin_file` / `thick_file` segment.
    pub with_segments: bool,
    /// Spread rows over this many monthly vintages (0 = no vintage column).
    pub vintages: usize,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            n: 5_000,
            bad_rate: 0.1,
            separation: 1.0,
            drift: 0.0,
            seed: 42,
            with_segments: false,
            vintages: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub rows: Vec<ScoredRow>,
    pub baseline: Vec<f64>,
}

pub fn generate_sample(spec: &SampleSpec) -> Result<SampleData, AppError> {
    if spec.n == 0 {
        return Err(AppError::new(2, "Sample size must be > 0."));
    }
    if !(spec.bad_rate.is_finite() && spec.bad_rate > 0.0 && spec.bad_rate < 1.0) {
        return Err(AppError::new(2, "Sample bad rate must be within (0, 1)."));
    }
    if !(spec.separation.is_finite() && spec.drift.is_finite()) {
        return Err(AppError::new(2, "Sample separation and drift must be finite."));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;
    let vintage_labels = vintage_labels(spec.vintages)?;

    let mut rows = Vec::with_capacity(spec.n);
    for i in 0..spec.n {
        let label = u8::from(rng.gen_bool(spec.bad_rate));

        let segment = spec.with_segments.then(|| {
            if rng.gen_bool(THIN_FILE_SHARE) {
                "thin_file"
            } else {
                "thick_file"
            }
        });
        let vintage_idx = (!vintage_labels.is_empty()).then(|| i % vintage_labels.len());

        let mut separation = spec.separation;
        if segment == Some("thin_file") {
            separation *= THIN_FILE_SEPARATION_FACTOR;
        }
        let mut shift = 0.0;
        if let Some(v) = vintage_idx {
            separation *= (1.0 - VINTAGE_SEPARATION_DECAY * v as f64).max(0.0);
            shift = VINTAGE_LATENT_DRIFT * v as f64;
        }

        let latent = separation * f64::from(label) + normal.sample(&mut rng) + shift;
        rows.push(ScoredRow {
            record: ScoreRecord::new(label, sigmoid(latent - LATENT_OFFSET)),
            segment: segment.map(str::to_string),
            vintage: vintage_idx.map(|v| vintage_labels[v].clone()),
        });
    }

    let baseline = (0..spec.n)
        .map(|_| {
            let label = f64::from(u8::from(rng.gen_bool(spec.bad_rate)));
            let latent = spec.separation * label + normal.sample(&mut rng) - spec.drift;
            sigmoid(latent - LATENT_OFFSET)
        })
        .collect();

    Ok(SampleData { rows, baseline })
}

/// Generate a sample and return it as a validated population with baseline.
pub fn generate_population(spec: &SampleSpec) -> Result<ScorePopulation, AppError> {
    let sample = generate_sample(spec)?;
    let records = sample.rows.iter().map(|r| r.record).collect();
    let population = ScorePopulation::from_records(records)?.with_baseline(sample.baseline)?;
    Ok(population)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Monthly `YYYY-MM` labels starting at 2024-01.
fn vintage_labels(count: usize) -> Result<Vec<String>, AppError> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .ok_or_else(|| AppError::new(2, "Invalid vintage start date."))?;
    (0..count)
        .map(|i| {
            start
                .checked_add_months(Months::new(i as u32))
                .map(|d| d.format("%Y-%m").to_string())
                .ok_or_else(|| AppError::new(2, "Vintage range overflows the calendar."))
        })
        .collect()
}
