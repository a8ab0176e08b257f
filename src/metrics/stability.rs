//! Variable-level population stability.
//!
//! Computes PSI for each input variable from real baseline and current values
//! and tiers it with [`variable_status`].

use std::cmp::Ordering;

use crate::domain::{RagStatus, VariableStabilityRecord};
use crate::error::MetricsError;
use crate::metrics::psi::calculate_psi;
use crate::metrics::rag::variable_status;

/// One variable's baseline and current observations.
#[derive(Debug, Clone, Copy)]
pub struct FeatureSample<'a> {
    pub name: &'a str,
    pub baseline: &'a [f64],
    pub current: &'a [f64],
}

/// PSI and tier per variable, highest PSI first (ties keep input order).
pub fn variable_stability(
    features: &[FeatureSample<'_>],
    bins: usize,
) -> Result<Vec<VariableStabilityRecord>, MetricsError> {
    let mut out = features
        .iter()
        .map(|f| {
            let psi = calculate_psi(f.baseline, f.current, bins)?;
            Ok(VariableStabilityRecord {
                variable: f.name.to_string(),
                psi,
                status: variable_status(psi),
            })
        })
        .collect::<Result<Vec<_>, MetricsError>>()?;

    out.sort_by(|a, b| b.psi.partial_cmp(&a.psi).unwrap_or(Ordering::Equal));
    Ok(out)
}

/// Name the variables (amber or red) that drive a PSI trigger.
pub fn psi_trigger_insight(records: &[VariableStabilityRecord]) -> String {
    let driven_by: Vec<&str> = records
        .iter()
        .filter(|r| r.status != RagStatus::Green)
        .map(|r| r.variable.as_str())
        .collect();

    if driven_by.is_empty() {
        "All variables are within acceptable PSI range (green).".to_string()
    } else {
        format!("PSI trigger is primarily driven by: {}.", driven_by.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread(lo: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| lo + i as f64 / n as f64).collect()
    }

    #[test]
    fn shifted_variable_is_flagged_and_sorted_first() {
        let stable = spread(0.0, 200);
        let shifted = spread(0.6, 200);
        let features = [
            FeatureSample {
                name: "age",
                baseline: &stable,
                current: &stable,
            },
            FeatureSample {
                name: "utilisation",
                baseline: &stable,
                current: &shifted,
            },
        ];
        let records = variable_stability(&features, 10).unwrap();
        assert_eq!(records[0].variable, "utilisation");
        assert_eq!(records[0].status, RagStatus::Red);
        assert_eq!(records[1].psi, 0.0);
        assert_eq!(records[1].status, RagStatus::Green);

        assert_eq!(
            psi_trigger_insight(&records),
            "PSI trigger is primarily driven by: utilisation."
        );
    }

    #[test]
    fn all_green_insight() {
        let records = vec![VariableStabilityRecord {
            variable: "income".into(),
            psi: 0.02,
            status: RagStatus::Green,
        }];
        assert_eq!(
            psi_trigger_insight(&records),
            "All variables are within acceptable PSI range (green)."
        );
    }

    #[test]
    fn propagates_bin_errors() {
        let x = [0.1, 0.2];
        let features = [FeatureSample {
            name: "x",
            baseline: &x,
            current: &x,
        }];
        assert_eq!(
            variable_stability(&features, 0),
            Err(MetricsError::InvalidBinCount)
        );
    }
}
