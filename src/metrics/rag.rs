//! Red/Amber/Green classification.

use std::collections::BTreeMap;

use crate::domain::RagStatus;

const GREEN_MIN_KS: f64 = 0.3;
const GREEN_MAX_PSI: f64 = 0.2;
const AMBER_MIN_KS: f64 = 0.2;
const AMBER_MAX_PSI: f64 = 0.25;

/// Model-level status from KS and PSI.
///
/// A missing KS counts as 0 and a missing PSI as 1, so missing evidence never
/// reads as healthy.
pub fn classify(ks: Option<f64>, psi: Option<f64>) -> RagStatus {
    let ks = ks.unwrap_or(0.0);
    let psi = psi.unwrap_or(1.0);
    if ks >= GREEN_MIN_KS && psi < GREEN_MAX_PSI {
        RagStatus::Green
    } else if ks >= AMBER_MIN_KS && psi < AMBER_MAX_PSI {
        RagStatus::Amber
    } else {
        RagStatus::Red
    }
}

/// Stability tier of a single input variable: green < 0.1, amber < 0.2, red otherwise.
pub fn variable_status(psi: f64) -> RagStatus {
    if psi < 0.1 {
        RagStatus::Green
    } else if psi < 0.2 {
        RagStatus::Amber
    } else {
        RagStatus::Red
    }
}

/// Count statuses across a portfolio; every status is present in the result.
pub fn portfolio_breakdown<I>(statuses: I) -> BTreeMap<&'static str, usize>
where
    I: IntoIterator<Item = RagStatus>,
{
    let mut counts: BTreeMap<&'static str, usize> = RagStatus::ALL.iter().map(|s| (s.label(), 0)).collect();
    for s in statuses {
        *counts.entry(s.label()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        assert_eq!(classify(Some(0.35), Some(0.10)), RagStatus::Green);
        assert_eq!(classify(Some(0.25), Some(0.22)), RagStatus::Amber);
        assert_eq!(classify(Some(0.10), Some(0.30)), RagStatus::Red);
        // Strong KS does not rescue a drifting population.
        assert_eq!(classify(Some(0.45), Some(0.22)), RagStatus::Amber);
        assert_eq!(classify(Some(0.45), Some(0.25)), RagStatus::Red);
    }

    #[test]
    fn boundaries_are_inclusive_on_ks() {
        assert_eq!(classify(Some(0.3), Some(0.0)), RagStatus::Green);
        assert_eq!(classify(Some(0.2), Some(0.0)), RagStatus::Amber);
        assert_eq!(classify(Some(0.3), Some(0.2)), RagStatus::Amber);
    }

    #[test]
    fn missing_values_are_pessimistic() {
        assert_eq!(classify(None, Some(0.0)), RagStatus::Red);
        assert_eq!(classify(Some(0.9), None), RagStatus::Red);
    }

    #[test]
    fn variable_tiers() {
        assert_eq!(variable_status(0.05), RagStatus::Green);
        assert_eq!(variable_status(0.1), RagStatus::Amber);
        assert_eq!(variable_status(0.2), RagStatus::Red);
    }

    #[test]
    fn breakdown_includes_zero_counts() {
        let counts = portfolio_breakdown([RagStatus::Green, RagStatus::Green, RagStatus::Red]);
        assert_eq!(counts["green"], 2);
        assert_eq!(counts["amber"], 0);
        assert_eq!(counts["red"], 1);
    }
}
