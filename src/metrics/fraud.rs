//! Alert-threshold metrics for fraud models.
//!
//! A record is *alerted* when its score is at or above the alert threshold.

use crate::domain::ScorePopulation;
use crate::error::MetricsError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertMetrics {
    /// Alerts / population.
    pub alert_rate: f64,
    /// False alerts / negatives.
    pub fpr: f64,
    /// True alerts / alerts.
    pub fraud_rate_in_alerts: f64,
}

pub fn alert_metrics(population: &ScorePopulation, threshold: f64) -> Result<AlertMetrics, MetricsError> {
    if !threshold.is_finite() {
        return Err(MetricsError::InvalidThreshold(threshold));
    }

    let (mut alerts, mut true_alerts, mut negatives) = (0usize, 0usize, 0usize);
    for r in population.records() {
        let alerted = r.predicted_score >= threshold;
        if alerted {
            alerts += 1;
        }
        if r.is_positive() {
            true_alerts += usize::from(alerted);
        } else {
            negatives += 1;
        }
    }
    let false_alerts = alerts - true_alerts;

    Ok(AlertMetrics {
        alert_rate: ratio(alerts, population.len()),
        fpr: ratio(false_alerts, negatives),
        fraud_rate_in_alerts: ratio(true_alerts, alerts),
    })
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_alerts_at_or_above_threshold() {
        let pop = ScorePopulation::from_arrays(&[1, 0, 1, 0, 0], &[0.9, 0.6, 0.5, 0.3, 0.1]).unwrap();
        let m = alert_metrics(&pop, 0.5).unwrap();
        assert_eq!(m.alert_rate, 0.6);
        assert!((m.fpr - 1.0 / 3.0).abs() < 1e-12);
        assert!((m.fraud_rate_in_alerts - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_denominators_give_zero() {
        let pop = ScorePopulation::from_arrays(&[1, 1], &[0.2, 0.1]).unwrap();
        let m = alert_metrics(&pop, 0.5).unwrap();
        assert_eq!(m.alert_rate, 0.0);
        assert_eq!(m.fpr, 0.0);
        assert_eq!(m.fraud_rate_in_alerts, 0.0);
    }

    #[test]
    fn non_finite_threshold_is_rejected() {
        let pop = ScorePopulation::from_arrays(&[1], &[0.2]).unwrap();
        assert!(matches!(
            alert_metrics(&pop, f64::NAN),
            Err(MetricsError::InvalidThreshold(_))
        ));
    }
}
