//! ROC-AUC, Gini, and top-K ranking metrics.
//!
//! - AUC is the trapezoidal area under the ROC curve (TPR against FPR),
//!   integrated over tie-group cut points starting from the origin. This is the
//!   probability that a random positive outranks a random negative, with ties
//!   counted as one half.
//! - Gini = 2·AUC − 1.
//! - Capture rate at K% (CA@K) is the share of all positives found in the top
//!   K% of the ranked population; it equals recall at K%.
//! - Precision at K% is the positive share *inside* that top slice.
//! - AUC-PR is average precision over the same cut points.

use crate::domain::validate_percent;
use crate::error::MetricsError;
use crate::metrics::ranking::{RankedPopulation, top_k_count};

/// Returned when either class is empty.
pub const UNINFORMATIVE_AUC: f64 = 0.5;

pub fn calculate_auc(ranked: &RankedPopulation) -> f64 {
    if ranked.is_degenerate() {
        return UNINFORMATIVE_AUC;
    }

    let tpr = ranked.cum_pos();
    let fpr = ranked.cum_neg();

    let mut area = 0.0;
    let (mut prev_x, mut prev_y) = (0.0, 0.0);
    for &i in ranked.cut_points() {
        let (x, y) = (fpr[i], tpr[i]);
        area += (x - prev_x) * (y + prev_y) / 2.0;
        prev_x = x;
        prev_y = y;
    }

    area.clamp(0.0, 1.0)
}

pub fn gini_from_auc(auc: f64) -> f64 {
    2.0 * auc - 1.0
}

/// Share of all positives captured in the top `k_percent` of the population.
///
/// Returns 0 when the population has no positives.
pub fn capture_rate_at_k(ranked: &RankedPopulation, k_percent: f64) -> Result<f64, MetricsError> {
    validate_percent(k_percent)?;
    if ranked.n_pos() == 0 {
        return Ok(0.0);
    }
    let n_top = top_k_count(ranked.len(), k_percent);
    Ok(ranked.positives_in_top(n_top) as f64 / ranked.n_pos() as f64)
}

/// Recall restricted to the top `k_percent`; identical to [`capture_rate_at_k`].
pub fn recall_at_k(ranked: &RankedPopulation, k_percent: f64) -> Result<f64, MetricsError> {
    capture_rate_at_k(ranked, k_percent)
}

/// Positive share inside the top `k_percent` slice.
pub fn precision_at_k(ranked: &RankedPopulation, k_percent: f64) -> Result<f64, MetricsError> {
    validate_percent(k_percent)?;
    if ranked.is_empty() {
        return Ok(0.0);
    }
    let n_top = top_k_count(ranked.len(), k_percent);
    Ok(ranked.positives_in_top(n_top) as f64 / n_top as f64)
}

/// Area under the precision–recall curve, as average precision.
///
/// `AP = Σ (R_n − R_{n−1}) · P_n` over score cut points. Returns 0 when there
/// are no positives.
pub fn average_precision(ranked: &RankedPopulation) -> f64 {
    if ranked.n_pos() == 0 {
        return 0.0;
    }
    let recall = ranked.cum_pos();
    let labels = ranked.labels();

    let mut ap = 0.0;
    let mut prev_recall = 0.0;
    let mut tp = 0usize;
    let mut start = 0usize;
    for &i in ranked.cut_points() {
        tp += labels[start..=i].iter().filter(|&&l| l).count();
        start = i + 1;
        let precision = tp as f64 / (i + 1) as f64;
        ap += (recall[i] - prev_recall) * precision;
        prev_recall = recall[i];
    }
    ap.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::{SampleSpec, generate_population};
    use crate::domain::ScorePopulation;
    use proptest::prelude::*;

    fn ranked(labels: &[u8], scores: &[f64]) -> RankedPopulation {
        RankedPopulation::build(&ScorePopulation::from_arrays(labels, scores).unwrap())
    }

    #[test]
    fn perfect_separation() {
        let r = ranked(&[1, 1, 0, 0], &[0.9, 0.8, 0.2, 0.1]);
        let auc = calculate_auc(&r);
        assert_eq!(auc, 1.0);
        assert_eq!(gini_from_auc(auc), 1.0);
        assert_eq!(average_precision(&r), 1.0);
    }

    #[test]
    fn perfectly_wrong_ranking() {
        let r = ranked(&[0, 0, 1, 1], &[0.9, 0.8, 0.2, 0.1]);
        assert_eq!(calculate_auc(&r), 0.0);
        assert_eq!(gini_from_auc(0.0), -1.0);
    }

    #[test]
    fn ties_count_as_half() {
        let r = ranked(&[1, 0], &[0.5, 0.5]);
        assert_eq!(calculate_auc(&r), 0.5);
    }

    #[test]
    fn matches_pairwise_definition() {
        let labels = [1, 0, 1, 1, 0, 0, 1, 0];
        let scores = [0.9, 0.85, 0.7, 0.6, 0.6, 0.3, 0.2, 0.1];
        let r = ranked(&labels, &scores);

        let mut wins = 0.0;
        let mut pairs = 0.0;
        for (i, &li) in labels.iter().enumerate() {
            for (j, &lj) in labels.iter().enumerate() {
                if li == 1 && lj == 0 {
                    pairs += 1.0;
                    if scores[i] > scores[j] {
                        wins += 1.0;
                    } else if scores[i] == scores[j] {
                        wins += 0.5;
                    }
                }
            }
        }
        assert!((calculate_auc(&r) - wins / pairs).abs() < 1e-12);
    }

    #[test]
    fn empty_class_defaults() {
        let r = ranked(&[0, 0, 0], &[0.9, 0.5, 0.1]);
        assert_eq!(calculate_auc(&r), UNINFORMATIVE_AUC);
        assert_eq!(capture_rate_at_k(&r, 10.0).unwrap(), 0.0);
        assert_eq!(average_precision(&r), 0.0);

        let r = ranked(&[1, 1], &[0.9, 0.5]);
        assert_eq!(calculate_auc(&r), UNINFORMATIVE_AUC);
    }

    #[test]
    fn capture_and_precision_at_k() {
        // 20 records, top 10% = 2 records; top two are [1, 0]; 4 positives overall.
        let mut labels = vec![0u8; 20];
        labels[0] = 1;
        labels[5] = 1;
        labels[10] = 1;
        labels[15] = 1;
        let scores: Vec<f64> = (0..20).map(|i| 1.0 - i as f64 / 20.0).collect();
        let r = ranked(&labels, &scores);

        assert_eq!(capture_rate_at_k(&r, 10.0).unwrap(), 0.25);
        assert_eq!(recall_at_k(&r, 10.0).unwrap(), 0.25);
        assert_eq!(precision_at_k(&r, 10.0).unwrap(), 0.5);
        assert_eq!(precision_at_k(&r, 5.0).unwrap(), 1.0);
    }

    #[test]
    fn capture_uses_full_top_slice() {
        let labels: Vec<u8> = (0..100).map(|i| u8::from(i < 29)).collect();
        let scores: Vec<f64> = (0..100).map(|i| 1.0 - i as f64 / 100.0).collect();
        let r = ranked(&labels, &scores);
        assert_eq!(capture_rate_at_k(&r, 29.0).unwrap(), 1.0);
        assert_eq!(precision_at_k(&r, 29.0).unwrap(), 1.0);
    }

    #[test]
    fn capture_at_hundred_percent_is_one() {
        let r = ranked(&[0, 1, 0, 1, 1], &[0.1, 0.4, 0.35, 0.8, 0.05]);
        assert_eq!(capture_rate_at_k(&r, 100.0).unwrap(), 1.0);
    }

    #[test]
    fn invalid_percent_is_rejected() {
        let r = ranked(&[0, 1], &[0.1, 0.9]);
        assert_eq!(
            capture_rate_at_k(&r, 0.0),
            Err(MetricsError::InvalidPercent(0.0))
        );
        assert!(precision_at_k(&r, 150.0).is_err());
        assert!(capture_rate_at_k(&r, f64::NAN).is_err());
    }

    #[test]
    fn random_scores_have_auc_near_half() {
        let spec = SampleSpec {
            n: 20_000,
            bad_rate: 0.3,
            separation: 0.0,
            seed: 7,
            ..SampleSpec::default()
        };
        let pop = generate_population(&spec).unwrap();
        let auc = calculate_auc(&RankedPopulation::build(&pop));
        assert!((auc - 0.5).abs() < 0.02, "auc={auc}");
    }

    #[test]
    fn average_precision_known_value() {
        // Ranked labels 1,0,1,0 -> AP = 0.5*1 + 0.5*(2/3)
        let r = ranked(&[1, 0, 1, 0], &[0.9, 0.8, 0.7, 0.6]);
        let expected = 0.5 + 0.5 * (2.0 / 3.0);
        assert!((average_precision(&r) - expected).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn full_capture_whenever_positives_exist(
            data in prop::collection::vec((0u8..=1, 0.0f64..1.0), 1..200)
        ) {
            let (labels, scores): (Vec<u8>, Vec<f64>) = data.into_iter().unzip();
            prop_assume!(labels.contains(&1));
            let r = ranked(&labels, &scores);
            prop_assert_eq!(capture_rate_at_k(&r, 100.0).unwrap(), 1.0);
        }
    }
}
