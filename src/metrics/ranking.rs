//! Ranking and cumulative-distribution builder.
//!
//! Every discrimination statistic in this crate (KS, ROC-AUC, capture rate,
//! deciles) works on the population ranked by score, highest first. This
//! module does the sort once and exposes:
//!
//! - the sorted labels and scores
//! - cumulative positive / negative rate curves, index-aligned with the sort
//! - tie-group cut points, i.e. the last rank index of each run of equal scores
//!
//! Statistics that depend on a *threshold* must only be evaluated at cut
//! points; evaluating in the middle of a tie group would make the result
//! depend on the arbitrary order of tied records.

use std::cmp::Ordering;

use crate::domain::ScorePopulation;

/// A population ranked by score (descending) with its cumulative rate curves.
#[derive(Debug, Clone)]
pub struct RankedPopulation {
    labels: Vec<bool>,
    scores: Vec<f64>,
    cum_pos: Vec<f64>,
    cum_neg: Vec<f64>,
    cuts: Vec<usize>,
    n_pos: usize,
    n_neg: usize,
}

impl RankedPopulation {
    pub fn build(population: &ScorePopulation) -> Self {
        let records = population.records();

        // `sort_by` is stable, so equal scores keep their input order.
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by(|&a, &b| {
            records[b]
                .predicted_score
                .partial_cmp(&records[a].predicted_score)
                .unwrap_or(Ordering::Equal)
        });

        let labels: Vec<bool> = order.iter().map(|&i| records[i].is_positive()).collect();
        let scores: Vec<f64> = order.iter().map(|&i| records[i].predicted_score).collect();

        let n_pos = labels.iter().filter(|&&l| l).count();
        let n_neg = labels.len() - n_pos;

        let cum_pos = cumulative_rate(&labels, true, n_pos);
        let cum_neg = cumulative_rate(&labels, false, n_neg);
        let cuts = tie_group_ends(&scores);

        Self {
            labels,
            scores,
            cum_pos,
            cum_neg,
            cuts,
            n_pos,
            n_neg,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Fraction of all positives seen up to and including each rank.
    pub fn cum_pos(&self) -> &[f64] {
        &self.cum_pos
    }

    /// Fraction of all negatives seen up to and including each rank.
    pub fn cum_neg(&self) -> &[f64] {
        &self.cum_neg
    }

    /// Last rank index of every run of equal scores, ascending.
    pub fn cut_points(&self) -> &[usize] {
        &self.cuts
    }

    pub fn n_pos(&self) -> usize {
        self.n_pos
    }

    pub fn n_neg(&self) -> usize {
        self.n_neg
    }

    /// True when one class is missing and no discrimination signal exists.
    pub fn is_degenerate(&self) -> bool {
        self.n_pos == 0 || self.n_neg == 0
    }

    /// Number of positives among the first `n` ranked records.
    pub fn positives_in_top(&self, n: usize) -> usize {
        self.labels.iter().take(n).filter(|&&l| l).count()
    }
}

/// Cumulative share of `class` members, or an all-zero curve if the class is empty.
fn cumulative_rate(labels: &[bool], class: bool, class_total: usize) -> Vec<f64> {
    if class_total == 0 {
        return vec![0.0; labels.len()];
    }
    let total = class_total as f64;
    let mut seen = 0usize;
    labels
        .iter()
        .map(|&l| {
            if l == class {
                seen += 1;
            }
            seen as f64 / total
        })
        .collect()
}

fn tie_group_ends(sorted_scores: &[f64]) -> Vec<usize> {
    let n = sorted_scores.len();
    (0..n)
        .filter(|&i| i + 1 == n || sorted_scores[i + 1] != sorted_scores[i])
        .collect()
}

/// Number of records in the top `k_percent` slice: `max(1, floor(n * k / 100))`.
pub fn top_k_count(n: usize, k_percent: f64) -> usize {
    // n * k is exact for integer inputs; divide last.
    let raw = ((n as f64 * k_percent) / 100.0).floor() as usize;
    raw.clamp(1, n.max(1))
}
