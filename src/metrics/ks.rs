//! Kolmogorov–Smirnov statistic.
//!
//! KS is the maximum vertical gap between the cumulative positive-rate and
//! negative-rate curves of the ranked population. It lies in `[0, 1]`; by
//! convention KS ≥ 0.3 reads as healthy discrimination, 0.2–0.3 as fair and
//! below 0.2 as poor.

use crate::metrics::ranking::RankedPopulation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    pub statistic: f64,
    /// Score at the rank where the maximum separation occurs.
    pub threshold: f64,
}

/// Compute KS and the score at which it is reached.
///
/// When either class is empty there is no signal: KS is 0 and the threshold
/// is the highest score in the population.
pub fn ks_statistic(ranked: &RankedPopulation) -> KsResult {
    let scores = ranked.scores();
    let top_score = scores.first().copied().unwrap_or(0.0);

    if ranked.is_degenerate() {
        return KsResult {
            statistic: 0.0,
            threshold: top_score,
        };
    }

    let cum_pos = ranked.cum_pos();
    let cum_neg = ranked.cum_neg();

    let mut best = KsResult {
        statistic: 0.0,
        threshold: top_score,
    };
    for &i in ranked.cut_points() {
        let gap = (cum_pos[i] - cum_neg[i]).abs();
        // Strict comparison keeps the first maximizing cut.
        if gap > best.statistic {
            best = KsResult {
                statistic: gap,
                threshold: scores[i],
            };
        }
    }

    best.statistic = best.statistic.clamp(0.0, 1.0);
    best
}
