//! Decile segmentation of a ranked population.
//!
//! The ranked population is cut into ten contiguous bands. Each band gets
//! `N / 10` records, and the first `N mod 10` bands get one extra. Decile 1
//! holds the highest scores. Monotonic bad rates are not enforced; rank-order
//! breaks are reported by the commentary layer instead.

use crate::domain::DecileBucket;
use crate::metrics::ranking::RankedPopulation;

pub const DECILE_COUNT: usize = 10;

pub fn decile_table(ranked: &RankedPopulation) -> Vec<DecileBucket> {
    let n = ranked.len();
    let base = n / DECILE_COUNT;
    let remainder = n % DECILE_COUNT;
    let labels = ranked.labels();

    let mut start = 0usize;
    (0..DECILE_COUNT)
        .map(|d| {
            let size = base + usize::from(d < remainder);
            let band = &labels[start..start + size];
            start += size;

            let bad_count = band.iter().filter(|&&l| l).count();
            DecileBucket {
                decile: (d + 1) as u8,
                count: size,
                bad_count,
                bad_rate: (size > 0).then(|| bad_count as f64 / size as f64),
            }
        })
        .collect()
}
