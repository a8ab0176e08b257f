//! Collections-model rates computed from an account delinquency cohort.
//!
//! Delinquency buckets: current (0 dpd), then one bucket per 30 days
//! (1-29 → bucket 1, 30-59 → bucket 2, …).
//!
//! - roll rate 30: accounts 30+ dpd that rolled to 60+ dpd
//! - flow rate: delinquent accounts that advanced at least one bucket
//! - cure rate: delinquent accounts that returned to current
//! - recovery rate: recovered amount over balance for accounts 30+ dpd
//!
//! A zero denominator yields 0.

use crate::domain::CollectionsCohort;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollectionsRates {
    pub roll_rate_30: f64,
    pub flow_rate: f64,
    pub recovery_rate: f64,
    pub cure_rate: f64,
}

fn bucket(dpd: u32) -> u32 {
    if dpd == 0 { 0 } else { dpd / 30 + 1 }
}

pub fn collections_rates(cohort: &CollectionsCohort) -> CollectionsRates {
    let mut delinquent = 0usize;
    let mut advanced = 0usize;
    let mut cured = 0usize;
    let mut over_30 = 0usize;
    let mut rolled_60 = 0usize;
    let mut balance_30 = 0.0;
    let mut recovered_30 = 0.0;

    for a in &cohort.accounts {
        if a.prev_dpd >= 1 {
            delinquent += 1;
            if bucket(a.current_dpd) > bucket(a.prev_dpd) {
                advanced += 1;
            }
            if a.current_dpd == 0 {
                cured += 1;
            }
        }
        if a.prev_dpd >= 30 {
            over_30 += 1;
            if a.current_dpd >= 60 {
                rolled_60 += 1;
            }
            balance_30 += a.balance;
            recovered_30 += a.recovered;
        }
    }

    CollectionsRates {
        roll_rate_30: ratio(rolled_60 as f64, over_30 as f64),
        flow_rate: ratio(advanced as f64, delinquent as f64),
        recovery_rate: ratio(recovered_30, balance_30),
        cure_rate: ratio(cured as f64, delinquent as f64),
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}
