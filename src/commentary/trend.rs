//! Trend commentary across vintages.
//!
//! Compares the first and last available value of a series. A relative change
//! under 5% reads as stable; otherwise the direction is judged by the metric's
//! polarity. Volume has no polarity and is reported as a raw increase or
//! decrease with the latest value.

use crate::domain::TrendSeries;

/// Relative change (in percent) below which a series reads as stable.
const STABLE_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendCommentary {
    pub volume: String,
    pub ks: String,
    pub psi: String,
    pub bad_rate: String,
}

pub fn generate_trend_commentary(series: &TrendSeries) -> TrendCommentary {
    TrendCommentary {
        volume: volume_commentary(&series.volume),
        ks: metric_trend_commentary("KS", &series.ks, Polarity::HigherIsBetter),
        psi: metric_trend_commentary("PSI", &series.psi, Polarity::LowerIsBetter),
        bad_rate: metric_trend_commentary("Bad rate", &series.bad_rate, Polarity::LowerIsBetter),
    }
}

/// Commentary for a metric series where some vintages may lack a value.
pub fn metric_trend_commentary(label: &str, values: &[Option<f64>], polarity: Polarity) -> String {
    let clean: Vec<f64> = values.iter().flatten().copied().collect();
    let (first, last) = match clean.as_slice() {
        [first, .., last] => (*first, *last),
        _ => return insufficient(label),
    };

    let Some(pct) = pct_change(first, last) else {
        if first == last {
            return format!("{label} trend: stable across vintages.");
        }
        return format!("Insufficient data to compute {label} trend: the first vintage value is zero.");
    };

    if pct.abs() < STABLE_PCT {
        return format!("{label} trend: stable across vintages ({pct:+.1}%).");
    }
    let direction = match (polarity, pct > 0.0) {
        (Polarity::HigherIsBetter, true) => "improving",
        (Polarity::HigherIsBetter, false) => "declining",
        (Polarity::LowerIsBetter, true) => "declining (higher than desired)",
        (Polarity::LowerIsBetter, false) => "improving (lower is better)",
    };
    format!("{label} trend: {direction} ({pct:+.1}%).")
}

pub fn volume_commentary(volumes: &[u64]) -> String {
    let (first, last) = match volumes {
        [first, .., last] => (*first, *last),
        _ => return insufficient("Volume"),
    };
    let Some(pct) = pct_change(first as f64, last as f64) else {
        return "Insufficient data to compute Volume trend: the first vintage has no volume.".to_string();
    };

    let latest = group_thousands(last);
    if pct.abs() < STABLE_PCT {
        format!("Volume trend: stable across vintages (latest: {latest}).")
    } else {
        let verb = if pct > 0.0 { "increased" } else { "decreased" };
        format!(
            "Volume trend: {verb} by {:.1}% from first to latest vintage (latest: {latest}).",
            pct.abs()
        )
    }
}

fn insufficient(label: &str) -> String {
    format!("Insufficient data to comment on {label} trend (fewer than two vintages).")
}

fn pct_change(first: f64, last: f64) -> Option<f64> {
    if first == 0.0 {
        None
    } else {
        Some((last - first) / first * 100.0)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
