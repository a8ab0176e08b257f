//! Rule-based commentary.
//!
//! - trend commentary across vintages (`trend`)
//! - decile separation commentary (`decile`)
//! - KS trigger explanation (`trigger`)
//! - narration strategies that assemble the final texts (`narrator`)

use serde::{Deserialize, Serialize};

use crate::domain::{DecileBucket, TrendSeries};

pub mod decile;
pub mod narrator;
pub mod trend;
pub mod trigger;

pub use decile::generate_decile_commentary;
pub use narrator::{LlmNarrator, Narrator, RuleNarrator, narrator_from_env};
pub use trend::{Polarity, TrendCommentary, generate_trend_commentary};
pub use trigger::generate_ks_trigger_insight;

/// The six commentary texts, keyed by purpose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commentary {
    pub volume_commentary: String,
    pub ks_commentary: String,
    pub psi_commentary: String,
    pub bad_rate_commentary: String,
    pub decile_commentary: String,
    pub ks_trigger_insight: String,
}

impl Commentary {
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("volume_commentary", self.volume_commentary.as_str()),
            ("ks_commentary", self.ks_commentary.as_str()),
            ("psi_commentary", self.psi_commentary.as_str()),
            ("bad_rate_commentary", self.bad_rate_commentary.as_str()),
            ("decile_commentary", self.decile_commentary.as_str()),
            ("ks_trigger_insight", self.ks_trigger_insight.as_str()),
        ]
    }
}

/// What a narrator sees.
///
/// `trend` is absent for a single-population evaluation; trend texts then
/// report insufficient data.
#[derive(Debug, Clone, Copy)]
pub struct CommentaryInput<'a> {
    pub trend: Option<&'a TrendSeries>,
    pub ks: Option<f64>,
    pub deciles: &'a [DecileBucket],
}

/// Build every commentary text from rules alone.
pub fn rule_commentary(input: &CommentaryInput<'_>) -> Commentary {
    let empty = TrendSeries::default();
    let trend = generate_trend_commentary(input.trend.unwrap_or(&empty));
    Commentary {
        volume_commentary: trend.volume,
        ks_commentary: trend.ks,
        psi_commentary: trend.psi,
        bad_rate_commentary: trend.bad_rate,
        decile_commentary: generate_decile_commentary(input.deciles),
        ks_trigger_insight: generate_ks_trigger_insight(input.ks, input.deciles),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_trend_means_insufficient_trend_texts() {
        let c = rule_commentary(&CommentaryInput {
            trend: None,
            ks: Some(0.35),
            deciles: &[],
        });
        for text in [&c.volume_commentary, &c.ks_commentary, &c.psi_commentary, &c.bad_rate_commentary] {
            assert!(text.starts_with("Insufficient data"), "{text}");
        }
        assert!(c.ks_trigger_insight.contains("healthy"));
        assert!(c.decile_commentary.contains("not computed"));
    }

    #[test]
    fn serializes_with_purpose_keys() {
        let c = rule_commentary(&CommentaryInput {
            trend: None,
            ks: None,
            deciles: &[],
        });
        let value = serde_json::to_value(&c).unwrap();
        for (key, text) in c.fields() {
            assert_eq!(value[key], text);
        }
    }
}
