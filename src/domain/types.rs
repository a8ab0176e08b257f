//! Shared domain types.
//!
//! These types are value objects created per invocation from caller-supplied
//! arrays. They are serializable so they can be:
//!
//! - returned to a calling layer that owns persistence
//! - exported to JSON/CSV
//! - printed as terminal reports

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MetricsError;

/// Round a metric to the 4 decimal places used in every reported metric set.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// One labeled, scored observation.
///
/// Callers name the columns differently; both `target`/`y` and
/// `score`/`probability` are accepted without normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(alias = "target", alias = "y")]
    pub true_label: u8,
    #[serde(alias = "score", alias = "probability")]
    pub predicted_score: f64,
}

impl ScoreRecord {
    pub fn new(true_label: u8, predicted_score: f64) -> Self {
        Self {
            true_label,
            predicted_score,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.true_label == 1
    }
}

/// A validated scored population plus an optional baseline score array.
///
/// Invariants (checked on construction):
/// - at least one record
/// - labels are 0 or 1
/// - every score (current and baseline) is finite
#[derive(Debug, Clone, PartialEq)]
pub struct ScorePopulation {
    records: Vec<ScoreRecord>,
    baseline: Option<Vec<f64>>,
}

impl ScorePopulation {
    pub fn from_records(records: Vec<ScoreRecord>) -> Result<Self, MetricsError> {
        if records.is_empty() {
            return Err(MetricsError::EmptyPopulation);
        }
        for (index, r) in records.iter().enumerate() {
            if r.true_label > 1 {
                return Err(MetricsError::InvalidLabel {
                    index,
                    value: i64::from(r.true_label),
                });
            }
            if !r.predicted_score.is_finite() {
                return Err(MetricsError::NonFiniteScore { index });
            }
        }
        Ok(Self {
            records,
            baseline: None,
        })
    }

    /// Build a population from parallel label/score arrays.
    pub fn from_arrays(labels: &[u8], scores: &[f64]) -> Result<Self, MetricsError> {
        if labels.len() != scores.len() {
            return Err(MetricsError::LengthMismatch {
                left_name: "labels",
                left: labels.len(),
                right_name: "scores",
                right: scores.len(),
            });
        }
        let records = labels
            .iter()
            .zip(scores)
            .map(|(&label, &score)| ScoreRecord::new(label, score))
            .collect();
        Self::from_records(records)
    }

    /// Attach a baseline score distribution (used only by PSI).
    ///
    /// An empty baseline is the same as no baseline.
    pub fn with_baseline(mut self, baseline: Vec<f64>) -> Result<Self, MetricsError> {
        if let Some(index) = baseline.iter().position(|v| !v.is_finite()) {
            return Err(MetricsError::NonFiniteScore { index });
        }
        self.baseline = if baseline.is_empty() { None } else { Some(baseline) };
        Ok(self)
    }

    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    pub fn baseline(&self) -> Option<&[f64]> {
        self.baseline.as_deref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a constructed population; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.predicted_score).collect()
    }

    pub fn positives(&self) -> usize {
        self.records.iter().filter(|r| r.is_positive()).count()
    }

    pub fn bad_rate(&self) -> f64 {
        self.positives() as f64 / self.records.len() as f64
    }
}

/// Scorecard-family model types. They all share the scorecard metric profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScorecardKind {
    Acquisition,
    Ecm,
    Bureau,
    Ml,
}

/// Model-type tag attached to an evaluation request.
///
/// Unrecognized tags are preserved in `Unknown` and evaluated with the
/// scorecard profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelType {
    Scorecard(ScorecardKind),
    Fraud,
    Collections,
    Unknown(String),
}

/// Which calculators (and which metric names) a model type gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricProfile {
    Scorecard,
    Fraud,
    Collections,
}

impl ModelType {
    /// Parse a free-form model-type tag (case-insensitive).
    ///
    /// Accepts registry display names ("Acquisition Scorecard", "ECM Scorecard")
    /// and short forms ("acquisition", "ecm", "fraud").
    pub fn from_tag(tag: &str) -> Self {
        let normalized = tag
            .trim()
            .to_ascii_lowercase()
            .replace(['_', '-'], " ");
        let normalized = normalized
            .strip_suffix(" scorecard")
            .unwrap_or(&normalized)
            .trim()
            .to_string();

        match normalized.as_str() {
            "acquisition" | "acq" => ModelType::Scorecard(ScorecardKind::Acquisition),
            "ecm" => ModelType::Scorecard(ScorecardKind::Ecm),
            "bureau" | "bur" => ModelType::Scorecard(ScorecardKind::Bureau),
            "ml" => ModelType::Scorecard(ScorecardKind::Ml),
            "fraud" | "transaction fraud" | "frd" => ModelType::Fraud,
            "collections" | "collection" | "col" => ModelType::Collections,
            _ => ModelType::Unknown(tag.trim().to_string()),
        }
    }

    /// Human-readable tag (matches the registry naming).
    pub fn tag(&self) -> &str {
        match self {
            ModelType::Scorecard(ScorecardKind::Acquisition) => "Acquisition Scorecard",
            ModelType::Scorecard(ScorecardKind::Ecm) => "ECM Scorecard",
            ModelType::Scorecard(ScorecardKind::Bureau) => "Bureau",
            ModelType::Scorecard(ScorecardKind::Ml) => "ML",
            ModelType::Fraud => "Fraud",
            ModelType::Collections => "Collections",
            ModelType::Unknown(tag) => tag,
        }
    }

    pub fn profile(&self) -> MetricProfile {
        match self {
            ModelType::Scorecard(_) | ModelType::Unknown(_) => MetricProfile::Scorecard,
            ModelType::Fraud => MetricProfile::Fraud,
            ModelType::Collections => MetricProfile::Collections,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ModelType::Unknown(_))
    }
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::Scorecard(ScorecardKind::Acquisition)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Serialize for ModelType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for ModelType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(ModelType::from_tag(&tag))
    }
}

/// Name of a reported metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricKey {
    Ks,
    Psi,
    Auc,
    Gini,
    /// Capture rate at the top K percent of the population.
    CaptureRate(f64),
    KsThreshold,
    AucPr,
    /// Precision at the top K percent of the population.
    PrecisionAt(f64),
    AlertRate,
    FprAtThreshold,
    FraudRateInAlerts,
    BadRate,
    RollRate30,
    FlowRate,
    RecoveryRate,
    CureRate,
}

impl MetricKey {
    pub fn name(&self) -> String {
        match self {
            MetricKey::Ks => "KS".to_string(),
            MetricKey::Psi => "PSI".to_string(),
            MetricKey::Auc => "AUC".to_string(),
            MetricKey::Gini => "Gini".to_string(),
            MetricKey::CaptureRate(k) => format!("CA_at_{}", fmt_percent(*k)),
            MetricKey::KsThreshold => "KS_threshold".to_string(),
            MetricKey::AucPr => "AUC_PR".to_string(),
            MetricKey::PrecisionAt(k) => format!("precision_at_{}", fmt_percent(*k)),
            MetricKey::AlertRate => "alert_rate".to_string(),
            MetricKey::FprAtThreshold => "fpr_at_threshold".to_string(),
            MetricKey::FraudRateInAlerts => "fraud_rate_in_alerts".to_string(),
            MetricKey::BadRate => "bad_rate".to_string(),
            MetricKey::RollRate30 => "roll_rate_30".to_string(),
            MetricKey::FlowRate => "flow_rate".to_string(),
            MetricKey::RecoveryRate => "recovery_rate".to_string(),
            MetricKey::CureRate => "cure_rate".to_string(),
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

fn fmt_percent(k: f64) -> String {
    if k.fract() == 0.0 {
        format!("{}", k as i64)
    } else {
        format!("{k}")
    }
}

/// Ordered metric name → value mapping.
///
/// Values are rounded to 4 decimal places when inserted; accumulation
/// upstream always happens at full precision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSet {
    entries: Vec<(MetricKey, f64)>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a metric, rounding it to 4 decimals.
    pub fn insert(&mut self, key: MetricKey, value: f64) {
        let value = round4(value);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: MetricKey) -> Option<f64> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    /// Look a metric up by its reported name (e.g. `"CA_at_10"`).
    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k.name() == name)
            .map(|(_, v)| *v)
    }

    pub fn ks(&self) -> Option<f64> {
        self.get(MetricKey::Ks)
    }

    pub fn psi(&self) -> Option<f64> {
        self.get(MetricKey::Psi)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKey, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for MetricSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(&key.name(), value)?;
        }
        map.end()
    }
}

/// One of ten score-ranked population bands. Decile 1 holds the highest scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecileBucket {
    pub decile: u8,
    pub count: usize,
    pub bad_count: usize,
    /// `None` for an empty band (populations smaller than ten records).
    pub bad_rate: Option<f64>,
}

/// Traffic-light health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RagStatus {
    Green,
    Amber,
    Red,
}

impl RagStatus {
    pub const ALL: [RagStatus; 3] = [RagStatus::Green, RagStatus::Amber, RagStatus::Red];

    pub fn label(self) -> &'static str {
        match self {
            RagStatus::Green => "green",
            RagStatus::Amber => "amber",
            RagStatus::Red => "red",
        }
    }
}

impl fmt::Display for RagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-model metric history across vintages (ascending).
///
/// Metric entries are optional because a vintage may not carry every metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub vintages: Vec<String>,
    pub ks: Vec<Option<f64>>,
    pub psi: Vec<Option<f64>>,
    pub volume: Vec<u64>,
    pub bad_rate: Vec<Option<f64>>,
}

impl TrendSeries {
    pub fn new(
        vintages: Vec<String>,
        ks: Vec<Option<f64>>,
        psi: Vec<Option<f64>>,
        volume: Vec<u64>,
        bad_rate: Vec<Option<f64>>,
    ) -> Result<Self, MetricsError> {
        let n = vintages.len();
        for (name, len) in [
            ("ks", ks.len()),
            ("psi", psi.len()),
            ("volume", volume.len()),
            ("bad_rate", bad_rate.len()),
        ] {
            if len != n {
                return Err(MetricsError::LengthMismatch {
                    left_name: "vintages",
                    left: n,
                    right_name: name,
                    right: len,
                });
            }
        }
        Ok(Self {
            vintages,
            ks,
            psi,
            volume,
            bad_rate,
        })
    }

    pub fn len(&self) -> usize {
        self.vintages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vintages.is_empty()
    }
}

/// PSI of a single input variable with its stability tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableStabilityRecord {
    pub variable: String,
    pub psi: f64,
    pub status: RagStatus,
}

/// One account's delinquency movement between two observation points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelinquencyRecord {
    pub prev_dpd: u32,
    pub current_dpd: u32,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub recovered: f64,
}

/// Account-level cohort used by the collections profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionsCohort {
    pub accounts: Vec<DelinquencyRecord>,
}

/// Knobs for the score-based calculators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricOptions {
    /// Top-K percent used for capture rate (`CA_at_K`).
    pub k_percent: f64,
    /// Top-K percent used for fraud precision (`precision_at_K`).
    pub precision_k_percent: f64,
    /// Score at or above which a fraud model raises an alert.
    pub alert_threshold: f64,
    /// Number of equal-width PSI bins.
    pub psi_bins: usize,
}

impl Default for MetricOptions {
    fn default() -> Self {
        Self {
            k_percent: 10.0,
            precision_k_percent: 5.0,
            alert_threshold: 0.5,
            psi_bins: 10,
        }
    }
}

impl MetricOptions {
    pub fn validate(&self) -> Result<(), MetricsError> {
        validate_percent(self.k_percent)?;
        validate_percent(self.precision_k_percent)?;
        if !self.alert_threshold.is_finite() {
            return Err(MetricsError::InvalidThreshold(self.alert_threshold));
        }
        if self.psi_bins == 0 {
            return Err(MetricsError::InvalidBinCount);
        }
        Ok(())
    }
}

pub fn validate_percent(k_percent: f64) -> Result<(), MetricsError> {
    if k_percent.is_finite() && k_percent > 0.0 && k_percent <= 100.0 {
        Ok(())
    } else {
        Err(MetricsError::InvalidPercent(k_percent))
    }
}

/// Result of evaluating one population (whole model or one segment).
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub model_type: ModelType,
    pub profile: MetricProfile,
    pub segment: Option<String>,
    pub volume: usize,
    pub metrics: MetricSet,
    pub rag: RagStatus,
    pub deciles: Vec<DecileBucket>,
    pub computed_at: DateTime<Utc>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// `None` when the population is generated rather than read.
    pub input_path: Option<PathBuf>,
    pub baseline_path: Option<PathBuf>,
    pub model_type: ModelType,
    pub options: MetricOptions,

    /// Column that splits the population into segments (e.g. thin/thick file).
    pub segment_column: String,
    /// Column that holds the vintage label for trend runs.
    pub vintage_column: String,

    pub export_json: Option<PathBuf>,
    pub export_deciles: Option<PathBuf>,

    /// Try the external narrator before the rule-based commentary.
    pub use_llm: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            input_path: None,
            baseline_path: None,
            model_type: ModelType::default(),
            options: MetricOptions::default(),
            segment_column: "segment".to_string(),
            vintage_column: "vintage".to_string(),
            export_json: None,
            export_deciles: None,
            use_llm: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_record_accepts_column_aliases() {
        let a: ScoreRecord = serde_json::from_str(r#"{"target": 1, "score": 0.8}"#).unwrap();
        let b: ScoreRecord = serde_json::from_str(r#"{"y": 0, "probability": 0.25}"#).unwrap();
        assert_eq!(a, ScoreRecord::new(1, 0.8));
        assert_eq!(b, ScoreRecord::new(0, 0.25));
    }

    #[test]
    fn population_rejects_contract_violations() {
        assert_eq!(
            ScorePopulation::from_arrays(&[1, 0], &[0.5]).unwrap_err(),
            MetricsError::LengthMismatch {
                left_name: "labels",
                left: 2,
                right_name: "scores",
                right: 1
            }
        );
        assert_eq!(
            ScorePopulation::from_arrays(&[], &[]).unwrap_err(),
            MetricsError::EmptyPopulation
        );
        assert_eq!(
            ScorePopulation::from_arrays(&[0, 2], &[0.1, 0.2]).unwrap_err(),
            MetricsError::InvalidLabel { index: 1, value: 2 }
        );
        assert_eq!(
            ScorePopulation::from_arrays(&[0, 1], &[0.1, f64::NAN]).unwrap_err(),
            MetricsError::NonFiniteScore { index: 1 }
        );
    }

    #[test]
    fn empty_baseline_is_no_baseline() {
        let pop = ScorePopulation::from_arrays(&[1, 0], &[0.9, 0.1])
            .unwrap()
            .with_baseline(Vec::new())
            .unwrap();
        assert!(pop.baseline().is_none());
    }

    #[test]
    fn model_type_tags_parse_case_insensitively() {
        assert_eq!(
            ModelType::from_tag("Acquisition Scorecard"),
            ModelType::Scorecard(ScorecardKind::Acquisition)
        );
        assert_eq!(
            ModelType::from_tag("ecm_scorecard"),
            ModelType::Scorecard(ScorecardKind::Ecm)
        );
        assert_eq!(ModelType::from_tag("FRAUD"), ModelType::Fraud);
        assert_eq!(ModelType::from_tag(" collections "), ModelType::Collections);
        assert_eq!(
            ModelType::from_tag("Behavioural"),
            ModelType::Unknown("Behavioural".to_string())
        );
    }

    #[test]
    fn unknown_model_type_uses_scorecard_profile() {
        assert_eq!(
            ModelType::from_tag("something-new").profile(),
            MetricProfile::Scorecard
        );
        assert_eq!(ModelType::Fraud.profile(), MetricProfile::Fraud);
    }

    #[test]
    fn metric_set_rounds_and_serializes_by_name() {
        let mut set = MetricSet::new();
        set.insert(MetricKey::Ks, 0.123_456);
        set.insert(MetricKey::CaptureRate(10.0), 0.5);
        set.insert(MetricKey::Ks, 0.412_349);
        assert_eq!(set.ks(), Some(0.4123));
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_by_name("CA_at_10"), Some(0.5));

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"KS":0.4123,"CA_at_10":0.5}"#);
    }

    #[test]
    fn fractional_percent_keeps_decimal_in_name() {
        assert_eq!(MetricKey::PrecisionAt(2.5).name(), "precision_at_2.5");
        assert_eq!(MetricKey::PrecisionAt(5.0).name(), "precision_at_5");
    }

    #[test]
    fn trend_series_requires_parallel_lengths() {
        let err = TrendSeries::new(
            vec!["2024-01".into(), "2024-02".into()],
            vec![Some(0.3), Some(0.31)],
            vec![Some(0.05)],
            vec![100, 120],
            vec![None, None],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MetricsError::LengthMismatch { right_name: "psi", .. }
        ));
    }

    #[test]
    fn metric_options_reject_bad_values() {
        let mut opts = MetricOptions::default();
        assert!(opts.validate().is_ok());
        opts.k_percent = 0.0;
        assert_eq!(opts.validate(), Err(MetricsError::InvalidPercent(0.0)));
        opts.k_percent = 10.0;
        opts.psi_bins = 0;
        assert_eq!(opts.validate(), Err(MetricsError::InvalidBinCount));
    }
}
