//! Metric profile dispatch.
//!
//! Maps a model type to the calculators it gets and assembles the metric set
//! in a fixed, profile-specific order:
//!
//! | profile     | metrics |
//! |-------------|---------|
//! | scorecard   | KS, PSI, AUC, Gini, CA_at_K, KS_threshold, bad_rate |
//! | fraud       | KS, PSI, AUC, AUC_PR, CA_at_K, precision_at_K, alert_rate, fpr_at_threshold, fraud_rate_in_alerts, bad_rate |
//! | collections | roll_rate_30, flow_rate, recovery_rate, cure_rate |
//!
//! Unknown model types fall back to the scorecard profile.

use chrono::Utc;
use tracing::{debug, warn};

use crate::domain::{
    CollectionsCohort, Evaluation, MetricKey, MetricOptions, MetricProfile, MetricSet, ModelType,
    ScorePopulation,
};
use crate::error::MetricsError;
use crate::metrics::auc::{average_precision, calculate_auc, capture_rate_at_k, gini_from_auc, precision_at_k};
use crate::metrics::collections::collections_rates;
use crate::metrics::decile::decile_table;
use crate::metrics::fraud::alert_metrics;
use crate::metrics::ks::ks_statistic;
use crate::metrics::psi::calculate_psi;
use crate::metrics::rag::classify;
use crate::metrics::ranking::RankedPopulation;

/// Resolve the profile, warning once for unrecognized tags.
pub fn resolve_profile(model_type: &ModelType) -> MetricProfile {
    if model_type.is_unknown() {
        warn!(model_type = %model_type, "unknown model type, using scorecard metrics");
    }
    model_type.profile()
}

/// Compute the metric set for `model_type` over a scored population.
///
/// `cohort` is only read by the collections profile; without one, the four
/// collections rates are reported as 0.
pub fn compute_metric_set(
    population: &ScorePopulation,
    model_type: &ModelType,
    options: &MetricOptions,
    cohort: Option<&CollectionsCohort>,
) -> Result<MetricSet, MetricsError> {
    options.validate()?;
    let ranked = RankedPopulation::build(population);
    metric_set_for(
        resolve_profile(model_type),
        population,
        &ranked,
        options,
        cohort,
    )
}

fn metric_set_for(
    profile: MetricProfile,
    population: &ScorePopulation,
    ranked: &RankedPopulation,
    options: &MetricOptions,
    cohort: Option<&CollectionsCohort>,
) -> Result<MetricSet, MetricsError> {
    match profile {
        MetricProfile::Scorecard => {
            let ks = ks_statistic(ranked);
            let auc = calculate_auc(ranked);
            let mut set = MetricSet::new();
            set.insert(MetricKey::Ks, ks.statistic);
            set.insert(MetricKey::Psi, population_psi(population, options.psi_bins)?);
            set.insert(MetricKey::Auc, auc);
            set.insert(MetricKey::Gini, gini_from_auc(auc));
            set.insert(
                MetricKey::CaptureRate(options.k_percent),
                capture_rate_at_k(ranked, options.k_percent)?,
            );
            set.insert(MetricKey::KsThreshold, ks.threshold);
            set.insert(MetricKey::BadRate, population.bad_rate());
            Ok(set)
        }
        MetricProfile::Fraud => {
            let alerts = alert_metrics(population, options.alert_threshold)?;
            let mut set = MetricSet::new();
            set.insert(MetricKey::Ks, ks_statistic(ranked).statistic);
            set.insert(MetricKey::Psi, population_psi(population, options.psi_bins)?);
            set.insert(MetricKey::Auc, calculate_auc(ranked));
            set.insert(MetricKey::AucPr, average_precision(ranked));
            set.insert(
                MetricKey::CaptureRate(options.k_percent),
                capture_rate_at_k(ranked, options.k_percent)?,
            );
            set.insert(
                MetricKey::PrecisionAt(options.precision_k_percent),
                precision_at_k(ranked, options.precision_k_percent)?,
            );
            set.insert(MetricKey::AlertRate, alerts.alert_rate);
            set.insert(MetricKey::FprAtThreshold, alerts.fpr);
            set.insert(MetricKey::FraudRateInAlerts, alerts.fraud_rate_in_alerts);
            set.insert(MetricKey::BadRate, population.bad_rate());
            Ok(set)
        }
        MetricProfile::Collections => {
            if cohort.is_none() {
                warn!("collections profile evaluated without a cohort; rates reported as 0");
            }
            Ok(collections_metric_set(cohort.unwrap_or(&CollectionsCohort::default())))
        }
    }
}

fn collections_metric_set(cohort: &CollectionsCohort) -> MetricSet {
    let rates = collections_rates(cohort);
    let mut set = MetricSet::new();
    set.insert(MetricKey::RollRate30, rates.roll_rate_30);
    set.insert(MetricKey::FlowRate, rates.flow_rate);
    set.insert(MetricKey::RecoveryRate, rates.recovery_rate);
    set.insert(MetricKey::CureRate, rates.cure_rate);
    set
}

fn population_psi(population: &ScorePopulation, bins: usize) -> Result<f64, MetricsError> {
    match population.baseline() {
        Some(baseline) => calculate_psi(baseline, &population.scores(), bins),
        None => {
            debug!("no baseline scores supplied, PSI defaults to 0");
            Ok(0.0)
        }
    }
}

/// Full evaluation of one scored population: metrics, deciles and RAG status.
pub fn evaluate(
    population: &ScorePopulation,
    model_type: &ModelType,
    options: &MetricOptions,
    segment: Option<&str>,
) -> Result<Evaluation, MetricsError> {
    options.validate()?;
    let profile = resolve_profile(model_type);
    let ranked = RankedPopulation::build(population);
    let metrics = metric_set_for(profile, population, &ranked, options, None)?;
    let rag = classify(metrics.ks(), metrics.psi());

    Ok(Evaluation {
        model_type: model_type.clone(),
        profile,
        segment: segment.map(str::to_string),
        volume: population.len(),
        deciles: decile_table(&ranked),
        metrics,
        rag,
        computed_at: Utc::now(),
    })
}

/// Evaluation of a collections cohort. There is no score ranking, so the
/// decile table is empty and RAG reads as red (no KS evidence).
pub fn evaluate_cohort(cohort: &CollectionsCohort, model_type: &ModelType, segment: Option<&str>) -> Evaluation {
    if model_type.profile() != MetricProfile::Collections {
        debug!(model_type = %model_type, "cohort input evaluated with the collections profile");
    }
    let metrics = collections_metric_set(cohort);
    Evaluation {
        model_type: model_type.clone(),
        profile: MetricProfile::Collections,
        segment: segment.map(str::to_string),
        volume: cohort.accounts.len(),
        rag: classify(metrics.ks(), metrics.psi()),
        metrics,
        deciles: Vec::new(),
        computed_at: Utc::now(),
    }
}
