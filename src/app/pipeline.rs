//! Shared evaluation pipelines used by every subcommand.
//!
//! Keeping the workflows in one place avoids duplicating them between file
//! input and generated demo input:
//!
//! - evaluate: ingest -> population (+ baseline) -> whole + per-segment evaluation -> commentary
//! - trend: ingest -> group by vintage -> per-vintage evaluation -> trend series -> commentary
//! - stability: two feature tables -> per-variable PSI -> trigger insight
//!
//! Segments and vintages are independent, so they are evaluated in parallel.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::commentary::{Commentary, CommentaryInput, Narrator};
use crate::domain::{
    EvalConfig, Evaluation, MetricKey, MetricProfile, ScorePopulation, ScoreRecord, TrendSeries,
    VariableStabilityRecord,
};
use crate::error::AppError;
use crate::io::ingest::{
    ColumnSpec, FeatureTable, IngestedCohort, IngestedScores, RowError, load_baseline_scores, load_cohort,
    load_feature_table, load_scored_rows,
};
use crate::metrics::rag::portfolio_breakdown;
use crate::metrics::stability::{FeatureSample, psi_trigger_insight, variable_stability};
use crate::metrics::{evaluate, evaluate_cohort};

/// Row accounting for one ingest.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

impl From<&IngestedScores> for IngestSummary {
    fn from(ingested: &IngestedScores) -> Self {
        Self {
            rows_read: ingested.rows_read,
            rows_used: ingested.rows_used(),
            row_errors: ingested.row_errors.clone(),
        }
    }
}

impl From<&IngestedCohort> for IngestSummary {
    fn from(ingested: &IngestedCohort) -> Self {
        Self {
            rows_read: ingested.rows_read,
            rows_used: ingested.cohort.accounts.len(),
            row_errors: ingested.row_errors.clone(),
        }
    }
}

/// All computed outputs of a single `mpm evaluate` run.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRun {
    pub ingest: IngestSummary,
    pub overall: Evaluation,
    pub segments: Vec<Evaluation>,
    /// Status counts across segments (or the whole population if unsegmented).
    pub rag_breakdown: BTreeMap<&'static str, usize>,
    pub commentary: Commentary,
    pub narrator: &'static str,
}

impl EvaluationRun {
    /// The whole-population evaluation followed by every segment.
    pub fn all_evaluations(&self) -> Vec<&Evaluation> {
        std::iter::once(&self.overall).chain(&self.segments).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VintageEvaluation {
    pub vintage: String,
    pub evaluation: Evaluation,
}

/// All computed outputs of a single `mpm trend` run.
#[derive(Debug, Clone, Serialize)]
pub struct TrendRun {
    pub ingest: IngestSummary,
    pub vintages: Vec<VintageEvaluation>,
    pub series: TrendSeries,
    pub rag_breakdown: BTreeMap<&'static str, usize>,
    pub commentary: Commentary,
    pub narrator: &'static str,
}

/// All computed outputs of a single `mpm stability` run.
#[derive(Debug, Clone, Serialize)]
pub struct StabilityRun {
    pub variables: Vec<VariableStabilityRecord>,
    pub psi_trigger_insight: String,
    /// Numeric columns present in only one of the two files.
    pub unmatched: Vec<String>,
}

/// Read the configured input (and optional baseline) and evaluate it.
pub fn run_evaluate(config: &EvalConfig, narrator: &dyn Narrator) -> Result<EvaluationRun, AppError> {
    let input = config
        .input_path
        .as_deref()
        .ok_or_else(|| AppError::new(2, "No input file given."))?;

    if config.model_type.profile() == MetricProfile::Collections {
        let cohort = load_cohort(input)?;
        return Ok(evaluate_cohort_input(&cohort, config, narrator));
    }

    let ingested = load_scored_rows(input, &column_spec(config))?;
    let baseline = match &config.baseline_path {
        Some(path) => Some(load_baseline_scores(path)?),
        None => None,
    };
    evaluate_ingested(&ingested, baseline, config, narrator)
}

/// Evaluate already-ingested rows: whole population plus each segment.
pub fn evaluate_ingested(
    ingested: &IngestedScores,
    baseline: Option<Vec<f64>>,
    config: &EvalConfig,
    narrator: &dyn Narrator,
) -> Result<EvaluationRun, AppError> {
    let population = with_optional_baseline(ingested.population()?, baseline.as_deref())?;
    let overall = evaluate(&population, &config.model_type, &config.options, None)?;
    info!(
        volume = overall.volume,
        rag = %overall.rag,
        "evaluated whole population"
    );

    let groups = group_by(ingested, |row| row.segment.as_deref());
    let segments = groups
        .par_iter()
        .map(|(segment, records)| -> Result<Evaluation, AppError> {
            let pop = with_optional_baseline(ScorePopulation::from_records(records.clone())?, baseline.as_deref())?;
            Ok(evaluate(&pop, &config.model_type, &config.options, Some(segment.as_str()))?)
        })
        .collect::<Result<Vec<Evaluation>, AppError>>()?;
    if !segments.is_empty() {
        info!(segments = segments.len(), "evaluated segments");
    }

    let rag_breakdown = if segments.is_empty() {
        portfolio_breakdown([overall.rag])
    } else {
        portfolio_breakdown(segments.iter().map(|e| e.rag))
    };

    let commentary = narrator.narrate(&CommentaryInput {
        trend: None,
        ks: overall.metrics.ks(),
        deciles: &overall.deciles,
    });

    Ok(EvaluationRun {
        ingest: IngestSummary::from(ingested),
        overall,
        segments,
        rag_breakdown,
        commentary,
        narrator: narrator.name(),
    })
}

fn evaluate_cohort_input(ingested: &IngestedCohort, config: &EvalConfig, narrator: &dyn Narrator) -> EvaluationRun {
    let overall = evaluate_cohort(&ingested.cohort, &config.model_type, None);
    let commentary = narrator.narrate(&CommentaryInput {
        trend: None,
        ks: None,
        deciles: &[],
    });
    EvaluationRun {
        ingest: IngestSummary::from(ingested),
        rag_breakdown: portfolio_breakdown([overall.rag]),
        overall,
        segments: Vec::new(),
        commentary,
        narrator: narrator.name(),
    }
}

pub fn run_trend(config: &EvalConfig, narrator: &dyn Narrator) -> Result<TrendRun, AppError> {
    let input = config
        .input_path
        .as_deref()
        .ok_or_else(|| AppError::new(2, "No input file given."))?;
    let ingested = load_scored_rows(input, &column_spec(config))?;
    trend_from_ingested(&ingested, config, narrator)
}

/// Evaluate each vintage and build the trend series.
///
/// The earliest vintage's scores are the PSI baseline for every later vintage;
/// the earliest vintage itself has no PSI.
pub fn trend_from_ingested(
    ingested: &IngestedScores,
    config: &EvalConfig,
    narrator: &dyn Narrator,
) -> Result<TrendRun, AppError> {
    if config.model_type.profile() == MetricProfile::Collections {
        return Err(AppError::new(
            2,
            "Trend runs need scored rows; the collections profile is evaluated per cohort.",
        ));
    }

    let groups = group_by(ingested, |row| row.vintage.as_deref());
    let unlabeled = ingested.rows.iter().filter(|r| r.vintage.is_none()).count();
    if unlabeled > 0 {
        warn!(rows = unlabeled, "rows without a vintage were ignored");
    }
    let Some((_, first_records)) = groups.first() else {
        return Err(AppError::new(
            3,
            format!("No rows carry a `{}` value.", config.vintage_column),
        ));
    };
    let baseline: Vec<f64> = first_records.iter().map(|r| r.predicted_score).collect();

    let vintages = groups
        .par_iter()
        .enumerate()
        .map(|(idx, (vintage, records))| -> Result<VintageEvaluation, AppError> {
            let mut pop = ScorePopulation::from_records(records.clone())?;
            if idx > 0 {
                pop = pop.with_baseline(baseline.clone())?;
            }
            let evaluation = evaluate(&pop, &config.model_type, &config.options, None)?;
            Ok(VintageEvaluation {
                vintage: vintage.clone(),
                evaluation,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;
    info!(vintages = vintages.len(), "evaluated vintages");

    let series = TrendSeries::new(
        vintages.iter().map(|v| v.vintage.clone()).collect(),
        vintages.iter().map(|v| v.evaluation.metrics.ks()).collect(),
        vintages
            .iter()
            .enumerate()
            .map(|(idx, v)| if idx == 0 { None } else { v.evaluation.metrics.psi() })
            .collect(),
        vintages.iter().map(|v| v.evaluation.volume as u64).collect(),
        vintages
            .iter()
            .map(|v| v.evaluation.metrics.get(MetricKey::BadRate))
            .collect(),
    )?;

    let rag_breakdown = portfolio_breakdown(vintages.iter().map(|v| v.evaluation.rag));
    let latest = &vintages[vintages.len() - 1].evaluation;
    let commentary = narrator.narrate(&CommentaryInput {
        trend: Some(&series),
        ks: latest.metrics.ks(),
        deciles: &latest.deciles,
    });

    Ok(TrendRun {
        ingest: IngestSummary::from(ingested),
        vintages,
        series,
        rag_breakdown,
        commentary,
        narrator: narrator.name(),
    })
}

pub fn run_stability(
    baseline: &std::path::Path,
    current: &std::path::Path,
    bins: usize,
) -> Result<StabilityRun, AppError> {
    let baseline = load_feature_table(baseline)?;
    let current = load_feature_table(current)?;
    stability_from_tables(&baseline, &current, bins)
}

/// Variable-level PSI for every numeric column the two tables share.
pub fn stability_from_tables(
    baseline: &FeatureTable,
    current: &FeatureTable,
    bins: usize,
) -> Result<StabilityRun, AppError> {
    let features: Vec<FeatureSample<'_>> = baseline
        .columns
        .iter()
        .filter_map(|name| {
            Some(FeatureSample {
                name: name.as_str(),
                baseline: baseline.column(name)?,
                current: current.column(name)?,
            })
        })
        .collect();
    if features.is_empty() {
        return Err(AppError::new(
            3,
            "Baseline and current files share no numeric feature columns.",
        ));
    }

    let shared: BTreeSet<&str> = features.iter().map(|f| f.name).collect();
    let unmatched: Vec<String> = baseline
        .columns
        .iter()
        .chain(&current.columns)
        .filter(|c| !shared.contains(c.as_str()))
        .cloned()
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();
    if !unmatched.is_empty() {
        warn!(columns = ?unmatched, "columns present in only one file were skipped");
    }

    let variables = variable_stability(&features, bins)?;
    let psi_trigger_insight = psi_trigger_insight(&variables);
    Ok(StabilityRun {
        variables,
        psi_trigger_insight,
        unmatched,
    })
}

fn column_spec(config: &EvalConfig) -> ColumnSpec {
    ColumnSpec {
        segment_column: config.segment_column.clone(),
        vintage_column: config.vintage_column.clone(),
    }
}

fn with_optional_baseline(
    population: ScorePopulation,
    baseline: Option<&[f64]>,
) -> Result<ScorePopulation, AppError> {
    match baseline {
        Some(b) => Ok(population.with_baseline(b.to_vec())?),
        None => Ok(population),
    }
}

/// Group records by a key, ascending; rows without a key are left out.
fn group_by<'a, F>(ingested: &'a IngestedScores, key: F) -> Vec<(String, Vec<ScoreRecord>)>
where
    F: Fn(&'a crate::io::ingest::ScoredRow) -> Option<&'a str>,
{
    let mut groups: BTreeMap<String, Vec<ScoreRecord>> = BTreeMap::new();
    for row in &ingested.rows {
        if let Some(k) = key(row) {
            groups.entry(k.to_string()).or_default().push(row.record);
        }
    }
    groups.into_iter().collect()
}
