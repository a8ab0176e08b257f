//! Command-line parsing for the model performance monitor.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! command dispatch (`app`) and from the metric code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::ModelType;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "mpm",
    version,
    about = "Model performance monitoring: KS, PSI, AUC, deciles, RAG status and commentary"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate a scored population (and its segments) from CSV.
    ///
    /// For the collections profile the input is read as an account cohort
    /// (`prev_dpd,current_dpd,balance,recovered`).
    Evaluate(EvaluateArgs),
    /// Evaluate every vintage of a scored panel and comment on the trends.
    Trend(TrendArgs),
    /// Variable-level PSI between a baseline and a current feature file.
    Stability(StabilityArgs),
    /// Generate a seeded synthetic population and evaluate it.
    Demo(DemoArgs),
}

/// Options shared by every command that computes a metric set.
#[derive(Debug, Args, Clone)]
pub struct MetricArgs {
    /// Model type (acquisition, ecm, bureau, ml, fraud, collections, or a registry name).
    #[arg(short = 't', long, default_value = "acquisition", value_parser = parse_model_type)]
    pub model_type: ModelType,

    /// Top-K percent for capture rate (CA_at_K).
    #[arg(short = 'k', long, default_value_t = 10.0)]
    pub k_percent: f64,

    /// Top-K percent for fraud precision (precision_at_K).
    #[arg(long, default_value_t = 5.0)]
    pub precision_k_percent: f64,

    /// Score at or above which a fraud model raises an alert.
    #[arg(long, default_value_t = 0.5)]
    pub alert_threshold: f64,

    /// Number of equal-width PSI bins.
    #[arg(long, default_value_t = 10)]
    pub psi_bins: usize,

    /// Export the full run result to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Export decile tables to CSV.
    #[arg(long = "export-deciles", value_name = "CSV")]
    pub export_deciles: Option<PathBuf>,

    /// Rewrite commentary with an OpenAI-compatible chat model (needs OPENAI_API_KEY).
    #[arg(long)]
    pub llm: bool,
}

#[derive(Debug, Args, Clone)]
pub struct EvaluateArgs {
    /// CSV with a label column (true_label/target/y) and a score column
    /// (predicted_score/score/probability).
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: PathBuf,

    /// CSV whose score column is the PSI baseline.
    #[arg(short = 'b', long, value_name = "CSV")]
    pub baseline: Option<PathBuf>,

    /// Column that splits the population into segments.
    #[arg(long, default_value = "segment")]
    pub segment_column: String,

    #[command(flatten)]
    pub metrics: MetricArgs,
}

#[derive(Debug, Args, Clone)]
pub struct TrendArgs {
    /// Scored panel CSV with a vintage column.
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: PathBuf,

    /// Column holding the vintage label (sorted ascending as text).
    #[arg(long, default_value = "vintage")]
    pub vintage_column: String,

    #[command(flatten)]
    pub metrics: MetricArgs,
}

#[derive(Debug, Args, Clone)]
pub struct StabilityArgs {
    /// Baseline feature CSV.
    #[arg(short = 'b', long, value_name = "CSV")]
    pub baseline: PathBuf,

    /// Current feature CSV.
    #[arg(short = 'c', long, value_name = "CSV")]
    pub current: PathBuf,

    /// Number of equal-width PSI bins.
    #[arg(long, default_value_t = 10)]
    pub psi_bins: usize,

    /// Export the variable table to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Number of synthetic records.
    #[arg(short = 'n', long, default_value_t = 5000)]
    pub n: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Latent shift between bads and goods; 0 means an uninformative model.
    #[arg(long, default_value_t = 1.0)]
    pub separation: f64,

    /// Share of bads in the population.
    #[arg(long, default_value_t = 0.1)]
    pub bad_rate: f64,

    /// Latent shift between baseline and current scores.
    #[arg(long, default_value_t = 0.0)]
    pub drift: f64,

    /// Do not tag records with thin/thick-file segments.
    #[arg(long)]
    pub no_segments: bool,

    /// Spread records over N monthly vintages and run a trend instead.
    #[arg(long, default_value_t = 0)]
    pub vintages: usize,

    #[command(flatten)]
    pub metrics: MetricArgs,
}

fn parse_model_type(raw: &str) -> Result<ModelType, String> {
    if raw.trim().is_empty() {
        return Err("model type must not be empty".to_string());
    }
    Ok(ModelType::from_tag(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScorecardKind;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn evaluate_defaults() {
        let cli = Cli::parse_from(["mpm", "evaluate", "--input", "scores.csv"]);
        let Command::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(args.segment_column, "segment");
        assert_eq!(args.metrics.k_percent, 10.0);
        assert_eq!(
            args.metrics.model_type,
            ModelType::Scorecard(ScorecardKind::Acquisition)
        );
        assert!(!args.metrics.llm);
    }

    #[test]
    fn global_verbosity_and_model_type() {
        let cli = Cli::parse_from(["mpm", "demo", "-vv", "--model-type", "Fraud", "--vintages", "4"]);
        assert_eq!(cli.verbose, 2);
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.metrics.model_type, ModelType::Fraud);
        assert_eq!(args.vintages, 4);
    }
}
