//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - builds the run configuration
//! - runs the evaluation pipelines
//! - prints reports
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, DemoArgs, EvaluateArgs, MetricArgs, StabilityArgs, TrendArgs};
use crate::commentary::{Narrator, RuleNarrator, narrator_from_env};
use crate::data::sample::{SampleSpec, generate_sample};
use crate::domain::{EvalConfig, MetricOptions};
use crate::error::AppError;
use crate::io::ingest::IngestedScores;

pub mod pipeline;

const SUBCOMMANDS: [&str; 4] = ["evaluate", "trend", "stability", "demo"];

/// Entry point for the `mpm` binary.
pub fn run() -> Result<(), AppError> {
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Evaluate(args) => handle_evaluate(args),
        Command::Trend(args) => handle_trend(args),
        Command::Stability(args) => handle_stability(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = eval_config_from_args(&args);
    let narrator = narrator_for(&config);
    let run = pipeline::run_evaluate(&config, narrator.as_ref())?;
    finish_evaluation(&run, &config)
}

fn handle_trend(args: TrendArgs) -> Result<(), AppError> {
    let config = trend_config_from_args(&args);
    let narrator = narrator_for(&config);
    let run = pipeline::run_trend(&config, narrator.as_ref())?;
    finish_trend(&run, &config)
}

fn handle_stability(args: StabilityArgs) -> Result<(), AppError> {
    let run = pipeline::run_stability(&args.baseline, &args.current, args.psi_bins)?;
    println!("{}", crate::report::format_stability(&run));
    if let Some(path) = &args.export_json {
        crate::io::export::export_json(path, &run)?;
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let spec = SampleSpec {
        n: args.n,
        bad_rate: args.bad_rate,
        separation: args.separation,
        drift: args.drift,
        seed: args.seed,
        with_segments: !args.no_segments && args.vintages == 0,
        vintages: args.vintages,
    };
    let sample = generate_sample(&spec)?;
    info!(n = spec.n, seed = spec.seed, "generated synthetic population");
    let ingested = IngestedScores::from_sample(sample.rows);

    let config = EvalConfig {
        model_type: args.metrics.model_type.clone(),
        options: metric_options(&args.metrics),
        export_json: args.metrics.export_json.clone(),
        export_deciles: args.metrics.export_deciles.clone(),
        use_llm: args.metrics.llm,
        ..EvalConfig::default()
    };
    let narrator = narrator_for(&config);

    if args.vintages > 0 {
        let run = pipeline::trend_from_ingested(&ingested, &config, narrator.as_ref())?;
        finish_trend(&run, &config)
    } else {
        let run = pipeline::evaluate_ingested(&ingested, Some(sample.baseline), &config, narrator.as_ref())?;
        finish_evaluation(&run, &config)
    }
}

fn finish_evaluation(run: &pipeline::EvaluationRun, config: &EvalConfig) -> Result<(), AppError> {
    println!("{}", crate::report::format_evaluation(run));

    if let Some(path) = &config.export_json {
        crate::io::export::export_json(path, run)?;
    }
    if let Some(path) = &config.export_deciles {
        crate::io::export::export_deciles_csv(path, &run.all_evaluations())?;
    }
    Ok(())
}

fn finish_trend(run: &pipeline::TrendRun, config: &EvalConfig) -> Result<(), AppError> {
    println!("{}", crate::report::format_trend(run));

    if let Some(path) = &config.export_json {
        crate::io::export::export_json(path, run)?;
    }
    if let Some(path) = &config.export_deciles {
        let evaluations: Vec<_> = run.vintages.iter().map(|v| &v.evaluation).collect();
        crate::io::export::export_deciles_csv(path, &evaluations)?;
    }
    Ok(())
}

fn narrator_for(config: &EvalConfig) -> Box<dyn Narrator> {
    if config.use_llm {
        narrator_from_env()
    } else {
        Box::new(RuleNarrator)
    }
}

pub fn metric_options(args: &MetricArgs) -> MetricOptions {
    MetricOptions {
        k_percent: args.k_percent,
        precision_k_percent: args.precision_k_percent,
        alert_threshold: args.alert_threshold,
        psi_bins: args.psi_bins,
    }
}

pub fn eval_config_from_args(args: &EvaluateArgs) -> EvalConfig {
    EvalConfig {
        input_path: Some(args.input.clone()),
        baseline_path: args.baseline.clone(),
        model_type: args.metrics.model_type.clone(),
        options: metric_options(&args.metrics),
        segment_column: args.segment_column.clone(),
        export_json: args.metrics.export_json.clone(),
        export_deciles: args.metrics.export_deciles.clone(),
        use_llm: args.metrics.llm,
        ..EvalConfig::default()
    }
}

pub fn trend_config_from_args(args: &TrendArgs) -> EvalConfig {
    EvalConfig {
        input_path: Some(args.input.clone()),
        model_type: args.metrics.model_type.clone(),
        options: metric_options(&args.metrics),
        vintage_column: args.vintage_column.clone(),
        export_json: args.metrics.export_json.clone(),
        export_deciles: args.metrics.export_deciles.clone(),
        use_llm: args.metrics.llm,
        ..EvalConfig::default()
    }
}

/// Rewrite argv so `mpm` without a subcommand runs the demo.
///
/// Rules:
/// - `mpm`                          -> `mpm demo`
/// - `mpm -n 2000 --seed 7`         -> `mpm demo -n 2000 --seed 7`
/// - `mpm --help/--version/-h`      -> unchanged (show top-level help/version)
/// - any argv naming a subcommand   -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("demo".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let names_subcommand = argv.iter().skip(1).any(|a| SUBCOMMANDS.contains(&a.as_str()));
    if !names_subcommand && arg1.starts_with('-') {
        argv.insert(1, "demo".to_string());
    }
    argv
}
