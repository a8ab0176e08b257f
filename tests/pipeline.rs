//! End-to-end: CSV ingest -> evaluation -> commentary -> exports, all in memory.

use model_perf_monitor::app::pipeline::{evaluate_ingested, stability_from_tables, trend_from_ingested};
use model_perf_monitor::commentary::RuleNarrator;
use model_perf_monitor::domain::{EvalConfig, MetricKey, ModelType, RagStatus};
use model_perf_monitor::io::{
    ColumnSpec, read_baseline_scores, read_feature_table, read_scored_rows, write_deciles_csv, write_json,
};

fn scored_csv() -> String {
    let mut csv = String::from("target,probability,segment,vintage\n");
    for i in 0..200 {
        // Bads sit at the top of the score range for every vintage.
        let bad = i % 5 == 0;
        let score = if bad { 0.6 + (i % 7) as f64 / 100.0 } else { 0.1 + (i % 40) as f64 / 100.0 };
        let segment = if i % 2 == 0 { "thin_file" } else { "thick_file" };
        let vintage = ["2024-01", "2024-02"][i % 2];
        csv.push_str(&format!("{},{score},{segment},{vintage}\n", u8::from(bad)));
    }
    csv.push_str("7,0.5,thin_file,2024-01\n");
    csv
}

#[test]
fn evaluate_from_csv_and_export() {
    let csv = scored_csv();
    let ingested = read_scored_rows(csv.as_bytes(), &ColumnSpec::default()).unwrap();
    assert_eq!(ingested.rows_used(), 200);
    assert_eq!(ingested.row_errors.len(), 1);
    assert_eq!(ingested.row_errors[0].line, 202);

    let baseline = read_baseline_scores("score\n0.1\n0.2\n0.3\n0.4\n0.5\n0.6\n".as_bytes()).unwrap();
    let run = evaluate_ingested(&ingested, Some(baseline), &EvalConfig::default(), &RuleNarrator).unwrap();

    assert_eq!(run.overall.metrics.ks(), Some(1.0));
    assert_eq!(run.overall.metrics.get(MetricKey::Auc), Some(1.0));
    assert_eq!(run.overall.metrics.get(MetricKey::BadRate), Some(0.2));
    assert_eq!(run.segments.len(), 2);
    assert!(run.commentary.decile_commentary.contains("Good separation"));
    assert!(run.commentary.ks_trigger_insight.contains("healthy"));

    let mut json = Vec::new();
    write_json(&mut json, &run).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(value["overall"]["metrics"]["KS"], 1.0);
    assert_eq!(value["ingest"]["row_errors"][0]["line"], 202);
    assert_eq!(value["commentary"]["volume_commentary"].as_str().map(|s| s.starts_with("Insufficient")), Some(true));

    let mut deciles = Vec::new();
    write_deciles_csv(&mut deciles, &run.all_evaluations()).unwrap();
    let text = String::from_utf8(deciles).unwrap();
    // Header + 10 bands for the whole population and for each of two segments.
    assert_eq!(text.lines().count(), 31);
    assert!(text.contains("thin_file,1,"));
}

#[test]
fn trend_from_csv_panel() {
    let csv = scored_csv();
    let ingested = read_scored_rows(csv.as_bytes(), &ColumnSpec::default()).unwrap();
    let run = trend_from_ingested(&ingested, &EvalConfig::default(), &RuleNarrator).unwrap();

    assert_eq!(run.series.vintages, vec!["2024-01", "2024-02"]);
    assert_eq!(run.series.volume, vec![100, 100]);
    assert_eq!(run.series.psi[0], None);
    assert!(run.commentary.volume_commentary.contains("stable"));
    assert!(run.commentary.ks_commentary.contains("stable"));
    assert_eq!(run.rag_breakdown.values().sum::<usize>(), 2);
}

#[test]
fn fraud_profile_from_csv() {
    let csv = "y,score\n1,0.95\n1,0.7\n0,0.65\n0,0.3\n0,0.2\n0,0.1\n0,0.05\n0,0.01\n";
    let ingested = read_scored_rows(csv.as_bytes(), &ColumnSpec::default()).unwrap();
    let config = EvalConfig {
        model_type: ModelType::from_tag("fraud"),
        ..EvalConfig::default()
    };
    let run = evaluate_ingested(&ingested, None, &config, &RuleNarrator).unwrap();
    let m = &run.overall.metrics;
    assert_eq!(m.get_by_name("alert_rate"), Some(0.375));
    assert_eq!(m.get_by_name("fraud_rate_in_alerts"), Some(0.6667));
    assert_eq!(m.get_by_name("AUC_PR"), Some(1.0));
    // No baseline: PSI defaults to 0, which does not make a perfect ranker amber.
    assert_eq!(run.overall.rag, RagStatus::Green);
}

#[test]
fn variable_stability_from_csv() {
    let base = read_feature_table("target,score,utilisation,age\n0,0.1,0.1,30\n1,0.9,0.2,40\n0,0.2,0.3,50\n".as_bytes()).unwrap();
    let cur = read_feature_table("target,score,utilisation,age\n0,0.1,0.8,30\n1,0.9,0.9,40\n0,0.2,0.95,50\n".as_bytes()).unwrap();
    let run = stability_from_tables(&base, &cur, 10).unwrap();
    assert_eq!(run.variables.len(), 2);
    assert_eq!(run.variables[0].variable, "utilisation");
    assert_eq!(run.psi_trigger_insight, "PSI trigger is primarily driven by: utilisation.");
}
