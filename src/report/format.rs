//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the metric code stays clean and testable
//! - output changes are localized

use std::collections::BTreeMap;

use crate::app::pipeline::{EvaluationRun, IngestSummary, StabilityRun, TrendRun};
use crate::commentary::Commentary;
use crate::domain::{DecileBucket, Evaluation, MetricKey, RagStatus};
use crate::metrics::psi::DriftLevel;

/// Full report for one evaluation run.
pub fn format_evaluation(run: &EvaluationRun) -> String {
    let mut out = String::new();
    let overall = &run.overall;

    out.push_str("=== mpm - Model Performance ===\n");
    out.push_str(&format!(
        "Model type: {} (profile: {:?})\n",
        overall.model_type, overall.profile
    ));
    out.push_str(&format_ingest(&run.ingest));
    out.push_str(&format!(
        "Computed at: {}\n",
        overall.computed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    out.push_str("\nMetrics:\n");
    out.push_str(&format_metrics(overall));
    out.push_str(&format!("RAG status: {}\n", rag_label(overall.rag)));
    if let Some(psi) = overall.metrics.psi() {
        out.push_str(&format!("Population drift: {}\n", DriftLevel::from_psi(psi).label()));
    }

    if !run.segments.is_empty() {
        out.push_str("\nSegments:\n");
        out.push_str(&format_segment_table(&run.segments));
    }

    out.push_str("\nPortfolio RAG breakdown:\n");
    out.push_str(&format_rag_breakdown(&run.rag_breakdown));

    if !overall.deciles.is_empty() {
        out.push_str("\nDeciles (1 = highest scores):\n");
        out.push_str(&format_decile_table(&overall.deciles));
    }

    out.push_str(&format!("\nCommentary ({}):\n", run.narrator));
    out.push_str(&format_commentary(&run.commentary, false));

    out
}

/// Full report for one trend run.
pub fn format_trend(run: &TrendRun) -> String {
    let mut out = String::new();

    out.push_str("=== mpm - Model Performance Trend ===\n");
    if let Some(first) = run.vintages.first() {
        out.push_str(&format!(
            "Model type: {} (profile: {:?})\n",
            first.evaluation.model_type, first.evaluation.profile
        ));
    }
    out.push_str(&format_ingest(&run.ingest));
    out.push_str(&format!("Baseline vintage: {}\n", run.series.vintages.first().map_or("-", String::as_str)));

    out.push_str("\nVintages:\n");
    out.push_str(&format!(
        "{:<12} {:>8} {:>8} {:>8} {:>9} {:<6}\n",
        "vintage", "volume", "KS", "PSI", "bad_rate", "RAG"
    ));
    out.push_str(&format!(
        "{:-<12} {:-<8} {:-<8} {:-<8} {:-<9} {:-<6}\n",
        "", "", "", "", "", ""
    ));
    for (i, v) in run.vintages.iter().enumerate() {
        out.push_str(
            format!(
                "{:<12} {:>8} {:>8} {:>8} {:>9} {:<6}\n",
                truncate(&v.vintage, 12),
                run.series.volume[i],
                fmt_opt(run.series.ks[i], 4),
                fmt_opt(run.series.psi[i], 4),
                fmt_opt_pct(run.series.bad_rate[i]),
                v.evaluation.rag.label(),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out.push_str("\nPortfolio RAG breakdown (vintages):\n");
    out.push_str(&format_rag_breakdown(&run.rag_breakdown));

    if let Some(latest) = run.vintages.last() {
        if !latest.evaluation.deciles.is_empty() {
            out.push_str(&format!("\nDeciles for latest vintage {}:\n", latest.vintage));
            out.push_str(&format_decile_table(&latest.evaluation.deciles));
        }
    }

    out.push_str(&format!("\nCommentary ({}):\n", run.narrator));
    out.push_str(&format_commentary(&run.commentary, true));

    out
}

pub fn format_stability(run: &StabilityRun) -> String {
    let mut out = String::new();

    out.push_str("=== mpm - Variable Stability ===\n");
    out.push_str(&format!("{:<24} {:>8} {:<6}\n", "variable", "PSI", "status"));
    out.push_str(&format!("{:-<24} {:-<8} {:-<6}\n", "", "", ""));
    for v in &run.variables {
        out.push_str(&format!(
            "{:<24} {:>8.4} {:<6}\n",
            truncate(&v.variable, 24),
            v.psi,
            v.status.label()
        ));
    }
    if !run.unmatched.is_empty() {
        out.push_str(&format!("(skipped, not in both files: {})\n", run.unmatched.join(", ")));
    }
    out.push('\n');
    out.push_str(&run.psi_trigger_insight);
    out.push('\n');

    out
}

fn format_ingest(ingest: &IngestSummary) -> String {
    let mut out = format!(
        "Rows: read={} used={} skipped={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    );
    if let Some(first) = ingest.row_errors.first() {
        out.push_str(&format!("  first skipped row: line {} ({})\n", first.line, first.message));
    }
    out
}

fn format_metrics(eval: &Evaluation) -> String {
    let mut out = String::new();
    for (key, value) in eval.metrics.iter() {
        out.push_str(&format!("  {:<22} {:>10.4}\n", key.name(), value));
    }
    out.push_str(&format!("  {:<22} {:>10}\n", "volume", eval.volume));
    out
}

fn format_segment_table(segments: &[Evaluation]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<16} {:>8} {:>8} {:>8} {:>8} {:<6}\n",
        "segment", "volume", "KS", "PSI", "AUC", "RAG"
    ));
    out.push_str(&format!(
        "{:-<16} {:-<8} {:-<8} {:-<8} {:-<8} {:-<6}\n",
        "", "", "", "", "", ""
    ));
    for e in segments {
        out.push_str(&format!(
            "{:<16} {:>8} {:>8} {:>8} {:>8} {:<6}\n",
            truncate(e.segment.as_deref().unwrap_or("-"), 16),
            e.volume,
            fmt_opt(e.metrics.ks(), 4),
            fmt_opt(e.metrics.psi(), 4),
            fmt_opt(e.metrics.get(MetricKey::Auc), 4),
            e.rag.label(),
        ));
    }
    out
}

pub fn format_rag_breakdown(counts: &BTreeMap<&'static str, usize>) -> String {
    RagStatus::ALL
        .iter()
        .map(|s| format!("  {:<6} {}\n", s.label(), counts.get(s.label()).copied().unwrap_or(0)))
        .collect()
}

pub fn format_decile_table(deciles: &[DecileBucket]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>6} {:>8} {:>8} {:>9}\n",
        "decile", "count", "bads", "bad_rate"
    ));
    out.push_str(&format!("{:->6} {:->8} {:->8} {:->9}\n", "", "", "", ""));
    for d in deciles {
        out.push_str(&format!(
            "{:>6} {:>8} {:>8} {:>9}\n",
            d.decile,
            d.count,
            d.bad_count,
            fmt_opt_pct(d.bad_rate)
        ));
    }
    out
}

/// Commentary lines; trend lines are left out when there is no trend.
pub fn format_commentary(commentary: &Commentary, with_trend: bool) -> String {
    let mut out = String::new();
    for (key, text) in commentary.fields() {
        let is_trend = !matches!(key, "decile_commentary" | "ks_trigger_insight");
        if is_trend && !with_trend {
            continue;
        }
        out.push_str(&format!("- {text}\n"));
    }
    out
}

fn rag_label(status: RagStatus) -> String {
    status.label().to_ascii_uppercase()
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    v.map(|x| format!("{x:.decimals$}")).unwrap_or_else(|| "-".to_string())
}

fn fmt_opt_pct(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}%", x * 100.0)).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::evaluate_ingested;
    use crate::commentary::RuleNarrator;
    use crate::data::sample::{SampleSpec, generate_sample};
    use crate::domain::{EvalConfig, VariableStabilityRecord};
    use crate::io::ingest::IngestedScores;

    #[test]
    fn evaluation_report_sections() {
        let data = generate_sample(&SampleSpec {
            n: 500,
            with_segments: true,
            ..SampleSpec::default()
        })
        .unwrap();
        let run = evaluate_ingested(
            &IngestedScores::from_sample(data.rows),
            Some(data.baseline),
            &EvalConfig::default(),
            &RuleNarrator,
        )
        .unwrap();
        let text = format_evaluation(&run);
        for section in ["Metrics:", "RAG status:", "Population drift:", "Segments:", "Portfolio RAG breakdown:", "Deciles", "Commentary (rules):"] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("CA_at_10"));
        assert!(!text.contains("Volume trend"));
    }

    #[test]
    fn decile_table_marks_empty_bands() {
        let deciles = vec![
            DecileBucket {
                decile: 1,
                count: 1,
                bad_count: 1,
                bad_rate: Some(1.0),
            },
            DecileBucket {
                decile: 2,
                count: 0,
                bad_count: 0,
                bad_rate: None,
            },
        ];
        let text = format_decile_table(&deciles);
        assert!(text.contains("100.00%"));
        assert!(text.lines().last().unwrap().trim_end().ends_with('-'));
    }

    #[test]
    fn breakdown_lists_every_status() {
        let mut counts = BTreeMap::new();
        counts.insert("red", 2);
        let text = format_rag_breakdown(&counts);
        assert_eq!(text, "  green  0\n  amber  0\n  red    2\n");
    }

    #[test]
    fn stability_report_includes_insight() {
        let run = StabilityRun {
            variables: vec![VariableStabilityRecord {
                variable: "income".into(),
                psi: 0.31,
                status: RagStatus::Red,
            }],
            psi_trigger_insight: "PSI trigger is primarily driven by: income.".into(),
            unmatched: vec!["tenure".into()],
        };
        let text = format_stability(&run);
        assert!(text.contains("0.3100"));
        assert!(text.contains("tenure"));
        assert!(text.ends_with("driven by: income.\n"));
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
