//! CSV ingest and normalization.
//!
//! This module turns caller CSV exports into the engine's value types:
//!
//! - scored rows (`label`, `score`, optional segment / vintage)
//! - baseline score arrays
//! - collections cohorts (`prev_dpd`, `current_dpd`, `balance`, `recovered`)
//! - feature tables for variable-level stability
//!
//! Design goals:
//! - **Alias-tolerant headers**: `target`/`y` for the label, `score`/`probability`
//!   for the score; callers never have to rename columns
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: no metric logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{CollectionsCohort, DelinquencyRecord, ScorePopulation, ScoreRecord};
use crate::error::{AppError, MetricsError};

/// Accepted header names for the binary label, in priority order.
pub const LABEL_ALIASES: [&str; 3] = ["true_label", "target", "y"];
/// Accepted header names for the predicted score, in priority order.
pub const SCORE_ALIASES: [&str; 3] = ["predicted_score", "score", "probability"];

/// Optional grouping columns captured alongside each scored row.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub segment_column: String,
    pub vintage_column: String,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            segment_column: "segment".to_string(),
            vintage_column: "vintage".to_string(),
        }
    }
}

/// A scored observation plus its grouping keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow {
    pub record: ScoreRecord,
    pub segment: Option<String>,
    pub vintage: Option<String>,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: normalized rows + row errors.
#[derive(Debug, Clone)]
pub struct IngestedScores {
    pub rows: Vec<ScoredRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl IngestedScores {
    /// Wrap generated rows (no parse errors possible).
    pub fn from_sample(rows: Vec<ScoredRow>) -> Self {
        let rows_read = rows.len();
        Self {
            rows,
            row_errors: Vec::new(),
            rows_read,
        }
    }

    pub fn rows_used(&self) -> usize {
        self.rows.len()
    }

    pub fn population(&self) -> Result<ScorePopulation, MetricsError> {
        ScorePopulation::from_records(self.rows.iter().map(|r| r.record).collect())
    }

    pub fn has_segments(&self) -> bool {
        self.rows.iter().any(|r| r.segment.is_some())
    }

    pub fn has_vintages(&self) -> bool {
        self.rows.iter().any(|r| r.vintage.is_some())
    }
}

/// Cohort ingest output.
#[derive(Debug, Clone)]
pub struct IngestedCohort {
    pub cohort: CollectionsCohort,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Numeric feature columns read from one CSV, column-major.
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
    /// Records the CSV reader could not decode.
    pub skipped_records: usize,
}

impl FeatureTable {
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(&self.values[idx])
    }
}

pub fn load_scored_rows(path: &Path, columns: &ColumnSpec) -> Result<IngestedScores, AppError> {
    let file = open(path)?;
    read_scored_rows(file, columns)
}

/// Read labeled scores from any CSV source.
pub fn read_scored_rows<R: Read>(reader: R, columns: &ColumnSpec) -> Result<IngestedScores, AppError> {
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader)?;
    let header_map = build_header_map(&headers);

    let label_idx = find_alias(&header_map, &LABEL_ALIASES).ok_or_else(|| {
        AppError::new(
            2,
            "Missing label column: expected one of `true_label`, `target`, `y`.",
        )
    })?;
    let score_idx = find_alias(&header_map, &SCORE_ALIASES).ok_or_else(|| {
        AppError::new(
            2,
            "Missing score column: expected one of `predicted_score`, `score`, `probability`.",
        )
    })?;
    let segment_idx = header_map.get(&normalize_header_name(&columns.segment_column)).copied();
    let vintage_idx = header_map.get(&normalize_header_name(&columns.vintage_column)).copied();

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: header is line 1 and records are 0-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let parsed = parse_label(field(&record, Some(label_idx)))
            .and_then(|label| parse_score(field(&record, Some(score_idx))).map(|s| (label, s)));
        match parsed {
            Ok((label, score)) => rows.push(ScoredRow {
                record: ScoreRecord::new(label, score),
                segment: field(&record, segment_idx).map(str::to_string),
                vintage: field(&record, vintage_idx).map(str::to_string),
            }),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    report_row_errors(&row_errors);
    if rows.is_empty() {
        return Err(AppError::new(3, "No valid scored rows remain after parsing."));
    }
    debug!(rows_read, rows_used = rows.len(), "ingested scored rows");

    Ok(IngestedScores {
        rows,
        row_errors,
        rows_read,
    })
}

pub fn load_baseline_scores(path: &Path) -> Result<Vec<f64>, AppError> {
    let file = open(path)?;
    read_baseline_scores(file)
}

/// Read the score column of a baseline file; other columns are ignored.
///
/// Unparseable scores are skipped with a warning.
pub fn read_baseline_scores<R: Read>(reader: R) -> Result<Vec<f64>, AppError> {
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader)?;
    let header_map = build_header_map(&headers);
    let score_idx = find_alias(&header_map, &SCORE_ALIASES).ok_or_else(|| {
        AppError::new(
            2,
            "Baseline file has no score column: expected one of `predicted_score`, `score`, `probability`.",
        )
    })?;

    let mut scores = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let parsed = result
            .ok()
            .and_then(|r| parse_score(field(&r, Some(score_idx))).ok());
        match parsed {
            Some(v) => scores.push(v),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "skipped unparseable baseline scores");
    }
    Ok(scores)
}

pub fn load_cohort(path: &Path) -> Result<IngestedCohort, AppError> {
    let file = open(path)?;
    read_cohort(file)
}

/// Read a collections cohort (`prev_dpd`, `current_dpd`, optional `balance`, `recovered`).
pub fn read_cohort<R: Read>(reader: R) -> Result<IngestedCohort, AppError> {
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader)?;
    let header_map = build_header_map(&headers);

    let prev_idx = *header_map
        .get("prev_dpd")
        .ok_or_else(|| AppError::new(2, "Missing required column: `prev_dpd`"))?;
    let current_idx = *header_map
        .get("current_dpd")
        .ok_or_else(|| AppError::new(2, "Missing required column: `current_dpd`"))?;
    let balance_idx = header_map.get("balance").copied();
    let recovered_idx = header_map.get("recovered").copied();

    let mut accounts = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let parsed = (|| -> Result<DelinquencyRecord, String> {
            Ok(DelinquencyRecord {
                prev_dpd: parse_dpd(field(&record, Some(prev_idx)), "prev_dpd")?,
                current_dpd: parse_dpd(field(&record, Some(current_idx)), "current_dpd")?,
                balance: parse_amount(field(&record, balance_idx), "balance")?,
                recovered: parse_amount(field(&record, recovered_idx), "recovered")?,
            })
        })();
        match parsed {
            Ok(account) => accounts.push(account),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    report_row_errors(&row_errors);
    if accounts.is_empty() {
        return Err(AppError::new(3, "No valid cohort rows remain after parsing."));
    }

    Ok(IngestedCohort {
        cohort: CollectionsCohort { accounts },
        row_errors,
        rows_read,
    })
}

pub fn load_feature_table(path: &Path) -> Result<FeatureTable, AppError> {
    let file = open(path)?;
    read_feature_table(file)
}

/// Read every numeric column except the label and score columns.
///
/// A column is numeric when each non-empty cell parses as a finite number;
/// empty cells are skipped. Columns with any non-numeric cell are dropped.
pub fn read_feature_table<R: Read>(reader: R) -> Result<FeatureTable, AppError> {
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader)?;
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();

    let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    let mut numeric = vec![true; names.len()];

    let mut skipped = 0usize;
    for result in reader.records() {
        let Ok(record) = result else {
            skipped += 1;
            continue;
        };
        for (col, is_numeric) in numeric.iter_mut().enumerate() {
            if !*is_numeric {
                continue;
            }
            let Some(raw) = field(&record, Some(col)) else { continue };
            match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => values[col].push(v),
                _ => *is_numeric = false,
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "skipped undecodable feature records");
    }

    let mut table = FeatureTable {
        skipped_records: skipped,
        ..FeatureTable::default()
    };
    for ((name, column), is_numeric) in names.into_iter().zip(values).zip(numeric) {
        let excluded = LABEL_ALIASES.contains(&name.as_str()) || SCORE_ALIASES.contains(&name.as_str());
        if excluded {
            continue;
        }
        if !is_numeric {
            debug!(column = %name, "ignoring non-numeric column");
            continue;
        }
        table.columns.push(name);
        table.values.push(column);
    }
    Ok(table)
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>) -> Result<StringRecord, AppError> {
    reader
        .headers()
        .map(StringRecord::clone)
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))
}

fn report_row_errors(row_errors: &[RowError]) {
    if let Some(first) = row_errors.first() {
        warn!(
            count = row_errors.len(),
            first_line = first.line,
            first_error = %first.message,
            "skipped invalid rows"
        );
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_alias(header_map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|a| header_map.get(*a).copied())
}

fn field(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    record.get(idx?).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_label(raw: Option<&str>) -> Result<u8, String> {
    let raw = raw.ok_or_else(|| "Missing label value.".to_string())?;
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Ok(1),
        "false" => return Ok(0),
        _ => {}
    }
    match raw.parse::<f64>() {
        Ok(v) if v == 0.0 => Ok(0),
        Ok(v) if v == 1.0 => Ok(1),
        _ => Err(format!("Invalid label '{raw}' (expected 0 or 1).")),
    }
}

fn parse_score(raw: Option<&str>) -> Result<f64, String> {
    let raw = raw.ok_or_else(|| "Missing score value.".to_string())?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid score '{raw}'.")),
    }
}

fn parse_dpd(raw: Option<&str>, name: &str) -> Result<u32, String> {
    let raw = raw.ok_or_else(|| format!("Missing `{name}` value."))?;
    raw.parse::<u32>()
        .map_err(|_| format!("Invalid `{name}` '{raw}' (expected a non-negative integer)."))
}

fn parse_amount(raw: Option<&str>, name: &str) -> Result<f64, String> {
    let Some(raw) = raw else { return Ok(0.0) };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(format!("Invalid `{name}` '{raw}' (expected a non-negative number).")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_aliased_columns_and_groups() {
        let csv = "\u{feff}Target,Probability,Segment\n1,0.9,thin_file\n0,0.2,thick_file\n1,0.7,\n";
        let ingested = read_scored_rows(csv.as_bytes(), &ColumnSpec::default()).unwrap();
        assert_eq!(ingested.rows_used(), 3);
        assert_eq!(ingested.rows[0].record, ScoreRecord::new(1, 0.9));
        assert_eq!(ingested.rows[0].segment.as_deref(), Some("thin_file"));
        assert_eq!(ingested.rows[2].segment, None);
        assert!(ingested.has_segments());
        assert!(!ingested.has_vintages());
    }

    #[test]
    fn canonical_names_win_over_aliases() {
        let csv = "y,true_label,score\n0,1,0.4\n";
        let ingested = read_scored_rows(csv.as_bytes(), &ColumnSpec::default()).unwrap();
        assert_eq!(ingested.rows[0].record.true_label, 1);
    }

    #[test]
    fn bad_rows_are_reported_not_fatal() {
        let csv = "y,score\n1,0.9\n2,0.5\n0,abc\n,0.3\n0,0.1\ntrue,0.8\n";
        let ingested = read_scored_rows(csv.as_bytes(), &ColumnSpec::default()).unwrap();
        assert_eq!(ingested.rows_read, 6);
        assert_eq!(ingested.rows_used(), 3);
        let lines: Vec<usize> = ingested.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert!(ingested.row_errors[0].message.contains("Invalid label"));
    }

    #[test]
    fn missing_score_column_is_usage_error() {
        let err = read_scored_rows("target,value\n1,2\n".as_bytes(), &ColumnSpec::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn no_valid_rows_is_data_error() {
        let err = read_scored_rows("target,score\n5,0.1\n".as_bytes(), &ColumnSpec::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn baseline_reads_only_scores() {
        let scores = read_baseline_scores("id,probability\na,0.1\nb,x\nc,0.3\n".as_bytes()).unwrap();
        assert_eq!(scores, vec![0.1, 0.3]);
    }

    #[test]
    fn cohort_defaults_missing_amounts_to_zero() {
        let csv = "prev_dpd,current_dpd,balance\n30,60,1000\n0,0,\n45,x,10\n";
        let ingested = read_cohort(csv.as_bytes()).unwrap();
        assert_eq!(ingested.cohort.accounts.len(), 2);
        assert_eq!(ingested.cohort.accounts[1].balance, 0.0);
        assert_eq!(ingested.row_errors.len(), 1);
    }

    #[test]
    fn feature_table_keeps_numeric_non_score_columns() {
        let csv = "age,income,region,score,target\n30,1000,N,0.2,0\n41,,S,0.4,1\n";
        let table = read_feature_table(csv.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["age".to_string(), "income".to_string()]);
        assert_eq!(table.column("age"), Some(&[30.0, 41.0][..]));
        assert_eq!(table.column("income"), Some(&[1000.0][..]));
    }

    #[test]
    fn feature_table_counts_undecodable_records() {
        let mut csv = b"age,income\n30,1000\n".to_vec();
        csv.extend_from_slice(b"\xff\xfe,5\n41,2000\n");
        let table = read_feature_table(csv.as_slice()).unwrap();
        assert_eq!(table.skipped_records, 1);
        assert_eq!(table.column("age"), Some(&[30.0, 41.0][..]));
        assert_eq!(table.column("income"), Some(&[1000.0, 2000.0][..]));
    }
}
