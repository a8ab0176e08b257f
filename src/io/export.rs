//! Export run results to JSON and decile tables to CSV.
//!
//! Both exports are meant to be easy to consume in spreadsheets or
//! downstream scripts. Writers are generic so tests can export to memory.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::domain::Evaluation;
use crate::error::AppError;

/// Write any serializable run result as pretty JSON.
pub fn write_json<W: Write, T: Serialize>(writer: W, value: &T) -> Result<(), AppError> {
    serde_json::to_writer_pretty(writer, value)
        .map_err(|e| AppError::new(4, format!("Failed to write JSON export: {e}")))
}

pub fn export_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = create(path)?;
    let mut writer = BufWriter::new(file);
    write_json(&mut writer, value)?;
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush JSON export: {e}")))?;
    info!(path = %path.display(), "wrote JSON export");
    Ok(())
}

/// Write decile tables for one or more evaluations.
///
/// The `segment` column is `all` for the whole population.
pub fn write_deciles_csv<W: Write>(writer: W, evaluations: &[&Evaluation]) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["segment", "decile", "count", "bad_count", "bad_rate"])
        .map_err(|e| AppError::new(4, format!("Failed to write decile CSV header: {e}")))?;

    for eval in evaluations {
        let segment = eval.segment.as_deref().unwrap_or("all");
        for d in &eval.deciles {
            out.write_record([
                segment.to_string(),
                d.decile.to_string(),
                d.count.to_string(),
                d.bad_count.to_string(),
                d.bad_rate.map(|r| format!("{r:.6}")).unwrap_or_default(),
            ])
            .map_err(|e| AppError::new(4, format!("Failed to write decile CSV row: {e}")))?;
        }
    }
    out.flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush decile CSV: {e}")))
}

pub fn export_deciles_csv(path: &Path, evaluations: &[&Evaluation]) -> Result<(), AppError> {
    let file = create(path)?;
    let mut writer = BufWriter::new(file);
    write_deciles_csv(&mut writer, evaluations)?;
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush decile CSV: {e}")))?;
    info!(path = %path.display(), "wrote decile CSV");
    Ok(())
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::new(4, format!("Failed to create export '{}': {e}", path.display())))
}
