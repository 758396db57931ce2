//! Eligibility filter and export artifact writer.
//!
//! The exportable subset of a correlation run is projected to the two columns
//! the robot consumes and written to a timestamped CSV. Rows pass through in
//! input order and are never deduplicated.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::correlate::{CorrelatedRecord, RpaEligibility};
use super::renewals::OutcomeState;
use crate::pipeline::PipelineError;

/// One artifact row: the order number and its per-contract ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "WO")]
    pub order_no: String,
    #[serde(rename = "ORDEN_CONTRATO")]
    pub contract_ordinal: u32,
}

fn is_open(record: &CorrelatedRecord) -> bool {
    !record.woq.is_closed
}

fn matched_correct(record: &CorrelatedRecord) -> bool {
    record.outcome_state == Some(OutcomeState::Correct)
}

fn flagged_eligible(record: &CorrelatedRecord) -> bool {
    record.rpa_eligible == RpaEligibility::Yes
}

/// Projects the exportable rows out of a correlation run. Each predicate is
/// checked on its own; a row must be open, matched Correct and flagged YES.
pub fn filter_for_export(records: &[CorrelatedRecord]) -> Result<Vec<ExportRow>, PipelineError> {
    let rows: Vec<ExportRow> = records
        .iter()
        .filter(|record| is_open(record) && matched_correct(record) && flagged_eligible(record))
        .map(|record| ExportRow {
            order_no: record.woq.order_no.clone(),
            contract_ordinal: record.woq.contract_ordinal,
        })
        .collect();

    if rows.is_empty() {
        return Err(PipelineError::EmptyResult(
            "no qualifying records for export".to_string(),
        ));
    }
    Ok(rows)
}

/// Serializes rows as CSV with the canonical two-column header.
pub fn write_export_csv<W: Write>(rows: &[ExportRow], writer: W) -> Result<(), PipelineError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer
            .serialize(row)
            .map_err(|error| PipelineError::Artifact(error.to_string()))?;
    }
    csv_writer
        .flush()
        .map_err(|error| PipelineError::Artifact(error.to_string()))?;
    Ok(())
}

/// Artifact name for an export taken at the given instant.
pub fn export_file_name(at: &DateTime<Local>) -> String {
    format!("RPA_WO_ORDEN_CONTRATO_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

/// Writes the artifact under `dir`, creating the directory if needed, and
/// returns the full path.
pub fn write_export_file(
    rows: &[ExportRow],
    dir: &Path,
    at: DateTime<Local>,
) -> Result<PathBuf, PipelineError> {
    fs::create_dir_all(dir).map_err(|error| {
        PipelineError::Artifact(format!("cannot create {}: {error}", dir.display()))
    })?;
    let path = dir.join(export_file_name(&at));
    let file = File::create(&path).map_err(|error| {
        PipelineError::Artifact(format!("cannot create {}: {error}", path.display()))
    })?;
    write_export_csv(rows, file)?;
    Ok(path)
}
