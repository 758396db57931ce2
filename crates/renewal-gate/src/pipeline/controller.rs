//! Pipeline orchestration: stage sequencing, staging side effects and the
//! mutex-guarded run state behind the status surfaces.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{info, warn};

use super::correlate::{self, CorrelationRun};
use super::export::{self, ExportRow};
use super::renewals::{
    OutcomeState, RenewalValidator, RuleBook, ValidatedLine, ValidationRun, ValidationStats,
};
use super::staging::StagingStore;
use super::woq::{NormalizationRun, WoqNormalizer};
use crate::pipeline::{PipelineError, StageReport};

const HISTORY_CAP: usize = 10;

/// Last validation attempt, kept whole for the status surface.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationSnapshot {
    pub source: String,
    pub at: DateTime<Local>,
    pub success: bool,
    pub message: String,
    pub stats: ValidationStats,
    pub lines: Vec<ValidatedLine>,
}

/// One successful validation, condensed for the rolling history.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub source: String,
    pub at: DateTime<Local>,
    pub stats: ValidationStats,
    pub success_rate_pct: f64,
}

/// Where the export artifact landed and how many rows it carries.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReceipt {
    pub artifact: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Default)]
struct ControllerState {
    current: Option<ValidationSnapshot>,
    history: Vec<RunSummary>,
}

/// Front door of the pipeline. One instance is shared by the HTTP and CLI
/// surfaces; run state serializes on the interior mutex.
pub struct PipelineController<S> {
    staging: Arc<S>,
    validator: RenewalValidator,
    export_dir: PathBuf,
    state: Mutex<ControllerState>,
}

impl<S: StagingStore> PipelineController<S> {
    pub fn new(staging: Arc<S>, book: RuleBook, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging,
            validator: RenewalValidator::new(book),
            export_dir: export_dir.into(),
            state: Mutex::new(ControllerState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        // A poisoned lock still holds consistent data; writers swap whole values.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validates a renewal feed, stages the Correct lines and records the run.
    /// A staging fault downgrades to a warning on the payload.
    pub fn validate_renewals(&self, path: &Path) -> StageReport<ValidationRun> {
        let source = feed_name(path);
        match self.validator.validate_path(path) {
            Ok(mut run) => {
                let correct: Vec<ValidatedLine> = run
                    .lines
                    .iter()
                    .filter(|line| line.outcome.state == OutcomeState::Correct)
                    .cloned()
                    .collect();
                match self.staging.replace_validated(&correct) {
                    Ok(count) => {
                        info!(source = %source, staged = count, "renewal feed validated")
                    }
                    Err(error) => {
                        warn!(source = %source, %error, "validated lines not staged");
                        run.persistence_warning = Some(format!("results not staged: {error}"));
                    }
                }
                let message = format!(
                    "{} lines in {} groups, {} correct",
                    run.stats.total_lines, run.stats.groups, run.stats.correct_lines
                );
                self.record_success(&source, &message, &run);
                StageReport::ok(message, run)
            }
            Err(error) => {
                warn!(source = %source, %error, "renewal validation failed");
                self.record_failure(&source, &error);
                StageReport::failed(&error)
            }
        }
    }

    /// Normalizes a WOQ feed and stages the result. Mirrors the validation
    /// side effect contract: staging faults warn, they never fail the run.
    pub fn normalize_woq(&self, path: &Path) -> StageReport<NormalizationRun> {
        let source = feed_name(path);
        match WoqNormalizer::normalize_path(path) {
            Ok(mut run) => {
                match self.staging.replace_woq(&run.records) {
                    Ok(count) => info!(source = %source, staged = count, "WOQ feed normalized"),
                    Err(error) => {
                        warn!(source = %source, %error, "normalized records not staged");
                        run.persistence_warning = Some(format!("records not staged: {error}"));
                    }
                }
                let message = format!("{} records, {} closed", run.total, run.closed_count);
                StageReport::ok(message, run)
            }
            Err(error) => {
                warn!(source = %source, %error, "WOQ normalization failed");
                StageReport::failed(&error)
            }
        }
    }

    /// Correlates the two staged tables.
    pub fn correlate(&self) -> StageReport<CorrelationRun> {
        match self.correlate_staged() {
            Ok(run) => {
                info!(
                    total = run.stats.total,
                    eligible = run.stats.eligible,
                    "staged feeds correlated"
                );
                let message = format!(
                    "{} records correlated, {} eligible ({}%)",
                    run.stats.total, run.stats.eligible, run.stats.cross_rate_pct
                );
                StageReport::ok(message, run)
            }
            Err(error) => {
                warn!(%error, "correlation failed");
                StageReport::failed(&error)
            }
        }
    }

    /// Correlates, filters, writes the artifact and truncates staging. The
    /// artifact is the commit of the run; a truncation fault only warns.
    pub fn export_rpa(&self, destination: Option<&Path>) -> StageReport<ExportReceipt> {
        match self.export_staged(destination) {
            Ok(receipt) => {
                info!(
                    rows = receipt.rows,
                    artifact = %receipt.artifact.display(),
                    "export artifact written"
                );
                let message = format!(
                    "{} rows exported to {}",
                    receipt.rows,
                    receipt.artifact.display()
                );
                StageReport::ok(message, receipt)
            }
            Err(error) => {
                warn!(%error, "export failed");
                StageReport::failed(&error)
            }
        }
    }

    /// The rows an export would emit right now, with no file and no
    /// truncation.
    pub fn preview_export(&self) -> StageReport<Vec<ExportRow>> {
        match self.preview_staged() {
            Ok(rows) => {
                let message = format!("{} rows would be exported", rows.len());
                StageReport::ok(message, rows)
            }
            Err(error) => StageReport::failed(&error),
        }
    }

    pub fn last_validation(&self) -> Option<ValidationSnapshot> {
        self.state().current.clone()
    }

    pub fn validation_history(&self) -> Vec<RunSummary> {
        self.state().history.clone()
    }

    /// Drops run state and empties both staging tables.
    pub fn clear_state(&self) -> StageReport<()> {
        {
            let mut state = self.state();
            state.current = None;
            state.history.clear();
        }
        match self.staging.truncate_all() {
            Ok(()) => {
                info!("pipeline state cleared");
                StageReport::ok("run state and staging cleared", ())
            }
            Err(error) => {
                let error = PipelineError::from(error);
                warn!(%error, "staging not cleared");
                StageReport::failed(&error)
            }
        }
    }

    fn correlate_staged(&self) -> Result<CorrelationRun, PipelineError> {
        let validated = self.staging.load_validated()?;
        let woq = self.staging.load_woq()?;
        correlate::correlate(&validated, &woq)
    }

    fn preview_staged(&self) -> Result<Vec<ExportRow>, PipelineError> {
        let run = self.correlate_staged()?;
        export::filter_for_export(&run.records)
    }

    fn export_staged(&self, destination: Option<&Path>) -> Result<ExportReceipt, PipelineError> {
        let run = self.correlate_staged()?;
        let rows = export::filter_for_export(&run.records)?;
        let dir = destination.unwrap_or(&self.export_dir);
        let artifact = export::write_export_file(&rows, dir, Local::now())?;
        if let Err(error) = self.staging.truncate_all() {
            warn!(%error, "staging not truncated after export");
        }
        Ok(ExportReceipt {
            artifact,
            rows: rows.len(),
        })
    }

    fn record_success(&self, source: &str, message: &str, run: &ValidationRun) {
        let at = Local::now();
        let mut state = self.state();
        state.current = Some(ValidationSnapshot {
            source: source.to_string(),
            at,
            success: true,
            message: message.to_string(),
            stats: run.stats,
            lines: run.lines.clone(),
        });
        state.history.push(RunSummary {
            source: source.to_string(),
            at,
            stats: run.stats,
            success_rate_pct: run.stats.success_rate_pct(),
        });
        if state.history.len() > HISTORY_CAP {
            state.history.remove(0);
        }
    }

    fn record_failure(&self, source: &str, error: &PipelineError) {
        let mut state = self.state();
        state.current = Some(ValidationSnapshot {
            source: source.to_string(),
            at: Local::now(),
            success: false,
            message: error.to_string(),
            stats: ValidationStats::default(),
            lines: Vec::new(),
        });
    }
}

fn feed_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

