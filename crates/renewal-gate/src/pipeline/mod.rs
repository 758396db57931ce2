//! Four-stage pipeline behind the renewal gate.
//!
//! `renewals` classifies maintenance groups, `woq` normalizes the positional
//! feed, `correlate` joins the two by order number, and `export` selects the
//! rows handed to the RPA robot. The [`controller`] owns run state and drives
//! the stages against a [`staging::StagingStore`].

pub mod controller;
pub mod correlate;
pub mod export;
pub mod renewals;
pub mod router;
pub mod staging;
pub mod woq;

#[cfg(test)]
mod tests;

use serde::Serialize;
use thiserror::Error;

pub use controller::{ExportReceipt, PipelineController, RunSummary, ValidationSnapshot};
pub use correlate::{correlate, CorrelatedRecord, CorrelationRun, CrossingStats, RpaEligibility};
pub use export::{filter_for_export, write_export_csv, ExportRow};
pub use renewals::{
    GroupOutcome, LineKind, OutcomeState, RenewalLine, RenewalValidator, RuleBook, ValidatedLine,
    ValidationRun, ValidationStats,
};
pub use router::pipeline_router;
pub use staging::{StagingError, StagingStore};
pub use woq::{NormalizationRun, WoqNormalizer, WoqRecord};

/// Failure taxonomy shared by every pipeline stage.
///
/// Staging write failures inside validate/normalize are deliberately *not*
/// here: they are logged and surfaced as a warning on the run payload.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source not readable: {reason}")]
    SourceRead {
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },
    #[error("schema mismatch: {0}")]
    Schema(String),
    #[error("{0}")]
    EmptyResult(String),
    #[error("{0}")]
    Crossing(String),
    #[error("export artifact not written: {0}")]
    Artifact(String),
    #[error("staging unavailable: {0}")]
    Staging(#[from] StagingError),
}

impl PipelineError {
    pub fn source_read(reason: impl Into<String>) -> Self {
        Self::SourceRead {
            reason: reason.into(),
            source: None,
        }
    }

    pub fn source_read_io(reason: impl Into<String>, source: std::io::Error) -> Self {
        Self::SourceRead {
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Stable label carried on wire payloads next to the human message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceRead { .. } => "source_read",
            Self::Schema(_) => "schema",
            Self::EmptyResult(_) => "empty_result",
            Self::Crossing(_) => "crossing",
            Self::Artifact(_) => "artifact",
            Self::Staging(_) => "staging",
        }
    }
}

impl From<csv::Error> for PipelineError {
    fn from(value: csv::Error) -> Self {
        Self::source_read(value.to_string())
    }
}

/// Percentages on wire payloads carry two decimals.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Tri-part outcome every pipeline operation reports to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport<T> {
    pub success: bool,
    pub message: String,
    pub payload: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

impl<T> StageReport<T> {
    pub fn ok(message: impl Into<String>, payload: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload: Some(payload),
            error_kind: None,
        }
    }

    pub fn failed(error: &PipelineError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            payload: None,
            error_kind: Some(error.kind()),
        }
    }
}
