//! Normalization of the positional work-order-query feed.
//!
//! The feed arrives headerless with fixed column positions, Latin-1 encoded
//! more often than not, and with a site-dependent closed-marker vocabulary.
//! Normalization produces canonically named records plus two derived columns:
//! the per-contract ordinal and the closed flag.

mod domain;
mod mapping;
mod parser;

pub use domain::{WoqRecord, WOQ_COLUMNS};

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use crate::pipeline::PipelineError;

/// Output of one normalization pass.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizationRun {
    pub records: Vec<WoqRecord>,
    pub diagnostics: Vec<String>,
    pub total: usize,
    pub closed_count: usize,
    /// Set by the controller when staging the normalized table failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_warning: Option<String>,
}

pub struct WoqNormalizer;

impl WoqNormalizer {
    pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<NormalizationRun, PipelineError> {
        let table = parser::read_table(path.as_ref())?;
        Ok(Self::normalize_table(table))
    }

    pub fn normalize_bytes(bytes: &[u8]) -> Result<NormalizationRun, PipelineError> {
        let table = parser::parse_bytes(bytes)?;
        Ok(Self::normalize_table(table))
    }

    fn normalize_table(table: parser::RawTable) -> NormalizationRun {
        let mut records: Vec<WoqRecord> = table
            .rows
            .iter()
            .map(|row| WoqRecord::from_canonical(mapping::mapped_values(row)))
            .collect();

        // Ordinal assignment depends on this order and nothing else.
        records.sort_by_cached_key(|record| {
            (ordering_key(&record.contract_no), ordering_key(&record.order_no))
        });

        let mut previous_contract: Option<String> = None;
        let mut ordinal = 0u32;
        for record in &mut records {
            if previous_contract.as_deref() == Some(record.contract_no.as_str()) {
                ordinal += 1;
            } else {
                previous_contract = Some(record.contract_no.clone());
                ordinal = 1;
            }
            record.contract_ordinal = ordinal;
        }

        let observed: HashSet<String> = records
            .iter()
            .map(|record| marker_key(&record.closed_marker))
            .filter(|marker| !marker.is_empty())
            .collect();

        let mut diagnostics = Vec::new();
        match mapping::ClosedVocabulary::detect(&observed) {
            Some(vocabulary) => {
                for record in &mut records {
                    record.is_closed = vocabulary.matches(&marker_key(&record.closed_marker));
                }
            }
            None if observed.is_empty() => {}
            None => {
                let mut markers: Vec<&str> = observed.iter().map(String::as_str).collect();
                markers.sort_unstable();
                diagnostics.push(format!(
                    "closed markers not recognized ({}); treating every record as open",
                    markers.join(", ")
                ));
            }
        }

        let closed_count = records.iter().filter(|record| record.is_closed).count();
        NormalizationRun {
            total: records.len(),
            closed_count,
            records,
            diagnostics,
            persistence_warning: None,
        }
    }
}

/// Numeric order numbers sort numerically ahead of anything else, so ordinal
/// assignment does not flip between "9" and "10".
fn ordering_key(value: &str) -> (u8, u64, String) {
    match value.trim().parse::<u64>() {
        Ok(number) => (0, number, String::new()),
        Err(_) => (1, 0, value.trim().to_string()),
    }
}

fn marker_key(value: &str) -> String {
    value.trim().to_uppercase()
}
