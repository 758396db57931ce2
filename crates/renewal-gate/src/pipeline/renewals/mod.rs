//! Group validation of the renewal feed.
//!
//! Lines are partitioned by (client, maintenance) and every group runs the
//! rule ladder once; the verdict is broadcast to each of its lines.

mod config;
mod domain;
mod parser;
mod rules;

#[cfg(test)]
mod tests;

pub use config::{RuleBook, F057_REFERENCE};
pub use domain::{
    GroupOutcome, LineKind, OutcomeState, RenewalLine, ValidatedLine, ValidationStats,
};

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::pipeline::PipelineError;

/// Output of one validation pass over a renewal feed.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationRun {
    pub lines: Vec<ValidatedLine>,
    pub stats: ValidationStats,
    /// Set by the controller when staging the Correct lines failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_warning: Option<String>,
}

/// Parses, groups and classifies a renewal feed against one rule book.
pub struct RenewalValidator {
    book: RuleBook,
}

impl RenewalValidator {
    pub fn new(book: RuleBook) -> Self {
        Self { book }
    }

    pub fn validate_path<P: AsRef<Path>>(&self, path: P) -> Result<ValidationRun, PipelineError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| {
            PipelineError::source_read_io(
                format!("renewal feed {} not readable", path.display()),
                source,
            )
        })?;
        let metadata = file.metadata().map_err(|source| {
            PipelineError::source_read_io(
                format!("renewal feed {} not readable", path.display()),
                source,
            )
        })?;
        if metadata.len() == 0 {
            return Err(PipelineError::source_read(format!(
                "renewal feed {} is empty",
                path.display()
            )));
        }
        self.validate_reader(file)
    }

    pub fn validate_reader<R: Read>(&self, reader: R) -> Result<ValidationRun, PipelineError> {
        let parsed = parser::parse_lines(reader)?;
        if parsed.is_empty() {
            return Err(PipelineError::EmptyResult(
                "no renewal lines left after cleaning".to_string(),
            ));
        }
        Ok(self.validate_lines(parsed))
    }

    /// Grouping and rule evaluation over already-cleaned lines.
    pub fn validate_lines(&self, parsed: Vec<RenewalLine>) -> ValidationRun {
        let mut groups: BTreeMap<(String, String), Vec<RenewalLine>> = BTreeMap::new();
        for line in parsed {
            groups
                .entry((line.client_no.clone(), line.maintenance_no.clone()))
                .or_default()
                .push(line);
        }

        let group_count = groups.len();
        let mut lines = Vec::new();
        let mut correct_lines = 0usize;

        for (_key, group) in groups {
            let outcome = rules::evaluate_group(&group, &self.book);
            if outcome.state == OutcomeState::Correct {
                correct_lines += group.len();
            }
            for line in group {
                lines.push(ValidatedLine {
                    line,
                    outcome: outcome.clone(),
                });
            }
        }

        let stats = ValidationStats {
            total_lines: lines.len(),
            correct_lines,
            incorrect_lines: lines.len() - correct_lines,
            groups: group_count,
        };

        ValidationRun {
            lines,
            stats,
            persistence_warning: None,
        }
    }
}
