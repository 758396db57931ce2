use super::renewals::ValidatedLine;
use super::woq::WoqRecord;

/// Storage abstraction over the two staging tables so the controller can be
/// exercised without a database. Both `replace_*` calls use
/// delete-all-then-insert-all semantics; partial replaces must not survive.
pub trait StagingStore: Send + Sync {
    fn replace_validated(&self, lines: &[ValidatedLine]) -> Result<usize, StagingError>;
    fn load_validated(&self) -> Result<Vec<ValidatedLine>, StagingError>;
    fn replace_woq(&self, records: &[WoqRecord]) -> Result<usize, StagingError>;
    fn load_woq(&self) -> Result<Vec<WoqRecord>, StagingError>;
    /// Empties both tables. Called after a successful export and by
    /// state-clearing maintenance.
    fn truncate_all(&self) -> Result<(), StagingError>;
}

/// Error enumeration for staging failures.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("staging backend unavailable: {0}")]
    Unavailable(String),
    #[error("staged row malformed: {0}")]
    Corrupt(String),
}
