use std::path::PathBuf;

/// Failures surfaced by the loader and the aggregation routines.
///
/// Zero-denominator growth and share values are not errors; they come back
/// as `None` in the output rows.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    #[error("dataset not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("unknown dataset name: {0}")]
    UnknownDataset(String),

    #[error("failed to write {}: {source}", .path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("no records to aggregate")]
    EmptyInput,

    /// `record` is the 1-based data record number; 0 means the column is
    /// absent from the header.
    #[error("missing or unparseable value in column `{column}` (record {record})")]
    MissingValue { column: String, record: u64 },

    #[error("malformed table: {0}")]
    Malformed(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, MarketError>;
