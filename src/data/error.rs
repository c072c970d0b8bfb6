use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to load the dataset or the geographic ordering.
///
/// Always fatal for the load that produced it; nothing partial is kept.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
    #[error("'{}' is missing required column(s): {}", .path.display(), .missing.join(", "))]
    MissingColumns { path: PathBuf, missing: Vec<String> },
    #[error("malformed CSV in '{}': {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("malformed parquet file: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("malformed arrow data: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, DataLoadError>;
