//! Error types for CSV conversion and the export/import commands.

use std::path::PathBuf;

use kintone_core::{ApiError, ConfigurationError};
use thiserror::Error;

use crate::constants::RECORD_INDEX;

#[derive(Debug, Error)]
pub enum CsvError {
    /// A row reached grouping without the reserved index column.
    #[error("CSV row {row} has no `{RECORD_INDEX}` column")]
    MissingIndex { row: usize },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write CSV: {0}")]
    Write(String),
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Csv(#[from] CsvError),

    /// An upload failed after earlier chunks were stored. Running the import
    /// again adds those `added` records a second time.
    #[error("import stopped after {added} records were added: {source}")]
    PartialImport {
        added: usize,
        #[source]
        source: ApiError,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
