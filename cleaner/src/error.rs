//! Error types for the cleaning step.
//!
//! One enum per layer, converted upward with `From` so `?` works across
//! boundaries:
//!
//! - [`CsvError`] - reading, decoding and writing delimited text
//! - [`SchemaError`] - missing columns and values of the wrong type
//! - [`TableError`] - anything that can go wrong while loading a table
//! - [`ArtifactError`] - artifact references and the artifact store
//! - [`RunError`] - top-level run orchestration
//!
//! Only [`RunError`] distinguishes a failed fetch from a failed publish; the
//! store itself reports both as [`ArtifactError`].

use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing CSV text.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read or write a file.
    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),

    /// Content could not be decoded.
    #[error("Failed to decode content as {0}")]
    Encoding(String),

    /// Malformed CSV record.
    #[error("Invalid CSV at line {line}: {message}")]
    Malformed { line: u64, message: String },

    /// No header row.
    #[error("CSV file is empty")]
    EmptyFile,
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(e) => CsvError::Io(e),
            _ => CsvError::Malformed { line, message },
        }
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// The table does not have the shape the cleaner needs.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    /// A required column is absent.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A value in a numeric column is not a number.
    #[error("Line {line}, column '{column}' (value '{value}'): not a number")]
    NotNumeric {
        line: usize,
        column: String,
        value: String,
    },

    /// A column holds a different kind of data than expected.
    #[error("Column '{column}' holds {found} values, expected {expected}")]
    WrongType {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Columns of a table disagree on the number of rows.
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
}

/// Errors while loading a table from disk.
#[derive(Debug, Error)]
pub enum TableError {
    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

// =============================================================================
// Artifact Errors
// =============================================================================

/// Errors from artifact references and the artifact store.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Reference is not of the form `name[:version]`.
    #[error("Invalid artifact reference '{0}' (expected name:version)")]
    InvalidReference(String),

    /// No artifact with that name.
    #[error("Artifact not found: {0}")]
    NotFound(String),

    /// The artifact exists but not at that version.
    #[error("Artifact '{name}' has no version {version}")]
    VersionNotFound { name: String, version: String },

    /// The store refused the write.
    #[error("Publish rejected: {0}")]
    PublishRejected(String),

    /// IO error.
    #[error("Artifact store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Artifact manifest error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Run Errors (top-level)
// =============================================================================

/// Top-level errors of a cleaning run.
///
/// Every variant is fatal: the run stops and nothing is published.
#[derive(Debug, Error)]
pub enum RunError {
    /// The input artifact could not be resolved or read.
    #[error("Input fetch failed: {0}")]
    Fetch(#[source] ArtifactError),

    /// The output artifact could not be registered.
    #[error("Publish failed: {0}")]
    Publish(#[source] ArtifactError),

    /// Any other store failure, e.g. writing the run record.
    #[error("Artifact store error: {0}")]
    Store(#[from] ArtifactError),

    /// Loading or writing a table failed.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// The table does not have the expected columns or types.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Run parameters could not be recorded.
    #[error("Invalid run config: {0}")]
    Config(String),
}

impl From<TableError> for RunError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::Csv(e) => RunError::Csv(e),
            TableError::Schema(e) => RunError::Schema(e),
        }
    }
}

impl From<serde_json::Error> for RunError {
    fn from(err: serde_json::Error) -> Self {
        RunError::Config(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for table loading.
pub type TableResult<T> = Result<T, TableError>;

/// Result type for artifact operations.
pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Result type for run operations.
pub type RunResult<T> = Result<T, RunError>;
