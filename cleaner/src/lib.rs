//! # basic-cleaning - price and location cleaning for rental listings
//!
//! Fetches a listings CSV from an artifact store, drops price outliers and
//! listings outside New York City, normalizes review dates, and publishes the
//! result as a new artifact version.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Artifact   │────▶│   Parser    │────▶│   Cleaner   │────▶│  Artifact   │
//! │ name:latest │     │  (typed)    │     │ price/date/ │     │ name:vN+1   │
//! │             │     │             │     │    geo      │     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use basic_cleaning::{clean, read_table_file};
//!
//! let table = read_table_file("sample.csv")?;
//! let cleaned = clean(&table, 10.0, 350.0)?;
//! println!("Kept {} of {} listings", cleaned.len(), table.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Layered error types
//! - [`models`] - In-memory table
//! - [`parser`] - CSV reading and writing
//! - [`clean`] - The cleaning transformation
//! - [`artifact`] - Artifact references and stores
//! - [`run`] - Tracking run handle
//! - [`config`] - Environment settings
//! - [`logs`] - Log output
//! - [`pipeline`] - The job, end to end

// Core modules
pub mod error;
pub mod models;

// Reading and writing
pub mod parser;

// Transformation
pub mod clean;

// Tracking
pub mod artifact;
pub mod run;

pub mod config;
pub mod logs;
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ArtifactError, CsvError, RunError, SchemaError, TableError,
    ArtifactResult, CsvResult, RunResult, TableResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Column, ColumnData, Numeric, Table};

// =============================================================================
// Re-exports - CSV
// =============================================================================

pub use parser::{
    read_table_bytes, read_table_file, parse_table,
    write_table, write_table_file, table_to_csv,
};

// =============================================================================
// Re-exports - Cleaning
// =============================================================================

pub use clean::{
    clean, clean_with_report, filter_location, filter_price, normalize_last_review,
    parse_review_date, CleanReport, Cleaned, GeoBounds, PriceRange, NYC_BOUNDS,
};

// =============================================================================
// Re-exports - Artifacts and runs
// =============================================================================

pub use artifact::{
    ArtifactRef, ArtifactSpec, ArtifactStore, ArtifactVersion,
    LocalArtifactStore, VersionSelector,
};

pub use run::{Run, RunInfo, RunRecord, RunStatus, UsedArtifact};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use config::Settings;
pub use pipeline::{go, CleaningArgs, CleaningOutcome};
