//! Source abstraction for the raw sales tables.
//!
//! This module defines the [`TableSource`] trait, the unified interface the
//! pipeline uses to pull each raw [`Table`] snapshot from wherever it lives
//! (a directory of JSON exports, an in-process fixture, a database adapter).
//!
//! Fetching is synchronous: one blocking round-trip per table, issued
//! sequentially by the caller. Sources are used through `&dyn TableSource`
//! so the runtime can pick one at startup.
//!
//! # Example
//!
//! ```rust
//! use sales_extract::sources::{SourceError, TableSource};
//! use sales_extract::{Table, TableKind};
//!
//! struct EmptySource;
//!
//! impl TableSource for EmptySource {
//!     fn fetch(&self, kind: TableKind) -> Result<Table, SourceError> {
//!         Ok(Table::from_records(kind, vec![]))
//!     }
//! }
//! ```

pub mod json_dir;
pub mod memory;

use std::path::PathBuf;

use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::table::{Table, TableKind, TableShapeError};

/// Trait for fetching one raw table snapshot.
pub trait TableSource {
    /// Fetches the full current snapshot of `kind`.
    ///
    /// # Returns
    ///
    /// * `Ok(Table)` - Every row of the table, header included.
    /// * `Err(SourceError)` - The source was unreachable or the payload unreadable.
    fn fetch(&self, kind: TableKind) -> Result<Table, SourceError>;

    /// Human-readable description used in log lines.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Errors that can occur while constructing a source.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// The configured location is not a directory.
    #[snafu(display("Not a directory: {}", path.display()))]
    NotADirectory { path: PathBuf, backtrace: Backtrace },
}

/// Errors that can occur within a `TableSource` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceError {
    /// The source could not be reached (or refused us) at all.
    #[snafu(display("Source unreachable: {message}"))]
    Connectivity {
        message: String,
        backtrace: Backtrace,
    },

    /// Reading the table payload failed.
    #[snafu(display("Failed to read {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The payload was readable but not a table.
    #[snafu(display("Failed to parse {}: {source}", path.display()))]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// The payload parsed but its rows don't match its header.
    #[snafu(display("Malformed table: {source}"))]
    Shape {
        source: TableShapeError,
        backtrace: Backtrace,
    },
}

impl SourceError {
    /// True for errors that mean the source itself is unavailable.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, SourceError::Connectivity { .. })
    }
}
