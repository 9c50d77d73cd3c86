//! Error type shared by every stage of the pipeline.

use sales_extract::{SourceError, TableKind};
use thiserror::Error;

use crate::pipeline::PipelineState;
use crate::rfm::Metric;

/// The unified error type for the `sales_etl` crate.
///
/// Every variant is fatal for the run that raised it. Recoverable
/// data-quality problems never surface here; they are counted in
/// [`DataQualityReport`](crate::fact::DataQualityReport) instead.
#[derive(Debug, Error)]
pub enum EtlError {
    /// A source table could not be fetched.
    #[error("extraction of {table} failed: {source}")]
    Extraction {
        /// Table being fetched when the source failed.
        table: TableKind,
        /// What the source reported.
        #[source]
        source: SourceError,
    },

    /// An input table lacks a column the fact builder needs.
    #[error("table {table} is missing required column {column}")]
    SchemaMismatch {
        /// Offending table.
        table: TableKind,
        /// Name of the absent column.
        column: &'static str,
    },

    /// A required cell holds a value of the wrong type (e.g. text in UnitPrice).
    #[error("table {table} row {row}: {source}")]
    InvalidValue {
        /// Offending table.
        table: TableKind,
        /// Zero-based row position in the table.
        row: usize,
        /// Decoder message, naming the field where it can.
        #[source]
        source: serde_json::Error,
    },

    /// A join's right-hand table repeats a key, which would duplicate rows.
    #[error("table {table} has duplicate key {key}; joining it would fan out rows")]
    DuplicateKey {
        /// Right-hand table of the join.
        table: TableKind,
        /// The repeated key, rendered for display.
        key: String,
    },

    /// A money computation left the range of `Decimal`.
    #[error("table {table} row {row}: {field} overflows the decimal range")]
    Overflow {
        /// Table the offending line came from.
        table: TableKind,
        /// Zero-based position of the line.
        row: usize,
        /// Column or metric being computed.
        field: &'static str,
    },

    /// No customer has a usable order date, so there is nothing to score.
    #[error("no customer with a dated order; RFM needs a non-empty population")]
    EmptyPopulation,

    /// A metric has too few distinct values for four equal-population bins.
    #[error("{metric} has {distinct} distinct values; quartile scoring needs at least 4")]
    DegeneratePopulation {
        /// Metric being scored.
        metric: Metric,
        /// Distinct values observed across the population.
        distinct: usize,
    },

    /// Quartile boundaries collapsed onto each other.
    #[error("{metric} quartile edges are not unique; cannot form 4 equal-population bins")]
    DuplicateQuartileEdges {
        /// Metric being scored.
        metric: Metric,
    },

    /// The orchestrator was asked to move along an edge its state machine lacks.
    #[error("illegal pipeline transition {from:?} -> {to:?}")]
    InvalidTransition {
        /// State before the attempted move.
        from: PipelineState,
        /// Requested state.
        to: PipelineState,
    },

    /// Writing the enriched table out failed.
    #[error("sink write failed: {0}")]
    Sink(#[source] std::io::Error),
}

/// Coarse error taxonomy used for reporting and exit handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source unreachable, unauthenticated or unreadable.
    Connectivity,
    /// Input tables do not honour the column/key contract.
    SchemaMismatch,
    /// Population too small or too uniform for quartile scoring.
    DegeneratePopulation,
    /// Bugs and output failures.
    Internal,
}

impl EtlError {
    /// Which taxonomy bucket this error falls into.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EtlError::Extraction { .. } => ErrorKind::Connectivity,
            EtlError::SchemaMismatch { .. }
            | EtlError::InvalidValue { .. }
            | EtlError::DuplicateKey { .. }
            | EtlError::Overflow { .. } => ErrorKind::SchemaMismatch,
            EtlError::EmptyPopulation
            | EtlError::DegeneratePopulation { .. }
            | EtlError::DuplicateQuartileEdges { .. } => ErrorKind::DegeneratePopulation,
            EtlError::InvalidTransition { .. } | EtlError::Sink(_) => ErrorKind::Internal,
        }
    }
}
