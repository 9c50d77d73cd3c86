//! Transform core of the sales analytics pipeline.
//!
//! Raw relational snapshots come in through [`sales_extract`]; this crate
//! turns them into the denormalised sales fact table ([`fact`]), segments
//! customers with RFM scoring ([`rfm`]), and merges both into the single
//! enriched table handed to the presentation layer ([`pipeline`]).
//!
//! Everything here is synchronous and a pure function of its inputs, so the
//! [`cache`] in front of it is an optimisation, never a correctness concern.

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod dates;
pub mod error;
pub mod fact;
pub mod filter;
pub mod geo;
pub mod load;
pub mod models;
pub mod pipeline;
pub mod rfm;
pub mod schema;

pub use error::{ErrorKind, EtlError};
pub use fact::{KeyPolicy, SalesFacts, build_sales_facts};
pub use models::fact::{EnrichedSalesLine, OUTPUT_COLUMNS, SalesFactLine};
pub use models::raw::RawTables;
pub use pipeline::{EnrichedSales, Pipeline, PipelineOptions, PipelineState, run_pipeline};
