//! Extraction surface for the sales ETL.
//!
//! The transform core never talks to a database or a file directly. It asks a
//! [`TableSource`](crate::sources::TableSource) for each of the seven raw
//! [`Table`](crate::models::table::Table)s, one blocking fetch per table, and
//! works on the returned snapshot.

pub mod models;
pub mod sources;

pub use models::table::{Table, TableKind};
pub use sources::{SourceError, SourceInitError, TableSource};
