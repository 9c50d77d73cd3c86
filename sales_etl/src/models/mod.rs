//! Row types flowing through the pipeline.
//!
//! - [`raw`]: the seven typed source records, plus the untyped snapshot
//!   ([`raw::RawTables`]) they are decoded from.
//! - [`fact`]: the denormalised sales line and its segment-enriched form.

pub mod fact;
pub mod raw;
