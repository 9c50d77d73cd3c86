//! In-process tables, for embedding callers and tests.

use indexmap::IndexMap;

use super::{SourceError, TableSource};
use crate::models::table::{Table, TableKind};

/// Serves tables held in memory; a kind that was never inserted is unreachable.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: IndexMap<TableKind, Table>,
}

impl MemorySource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) the table for its kind.
    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.kind(), table);
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with(mut self, table: Table) -> Self {
        self.insert(table);
        self
    }

    /// Drops the table for `kind`, returning it if present.
    pub fn remove(&mut self, kind: TableKind) -> Option<Table> {
        self.tables.shift_remove(&kind)
    }
}

impl TableSource for MemorySource {
    fn fetch(&self, kind: TableKind) -> Result<Table, SourceError> {
        self.tables.get(&kind).cloned().ok_or_else(|| {
            super::ConnectivitySnafu {
                message: format!("table {kind} is not loaded"),
            }
            .build()
        })
    }

    fn describe(&self) -> String {
        format!("memory ({} tables)", self.tables.len())
    }
}
