//! Directory of JSON table exports, one `<table>.json` per [`TableKind`].
//!
//! Two layouts are accepted for each file:
//! - split: `{"columns": ["OrderID", ...], "rows": [[10248, ...], ...]}`
//! - records: `[{"OrderID": 10248, ...}, ...]`
//!
//! The split layout keeps the header even for empty tables, so prefer it for
//! exports that may legitimately be empty.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use shared_utils::env::get_env_var;
use snafu::{ResultExt, ensure};
use tracing::info;

use super::{
    ConnectivitySnafu, IoSnafu, MissingEnvVarSnafu, NotADirectorySnafu, ParseSnafu, ShapeSnafu,
    SourceError, SourceInitError, TableSource,
};
use crate::models::table::{Table, TableKind};

/// Environment variable consulted by [`JsonDirSource::from_env`].
pub const DATA_DIR_ENV: &str = "NORTHWIND_DATA_DIR";

#[derive(Deserialize)]
#[serde(untagged)]
enum TableFile {
    Split {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Records(Vec<IndexMap<String, Value>>),
}

/// Reads tables from `<dir>/<kind.name()>.json`.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    /// Opens a source rooted at `dir`, which must be an existing directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SourceInitError> {
        let dir = dir.into();
        ensure!(dir.is_dir(), NotADirectorySnafu { path: dir });
        Ok(Self { dir })
    }

    /// Opens the directory named by `NORTHWIND_DATA_DIR`.
    pub fn from_env() -> Result<Self, SourceInitError> {
        let dir = get_env_var(DATA_DIR_ENV).context(MissingEnvVarSnafu)?;
        Self::new(dir)
    }

    /// Root directory of this source.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `kind`.
    pub fn path_for(&self, kind: TableKind) -> PathBuf {
        self.dir.join(format!("{}.json", kind.name()))
    }
}

impl TableSource for JsonDirSource {
    fn fetch(&self, kind: TableKind) -> Result<Table, SourceError> {
        // The directory vanishing between runs is the file-system analogue of a
        // dropped connection.
        ensure!(
            self.dir.is_dir(),
            ConnectivitySnafu {
                message: format!("data directory {} is not available", self.dir.display())
            }
        );

        let path = self.path_for(kind);
        let text = std::fs::read_to_string(&path).context(IoSnafu { path: path.clone() })?;
        let file: TableFile =
            serde_json::from_str(&text).context(ParseSnafu { path: path.clone() })?;

        let table = match file {
            TableFile::Split { columns, rows } => {
                Table::new(kind, columns, rows).context(ShapeSnafu)?
            }
            TableFile::Records(records) => Table::from_records(kind, records),
        };

        info!(table = %kind, rows = table.len(), path = %path.display(), "extracted table");
        Ok(table)
    }

    fn describe(&self) -> String {
        format!("json directory {}", self.dir.display())
    }
}
