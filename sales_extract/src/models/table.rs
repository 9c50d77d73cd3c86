//! Canonical in-memory representation of one raw relational table.
//!
//! A [`Table`] is deliberately untyped: named, ordered columns and rows of JSON
//! scalar cells, exactly as the extraction layer delivered them. Typing and
//! column validation happen at the fact-builder boundary in `sales_etl`.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::{Snafu, ensure};

/// The seven source tables of the sales schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Customers,
    Orders,
    OrderDetails,
    Products,
    Categories,
    Employees,
    Suppliers,
}

impl TableKind {
    /// Extraction order. Every kind appears exactly once.
    pub const ALL: [TableKind; 7] = [
        TableKind::Customers,
        TableKind::Orders,
        TableKind::OrderDetails,
        TableKind::Products,
        TableKind::Categories,
        TableKind::Employees,
        TableKind::Suppliers,
    ];

    /// Short snake_case name, also used as the file stem by directory sources.
    pub fn name(self) -> &'static str {
        match self {
            TableKind::Customers => "customers",
            TableKind::Orders => "orders",
            TableKind::OrderDetails => "order_details",
            TableKind::Products => "products",
            TableKind::Categories => "categories",
            TableKind::Employees => "employees",
            TableKind::Suppliers => "suppliers",
        }
    }

    /// Name of the table in the upstream relational database.
    pub fn source_name(self) -> &'static str {
        match self {
            TableKind::Customers => "Customers",
            TableKind::Orders => "Orders",
            TableKind::OrderDetails => "Order Details",
            TableKind::Products => "Products",
            TableKind::Categories => "Categories",
            TableKind::Employees => "Employees",
            TableKind::Suppliers => "Suppliers",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A table whose rows don't line up with its header.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TableShapeError {
    /// A row carries more or fewer cells than there are columns.
    #[snafu(display("table {table}: row {row} has {found} cells, expected {expected}"))]
    RowWidth {
        table: TableKind,
        row: usize,
        found: usize,
        expected: usize,
    },

    /// The same column name appears twice in the header.
    #[snafu(display("table {table}: duplicate column {column}"))]
    DuplicateColumn { table: TableKind, column: String },
}

/// A full snapshot of one raw table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    kind: TableKind,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Builds a table from a header and row-major cells.
    ///
    /// Errors when a column name repeats or a row's width differs from the header.
    pub fn new(
        kind: TableKind,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, TableShapeError> {
        let mut seen = IndexSet::with_capacity(columns.len());
        for c in &columns {
            ensure!(
                seen.insert(c.as_str()),
                DuplicateColumnSnafu {
                    table: kind,
                    column: c.clone()
                }
            );
        }
        for (i, row) in rows.iter().enumerate() {
            ensure!(
                row.len() == columns.len(),
                RowWidthSnafu {
                    table: kind,
                    row: i,
                    found: row.len(),
                    expected: columns.len()
                }
            );
        }
        Ok(Self {
            kind,
            columns,
            rows,
        })
    }

    /// Builds a table from record-oriented rows.
    ///
    /// The header is the union of all record keys in first-seen order; a record
    /// that lacks one of them gets `null` in that cell.
    pub fn from_records(kind: TableKind, records: Vec<IndexMap<String, Value>>) -> Self {
        let mut header: IndexSet<String> = IndexSet::new();
        for rec in &records {
            for k in rec.keys() {
                if !header.contains(k) {
                    header.insert(k.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|mut rec| {
                header
                    .iter()
                    .map(|c| rec.swap_remove(c).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self {
            kind,
            columns: header.into_iter().collect(),
            rows,
        }
    }

    /// Which source table this is.
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Column names in source order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row-major cells; every row is as wide as [`Table::columns`].
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Position of `name` in the header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows (it may still have a header).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_ragged_rows() {
        let err = Table::new(
            TableKind::Categories,
            vec!["CategoryID".into(), "CategoryName".into()],
            vec![vec![json!(1), json!("Beverages")], vec![json!(2)]],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "table categories: row 1 has 1 cells, expected 2"
        );
    }

    #[test]
    fn rejects_duplicate_columns() {
        let err = Table::new(
            TableKind::Categories,
            vec!["CategoryID".into(), "CategoryID".into()],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, TableShapeError::DuplicateColumn { .. }));
    }

    #[test]
    fn records_fill_missing_keys_with_null() {
        let recs = vec![
            IndexMap::from([
                ("SupplierID".to_string(), json!(1)),
                ("CompanyName".to_string(), json!("Exotic Liquids")),
            ]),
            IndexMap::from([
                ("SupplierID".to_string(), json!(2)),
                ("Country".to_string(), json!("USA")),
            ]),
        ];
        let t = Table::from_records(TableKind::Suppliers, recs);

        assert_eq!(t.columns(), ["SupplierID", "CompanyName", "Country"]);
        assert_eq!(t.rows()[0], vec![json!(1), json!("Exotic Liquids"), Value::Null]);
        assert_eq!(t.rows()[1], vec![json!(2), Value::Null, json!("USA")]);
        assert_eq!(t.column_index("Country"), Some(2));
    }

    #[test]
    fn all_kinds_have_distinct_names() {
        let names: IndexSet<_> = TableKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), TableKind::ALL.len());
        assert_eq!(TableKind::OrderDetails.to_string(), "order_details");
        assert_eq!(TableKind::OrderDetails.source_name(), "Order Details");
    }
}
