//! Column contracts of the source tables and decoding into typed records.
//!
//! Each record type names the columns it needs. Decoding checks those
//! columns exist (fatal [`EtlError::SchemaMismatch`] otherwise), projects
//! them out of every row, and hands the projection to serde. Columns the
//! contract doesn't name are ignored.

use sales_extract::{Table, TableKind};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::EtlError;
use crate::models::raw::{Category, Customer, Employee, Order, OrderDetail, Product, Supplier};

/// A typed row of one source table.
pub trait RawRecord: DeserializeOwned {
    /// Table the record is decoded from.
    const TABLE: TableKind;
    /// Columns the table must carry.
    const COLUMNS: &'static [&'static str];
}

impl RawRecord for Customer {
    const TABLE: TableKind = TableKind::Customers;
    const COLUMNS: &'static [&'static str] = &["CustomerID", "ContactName", "Country"];
}

impl RawRecord for Order {
    const TABLE: TableKind = TableKind::Orders;
    const COLUMNS: &'static [&'static str] =
        &["OrderID", "CustomerID", "EmployeeID", "OrderDate", "ShippedDate"];
}

impl RawRecord for OrderDetail {
    const TABLE: TableKind = TableKind::OrderDetails;
    const COLUMNS: &'static [&'static str] =
        &["OrderID", "ProductID", "UnitPrice", "Quantity", "Discount"];
}

impl RawRecord for Product {
    const TABLE: TableKind = TableKind::Products;
    const COLUMNS: &'static [&'static str] =
        &["ProductID", "ProductName", "SupplierID", "CategoryID"];
}

impl RawRecord for Category {
    const TABLE: TableKind = TableKind::Categories;
    const COLUMNS: &'static [&'static str] = &["CategoryID", "CategoryName"];
}

impl RawRecord for Employee {
    const TABLE: TableKind = TableKind::Employees;
    const COLUMNS: &'static [&'static str] = &["EmployeeID", "FirstName", "LastName"];
}

impl RawRecord for Supplier {
    const TABLE: TableKind = TableKind::Suppliers;
    const COLUMNS: &'static [&'static str] = &["SupplierID", "CompanyName"];
}

/// Positions of `columns` within `table`, or the first one missing.
pub fn require_columns(
    table: &Table,
    columns: &[&'static str],
) -> Result<Vec<usize>, EtlError> {
    columns
        .iter()
        .map(|&column| {
            table.column_index(column).ok_or(EtlError::SchemaMismatch {
                table: table.kind(),
                column,
            })
        })
        .collect()
}

/// Decode every row of `table` as `T`.
pub fn decode<T: RawRecord>(table: &Table) -> Result<Vec<T>, EtlError> {
    let positions = require_columns(table, T::COLUMNS)?;

    table
        .rows()
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let mut projected = Map::with_capacity(positions.len());
            for (&name, &pos) in T::COLUMNS.iter().zip(&positions) {
                let cell = cells.get(pos).cloned().unwrap_or(Value::Null);
                projected.insert(name.to_string(), cell);
            }
            serde_json::from_value(Value::Object(projected)).map_err(|source| {
                EtlError::InvalidValue {
                    table: T::TABLE,
                    row,
                    source,
                }
            })
        })
        .collect()
}
