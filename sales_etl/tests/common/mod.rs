#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;
use sales_etl::RawTables;
use sales_extract::{Table, TableKind, sources::memory::MemorySource};
use serde_json::{Value, json};

/// Build a table from a JSON array of row objects.
pub fn table(kind: TableKind, rows: Value) -> Table {
    let records: Vec<IndexMap<String, Value>> = serde_json::from_value(rows).unwrap();
    Table::from_records(kind, records)
}

pub fn products() -> Table {
    table(
        TableKind::Products,
        json!([
            {"ProductID": 11, "ProductName": "Queso Cabrales", "SupplierID": 5, "CategoryID": 4},
            {"ProductID": 14, "ProductName": "Tofu", "SupplierID": 6, "CategoryID": 6},
        ]),
    )
}

pub fn categories() -> Table {
    table(
        TableKind::Categories,
        json!([
            {"CategoryID": 4, "CategoryName": "Dairy Products"},
            {"CategoryID": 6, "CategoryName": "Meat/Poultry"},
        ]),
    )
}

pub fn suppliers() -> Table {
    table(
        TableKind::Suppliers,
        json!([
            {"SupplierID": 5, "CompanyName": "Cooperativa de Quesos"},
            {"SupplierID": 6, "CompanyName": "Mayumi's"},
        ]),
    )
}

pub fn employees() -> Table {
    table(
        TableKind::Employees,
        json!([
            {"EmployeeID": 3, "FirstName": "Janet", "LastName": "Leverling"},
            {"EmployeeID": 5, "FirstName": "Steven", "LastName": "Buchanan"},
        ]),
    )
}

/// Two customers, two orders, two lines: the smallest complete snapshot.
pub fn sample_source() -> MemorySource {
    MemorySource::new()
        .with(table(
            TableKind::Customers,
            json!([
                {"CustomerID": "ALFKI", "ContactName": "Maria Anders", "Country": "Germany"},
                {"CustomerID": "ANATR", "ContactName": "Ana Trujillo", "Country": "Mexico"},
            ]),
        ))
        .with(table(
            TableKind::Orders,
            json!([
                {"OrderID": 10248, "CustomerID": "ALFKI", "EmployeeID": 5,
                 "OrderDate": "1996-07-04", "ShippedDate": "1996-07-16"},
                {"OrderID": 10249, "CustomerID": "ANATR", "EmployeeID": 3,
                 "OrderDate": "1996-07-05", "ShippedDate": "1996-07-10"},
            ]),
        ))
        .with(table(
            TableKind::OrderDetails,
            json!([
                {"OrderID": 10248, "ProductID": 11, "UnitPrice": 14.0, "Quantity": 12, "Discount": 0},
                {"OrderID": 10249, "ProductID": 14, "UnitPrice": 18.6, "Quantity": 9, "Discount": 0.1},
            ]),
        ))
        .with(products())
        .with(categories())
        .with(employees())
        .with(suppliers())
}

pub fn sample_raw() -> RawTables {
    RawTables::extract(&sample_source()).unwrap()
}

pub const LADDER_IDS: [&str; 8] = [
    "ALFKI", "ANATR", "ANTON", "AROUT", "BERGS", "BLAUS", "BLONP", "BOLID",
];

const LADDER_COUNTRIES: [&str; 8] = [
    "Germany", "Mexico", "Mexico", "UK", "Sweden", "Germany", "France", "Spain",
];

pub fn base_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(1997, 1, 1).unwrap()
}

/// `n` customers (n <= 8) where customer `k` (1-based) places `k` orders,
/// the last one on day `3k` after [`base_day`], each a single line of
/// `k` units at 10.00. So frequency is `k`, monetary value `10·k²`, and
/// recency shrinks as `k` grows.
pub fn ladder_source(n: usize) -> MemorySource {
    let mut customers = Vec::new();
    let mut orders = Vec::new();
    let mut details = Vec::new();

    for k in 1..=n {
        let id = LADDER_IDS[k - 1];
        customers.push(json!({
            "CustomerID": id,
            "ContactName": format!("Contact {k}"),
            "Country": LADDER_COUNTRIES[k - 1],
        }));
        for j in 0..k {
            let order_id = 10_000 + (k * 100 + j) as i64;
            let day = base_day() + Duration::days((3 * k - (k - 1 - j)) as i64);
            orders.push(json!({
                "OrderID": order_id,
                "CustomerID": id,
                "EmployeeID": if j % 2 == 0 { 5 } else { 3 },
                "OrderDate": day.format("%Y-%m-%d").to_string(),
                "ShippedDate": if j == 0 { Value::Null } else { json!(day.format("%Y-%m-%d 00:00:00").to_string()) },
            }));
            details.push(json!({
                "OrderID": order_id,
                "ProductID": if k % 2 == 0 { 11 } else { 14 },
                "UnitPrice": "10.00",
                "Quantity": k,
                "Discount": 0,
            }));
        }
    }

    MemorySource::new()
        .with(table(TableKind::Customers, Value::Array(customers)))
        .with(table(TableKind::Orders, Value::Array(orders)))
        .with(table(TableKind::OrderDetails, Value::Array(details)))
        .with(products())
        .with(categories())
        .with(employees())
        .with(suppliers())
}
