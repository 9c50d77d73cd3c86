use rust_decimal::Decimal;
use sales_extract::{Table, TableKind, TableSource};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::info;

use crate::error::EtlError;

/// One snapshot of the seven source tables, as extracted.
#[derive(Debug, Clone)]
pub struct RawTables {
    /// `customers`
    pub customers: Table,
    /// `orders`
    pub orders: Table,
    /// `order_details`
    pub order_details: Table,
    /// `products`
    pub products: Table,
    /// `categories`
    pub categories: Table,
    /// `employees`
    pub employees: Table,
    /// `suppliers`
    pub suppliers: Table,
}

impl RawTables {
    /// Fetch all seven tables from `source`, one at a time, in the fixed
    /// order of [`TableKind::ALL`]. The first failure aborts the snapshot.
    pub fn extract(source: &dyn TableSource) -> Result<Self, EtlError> {
        let fetch = |table: TableKind| {
            let t = source
                .fetch(table)
                .map_err(|source| EtlError::Extraction { table, source })?;
            info!(table = %table, rows = t.len(), "extracted");
            Ok::<_, EtlError>(t)
        };

        Ok(Self {
            customers: fetch(TableKind::Customers)?,
            orders: fetch(TableKind::Orders)?,
            order_details: fetch(TableKind::OrderDetails)?,
            products: fetch(TableKind::Products)?,
            categories: fetch(TableKind::Categories)?,
            employees: fetch(TableKind::Employees)?,
            suppliers: fetch(TableKind::Suppliers)?,
        })
    }

    /// Borrow the table of the given kind.
    pub fn get(&self, kind: TableKind) -> &Table {
        match kind {
            TableKind::Customers => &self.customers,
            TableKind::Orders => &self.orders,
            TableKind::OrderDetails => &self.order_details,
            TableKind::Products => &self.products,
            TableKind::Categories => &self.categories,
            TableKind::Employees => &self.employees,
            TableKind::Suppliers => &self.suppliers,
        }
    }
}

/// A row of `customers`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Customer {
    /// Primary key.
    #[serde(rename = "CustomerID", deserialize_with = "text_key")]
    pub customer_id: String,
    /// Contact person.
    #[serde(rename = "ContactName")]
    pub contact_name: Option<String>,
    /// Country name; feeds the region and ISO3 enrichment.
    #[serde(rename = "Country")]
    pub country: Option<String>,
}

/// A row of `orders`.
///
/// Dates stay raw here. They are coerced by the fact builder so that a bad
/// value degrades to a warning instead of failing the decode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Order {
    /// Primary key.
    #[serde(rename = "OrderID")]
    pub order_id: i64,
    /// FK to `customers`.
    #[serde(rename = "CustomerID", deserialize_with = "opt_text_key")]
    pub customer_id: Option<String>,
    /// FK to `employees`.
    #[serde(rename = "EmployeeID")]
    pub employee_id: Option<i64>,
    /// Raw order date cell.
    #[serde(rename = "OrderDate")]
    pub order_date: Value,
    /// Raw shipped date cell.
    #[serde(rename = "ShippedDate")]
    pub shipped_date: Value,
}

/// A row of `order_details`: one product within one order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderDetail {
    /// FK to `orders`.
    #[serde(rename = "OrderID")]
    pub order_id: i64,
    /// FK to `products`.
    #[serde(rename = "ProductID")]
    pub product_id: i64,
    /// Price per unit at the time of sale.
    #[serde(rename = "UnitPrice")]
    pub unit_price: Decimal,
    /// Units sold.
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    /// Fractional discount, nominally in `[0, 1]`.
    #[serde(rename = "Discount")]
    pub discount: Decimal,
}

/// A row of `products`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    /// Primary key.
    #[serde(rename = "ProductID")]
    pub product_id: i64,
    /// Display name.
    #[serde(rename = "ProductName")]
    pub product_name: Option<String>,
    /// FK to `suppliers`.
    #[serde(rename = "SupplierID")]
    pub supplier_id: Option<i64>,
    /// FK to `categories`.
    #[serde(rename = "CategoryID")]
    pub category_id: Option<i64>,
}

/// A row of `categories`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    /// Primary key.
    #[serde(rename = "CategoryID")]
    pub category_id: i64,
    /// Display name.
    #[serde(rename = "CategoryName")]
    pub category_name: Option<String>,
}

/// A row of `employees`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Employee {
    /// Primary key.
    #[serde(rename = "EmployeeID")]
    pub employee_id: i64,
    /// Given name.
    #[serde(rename = "FirstName")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(rename = "LastName")]
    pub last_name: Option<String>,
}

impl Employee {
    /// `"<FirstName> <LastName>"`, or `None` when either part is missing.
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            _ => None,
        }
    }
}

/// A row of `suppliers`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Supplier {
    /// Primary key.
    #[serde(rename = "SupplierID")]
    pub supplier_id: i64,
    /// Supplier company name.
    #[serde(rename = "CompanyName")]
    pub company_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Int(i64),
}

impl From<TextOrNumber> for String {
    fn from(v: TextOrNumber) -> Self {
        match v {
            TextOrNumber::Text(s) => s,
            TextOrNumber::Int(n) => n.to_string(),
        }
    }
}

// Northwind keys customers by text, but some exports carry numeric IDs.
fn text_key<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    TextOrNumber::deserialize(d).map(String::from)
}

fn opt_text_key<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<TextOrNumber>::deserialize(d)?.map(String::from))
}
