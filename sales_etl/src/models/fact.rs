use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::geo::Region;
use crate::rfm::segment::Segment;

/// Column order of the sales fact table.
pub const FACT_COLUMNS: [&str; 20] = [
    "OrderID",
    "OrderDate",
    "ShippedDate",
    "CustomerID",
    "ContactName",
    "Region",
    "Country",
    "CountryISO3",
    "EmployeeID",
    "EmployeeName",
    "ProductID",
    "ProductName",
    "CategoryID",
    "CategoryName",
    "SupplierID",
    "SupplierName",
    "UnitPrice",
    "Quantity",
    "Discount",
    "Revenue",
];

/// Column order of the enriched output: the fact columns, then `Segment`.
pub const OUTPUT_COLUMNS: [&str; 21] = {
    let mut out = [""; 21];
    let mut i = 0;
    while i < FACT_COLUMNS.len() {
        out[i] = FACT_COLUMNS[i];
        i += 1;
    }
    out[20] = "Segment";
    out
};

/// One product within one order, with every dimension resolved.
///
/// Fields declare in [`FACT_COLUMNS`] order, so serializing a line yields
/// the output columns in the contractual order. Any dimension whose join
/// found no match is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesFactLine {
    /// Order the line belongs to.
    #[serde(rename = "OrderID")]
    pub order_id: i64,
    /// When the order was placed; `None` if missing or unparseable.
    #[serde(rename = "OrderDate")]
    pub order_date: Option<NaiveDateTime>,
    /// When the order shipped; `None` if not shipped or unparseable.
    #[serde(rename = "ShippedDate")]
    pub shipped_date: Option<NaiveDateTime>,
    /// Buying customer.
    #[serde(rename = "CustomerID")]
    pub customer_id: Option<String>,
    /// Customer contact.
    #[serde(rename = "ContactName")]
    pub contact_name: Option<String>,
    /// Region of [`Self::country`]; [`Region::Other`] when unmapped.
    #[serde(rename = "Region")]
    pub region: Region,
    /// Customer country.
    #[serde(rename = "Country")]
    pub country: Option<String>,
    /// ISO3 of [`Self::country`].
    #[serde(rename = "CountryISO3")]
    pub country_iso3: Option<String>,
    /// Handling employee.
    #[serde(rename = "EmployeeID")]
    pub employee_id: Option<i64>,
    /// `"<FirstName> <LastName>"` of the employee.
    #[serde(rename = "EmployeeName")]
    pub employee_name: Option<String>,
    /// Product sold.
    #[serde(rename = "ProductID")]
    pub product_id: i64,
    /// Product display name.
    #[serde(rename = "ProductName")]
    pub product_name: Option<String>,
    /// Product category.
    #[serde(rename = "CategoryID")]
    pub category_id: Option<i64>,
    /// Category display name.
    #[serde(rename = "CategoryName")]
    pub category_name: Option<String>,
    /// Product supplier.
    #[serde(rename = "SupplierID")]
    pub supplier_id: Option<i64>,
    /// Supplier company name.
    #[serde(rename = "SupplierName")]
    pub supplier_name: Option<String>,
    /// Price per unit.
    #[serde(rename = "UnitPrice")]
    pub unit_price: Decimal,
    /// Units sold.
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    /// Fractional discount.
    #[serde(rename = "Discount")]
    pub discount: Decimal,
    /// `UnitPrice × Quantity × (1 − Discount)`.
    #[serde(rename = "Revenue")]
    pub revenue: Decimal,
}

/// A fact line with the RFM segment of its customer attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSalesLine {
    /// The underlying fact line.
    #[serde(flatten)]
    pub fact: SalesFactLine,
    /// `None` when the customer was not part of the scored population.
    #[serde(rename = "Segment")]
    pub segment: Option<Segment>,
}

/// Revenue of one line: `unit_price × quantity × (1 − discount)`.
///
/// Exact decimal arithmetic; out-of-range discounts are not clamped.
/// `None` when an intermediate result overflows.
pub fn line_revenue(unit_price: Decimal, quantity: i64, discount: Decimal) -> Option<Decimal> {
    unit_price
        .checked_mul(Decimal::from(quantity))?
        .checked_mul(Decimal::ONE.checked_sub(discount)?)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn revenue_formula() {
        assert_eq!(line_revenue(dec!(14.0), 12, dec!(0)), Some(dec!(168.0)));
        assert_eq!(line_revenue(dec!(18.6), 9, dec!(0.1)), Some(dec!(150.66)));
        // a discount above one yields negative revenue, kept as-is
        assert_eq!(line_revenue(dec!(10), 1, dec!(1.5)), Some(dec!(-5)));
    }

    #[test]
    fn revenue_overflow_is_none() {
        assert_eq!(line_revenue(Decimal::MAX, 2, dec!(0)), None);
        assert_eq!(line_revenue(dec!(1), 1, Decimal::MIN), None);
    }

    #[test]
    fn output_columns_extend_fact_columns() {
        assert_eq!(&OUTPUT_COLUMNS[..20], &FACT_COLUMNS[..]);
        insta::assert_debug_snapshot!(OUTPUT_COLUMNS[20], @r#""Segment""#);
    }
}
