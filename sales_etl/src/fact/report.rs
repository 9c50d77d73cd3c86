use std::{collections::BTreeSet, fmt};

use serde::Serialize;

/// Non-fatal problems met while building the fact table.
///
/// None of these stop the run; the affected values come out as nulls (or,
/// for negative revenue, as computed) and the counts end up here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataQualityReport {
    /// Orders whose `OrderDate` held something that isn't a date.
    pub unparseable_order_dates: usize,
    /// Orders whose `ShippedDate` held something that isn't a date.
    pub unparseable_shipped_dates: usize,
    /// Lines with revenue below zero (discount above one).
    pub negative_revenue_lines: usize,
    /// Detail lines naming a product that doesn't exist.
    pub unmatched_products: usize,
    /// Lines whose product names a category that doesn't exist.
    pub unmatched_categories: usize,
    /// Lines whose product names a supplier that doesn't exist.
    pub unmatched_suppliers: usize,
    /// Detail lines naming an order that doesn't exist.
    pub unmatched_orders: usize,
    /// Lines whose order names a customer that doesn't exist.
    pub unmatched_customers: usize,
    /// Lines whose order names an employee that doesn't exist.
    pub unmatched_employees: usize,
    /// Customer countries absent from the enrichment maps.
    pub unmapped_countries: BTreeSet<String>,
}

impl DataQualityReport {
    /// True when nothing was recorded.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    fn counters(&self) -> [(&'static str, usize); 9] {
        [
            ("unparseable OrderDate", self.unparseable_order_dates),
            ("unparseable ShippedDate", self.unparseable_shipped_dates),
            ("negative Revenue", self.negative_revenue_lines),
            ("unmatched ProductID", self.unmatched_products),
            ("unmatched CategoryID", self.unmatched_categories),
            ("unmatched SupplierID", self.unmatched_suppliers),
            ("unmatched OrderID", self.unmatched_orders),
            ("unmatched CustomerID", self.unmatched_customers),
            ("unmatched EmployeeID", self.unmatched_employees),
        ]
    }
}

impl fmt::Display for DataQualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return writeln!(f, "Data quality: clean");
        }
        writeln!(f, "Data quality")?;
        writeln!(f, "------------")?;
        for (label, n) in self.counters() {
            if n > 0 {
                writeln!(f, "! {label}: {n}")?;
            }
        }
        if !self.unmapped_countries.is_empty() {
            let names: Vec<&str> = self.unmapped_countries.iter().map(String::as_str).collect();
            writeln!(f, "! unmapped Country: {}", names.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_clean() {
        let r = DataQualityReport::default();
        assert!(r.is_clean());
        assert_eq!(r.to_string(), "Data quality: clean\n");
    }

    #[test]
    fn display_lists_only_nonzero_counters() {
        let r = DataQualityReport {
            unmatched_products: 2,
            unmapped_countries: ["Atlantis".to_string(), "Narnia".to_string()].into(),
            ..Default::default()
        };
        assert!(!r.is_clean());
        insta::assert_snapshot!(r.to_string(), @r"
        Data quality
        ------------
        ! unmatched ProductID: 2
        ! unmapped Country: Atlantis, Narnia
        ");
    }

    #[test]
    fn serializes_for_machine_consumers() {
        let r = DataQualityReport {
            unparseable_order_dates: 1,
            unmapped_countries: ["Atlantis".to_string()].into(),
            ..Default::default()
        };
        insta::assert_json_snapshot!(r, @r#"
        {
          "unparseable_order_dates": 1,
          "unparseable_shipped_dates": 0,
          "negative_revenue_lines": 0,
          "unmatched_products": 0,
          "unmatched_categories": 0,
          "unmatched_suppliers": 0,
          "unmatched_orders": 0,
          "unmatched_customers": 0,
          "unmatched_employees": 0,
          "unmapped_countries": [
            "Atlantis"
          ]
        }
        "#);
    }
}
