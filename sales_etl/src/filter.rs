//! Filtering helpers for consumers of the enriched table.
//!
//! A [`FilterConfig`] narrows the table by order date, region, country and
//! category. `None` for a dimension means "no restriction"; `Some` of an
//! empty set matches nothing.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geo::Region;
use crate::models::fact::EnrichedSalesLine;

/// Label of the quarter option spanning all data.
pub const FULL_HISTORY: &str = "Full History";

/// Selection applied to the enriched table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Inclusive order-date bounds (compared on the calendar date).
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Accepted regions.
    pub regions: Option<BTreeSet<Region>>,
    /// Accepted countries.
    pub countries: Option<BTreeSet<String>>,
    /// Accepted category names.
    pub categories: Option<BTreeSet<String>>,
}

impl FilterConfig {
    /// A filter that selects everything present in `lines`, spelled out.
    ///
    /// Lines with a null in a restricted dimension are not matched, so this
    /// is the explicit "all known values" selection rather than
    /// [`FilterConfig::default`].
    pub fn defaults_for(lines: &[EnrichedSalesLine]) -> Self {
        let dates: Vec<NaiveDate> = lines
            .iter()
            .filter_map(|l| l.fact.order_date.map(|d| d.date()))
            .collect();
        let date_range = dates.iter().min().copied().zip(dates.iter().max().copied());
        Self {
            date_range,
            regions: Some(lines.iter().map(|l| l.fact.region).collect()),
            countries: Some(lines.iter().filter_map(|l| l.fact.country.clone()).collect()),
            categories: Some(
                lines
                    .iter()
                    .filter_map(|l| l.fact.category_name.clone())
                    .collect(),
            ),
        }
    }

    /// Whether `line` passes every restriction.
    pub fn matches(&self, line: &EnrichedSalesLine) -> bool {
        let fact = &line.fact;
        if let Some((from, to)) = self.date_range {
            match fact.order_date.map(|d| d.date()) {
                Some(d) if from <= d && d <= to => {}
                _ => return false,
            }
        }
        let in_set = |set: &Option<BTreeSet<String>>, value: &Option<String>| match set {
            None => true,
            Some(set) => value.as_ref().is_some_and(|v| set.contains(v)),
        };
        self.regions.as_ref().is_none_or(|r| r.contains(&fact.region))
            && in_set(&self.countries, &fact.country)
            && in_set(&self.categories, &fact.category_name)
    }

    /// The lines of `lines` that match, in order.
    pub fn apply(&self, lines: &[EnrichedSalesLine]) -> Vec<EnrichedSalesLine> {
        lines.iter().filter(|l| self.matches(l)).cloned().collect()
    }
}

/// Free-function form of [`FilterConfig::apply`].
pub fn apply_filter(lines: &[EnrichedSalesLine], filter: &FilterConfig) -> Vec<EnrichedSalesLine> {
    filter.apply(lines)
}

/// Date-range choices: [`FULL_HISTORY`] first, then every calendar quarter
/// with at least one order, oldest first, labelled like `1997Q3`.
///
/// Empty when no line has an order date.
pub fn quarter_options(lines: &[EnrichedSalesLine]) -> IndexMap<String, (NaiveDate, NaiveDate)> {
    let dates: Vec<NaiveDate> = lines
        .iter()
        .filter_map(|l| l.fact.order_date.map(|d| d.date()))
        .collect();
    let mut options = IndexMap::new();
    let (Some(&first), Some(&last)) = (dates.iter().min(), dates.iter().max()) else {
        return options;
    };
    options.insert(FULL_HISTORY.to_string(), (first, last));

    let quarters: BTreeSet<(i32, u32)> = dates
        .iter()
        .map(|d| (d.year(), d.month0() / 3 + 1))
        .collect();
    for (year, q) in quarters {
        if let Some(range) = quarter_bounds(year, q) {
            options.insert(format!("{year}Q{q}"), range);
        }
    }
    options
}

/// First and last day of quarter `q` (1..=4) of `year`.
pub fn quarter_bounds(year: i32, q: u32) -> Option<(NaiveDate, NaiveDate)> {
    if !(1..=4).contains(&q) {
        return None;
    }
    let start = NaiveDate::from_ymd_opt(year, 3 * (q - 1) + 1, 1)?;
    let next = if q == 4 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, 3 * q + 1, 1)?
    };
    Some((start, next - Duration::days(1)))
}

/// Countries present in `lines` whose region is in `regions`, sorted.
pub fn available_countries(lines: &[EnrichedSalesLine], regions: &BTreeSet<Region>) -> Vec<String> {
    lines
        .iter()
        .filter(|l| regions.contains(&l.fact.region))
        .filter_map(|l| l.fact.country.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use rust_decimal::Decimal;

    use super::*;
    use crate::geo;
    use crate::models::fact::SalesFactLine;

    fn line(date: Option<&str>, country: Option<&str>, category: &str) -> EnrichedSalesLine {
        let order_date = date.map(|d| {
            NaiveDateTime::parse_from_str(&format!("{d} 00:00:00"), "%Y-%m-%d %H:%M:%S").unwrap()
        });
        EnrichedSalesLine {
            fact: SalesFactLine {
                order_id: 1,
                order_date,
                shipped_date: None,
                customer_id: Some("C".into()),
                contact_name: None,
                region: country.map_or(Region::Other, geo::region_for),
                country: country.map(String::from),
                country_iso3: country.and_then(geo::iso3_for).map(String::from),
                employee_id: None,
                employee_name: None,
                product_id: 1,
                product_name: None,
                category_id: None,
                category_name: Some(category.into()),
                supplier_id: None,
                supplier_name: None,
                unit_price: Decimal::ONE,
                quantity: 1,
                discount: Decimal::ZERO,
                revenue: Decimal::ONE,
            },
            segment: None,
        }
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample() -> Vec<EnrichedSalesLine> {
        vec![
            line(Some("1996-07-04"), Some("Germany"), "Dairy Products"),
            line(Some("1996-11-20"), Some("Mexico"), "Beverages"),
            line(Some("1997-02-01"), Some("Brazil"), "Dairy Products"),
            line(None, Some("Atlantis"), "Beverages"),
        ]
    }

    #[test]
    fn quarters_start_with_full_history() {
        let opts = quarter_options(&sample());
        let labels: Vec<&str> = opts.keys().map(String::as_str).collect();
        assert_eq!(labels, vec![FULL_HISTORY, "1996Q3", "1996Q4", "1997Q1"]);
        assert_eq!(opts[FULL_HISTORY], (day("1996-07-04"), day("1997-02-01")));
        assert_eq!(opts["1996Q4"], (day("1996-10-01"), day("1996-12-31")));
        assert!(quarter_options(&[]).is_empty());
    }

    #[test]
    fn quarter_bounds_handle_year_end_and_leap_years() {
        assert_eq!(quarter_bounds(1996, 1), Some((day("1996-01-01"), day("1996-03-31"))));
        assert_eq!(quarter_bounds(1997, 4), Some((day("1997-10-01"), day("1997-12-31"))));
        assert_eq!(quarter_bounds(1997, 5), None);
    }

    #[test]
    fn unrestricted_filter_matches_everything() {
        let lines = sample();
        assert_eq!(FilterConfig::default().apply(&lines).len(), lines.len());
    }

    #[test]
    fn defaults_select_all_known_values() {
        let lines = sample();
        let cfg = FilterConfig::defaults_for(&lines);
        assert_eq!(cfg.date_range, Some((day("1996-07-04"), day("1997-02-01"))));
        assert_eq!(cfg.countries.as_ref().unwrap().len(), 4);
        // the undated line falls outside an explicit date range
        assert_eq!(cfg.apply(&lines).len(), 3);
    }

    #[test]
    fn restrictions_combine() {
        let lines = sample();
        let cfg = FilterConfig {
            regions: Some([Region::Europe, Region::NorthAmerica].into()),
            categories: Some(["Dairy Products".to_string()].into()),
            ..Default::default()
        };
        let hits = apply_filter(&lines, &cfg);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].fact.country.as_deref(), Some("Germany"));

        let none = FilterConfig {
            countries: Some(BTreeSet::new()),
            ..Default::default()
        };
        assert!(none.apply(&lines).is_empty());
    }

    #[test]
    fn countries_follow_selected_regions() {
        let lines = sample();
        let got = available_countries(&lines, &[Region::NorthAmerica, Region::SouthAmerica].into());
        assert_eq!(got, vec!["Brazil", "Mexico"]);
        let other = available_countries(&lines, &[Region::Other].into());
        assert_eq!(other, vec!["Atlantis"]);
    }
}
