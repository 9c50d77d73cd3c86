//! RFM segmentation.
//!
//! Scores every customer on Recency (days since their last order, measured
//! from the day after the latest order in the data), Frequency (distinct
//! orders) and Monetary value (total revenue), bins each metric into
//! population quartiles, and maps the resulting [`RfmCode`] to a
//! [`Segment`] through [`segment::SEGMENT_RULES`].
//!
//! Scores are relative: the same customer can land in a different segment
//! when scored against a different population.

pub mod quartile;
pub mod segment;

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
};

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use sales_extract::TableKind;
use serde::Serialize;
use tracing::{debug, info, warn};

pub use segment::{RfmCode, Segment, SegmentRule, classify};

use crate::error::EtlError;
use crate::models::fact::{EnrichedSalesLine, SalesFactLine};

/// The three scored metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    /// Days since the customer's last order.
    Recency,
    /// Distinct orders placed.
    Frequency,
    /// Total revenue.
    MonetaryValue,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Metric::Recency => "Recency",
            Metric::Frequency => "Frequency",
            Metric::MonetaryValue => "MonetaryValue",
        })
    }
}

/// The fields RFM scoring reads from a sales line.
pub trait RfmRecord {
    /// Buying customer, if known.
    fn customer_id(&self) -> Option<&str>;
    /// Order the line belongs to.
    fn order_id(&self) -> i64;
    /// Order date, if known.
    fn order_date(&self) -> Option<NaiveDateTime>;
    /// Line revenue.
    fn revenue(&self) -> Decimal;
}

impl RfmRecord for SalesFactLine {
    fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }
    fn order_id(&self) -> i64 {
        self.order_id
    }
    fn order_date(&self) -> Option<NaiveDateTime> {
        self.order_date
    }
    fn revenue(&self) -> Decimal {
        self.revenue
    }
}

impl RfmRecord for EnrichedSalesLine {
    fn customer_id(&self) -> Option<&str> {
        self.fact.customer_id()
    }
    fn order_id(&self) -> i64 {
        self.fact.order_id
    }
    fn order_date(&self) -> Option<NaiveDateTime> {
        self.fact.order_date
    }
    fn revenue(&self) -> Decimal {
        self.fact.revenue
    }
}

/// One scored customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerRfm {
    /// Customer key.
    pub customer_id: String,
    /// Whole days between the customer's last order and the snapshot date.
    pub recency: i64,
    /// Distinct orders.
    pub frequency: usize,
    /// Sum of line revenue.
    pub monetary_value: Decimal,
    /// Quartile scores.
    pub code: RfmCode,
    /// Segment assigned from [`Self::code`].
    pub segment: Segment,
}

/// Customer key and segment, the shape merged back onto sales lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerSegment {
    /// Customer key.
    pub customer_id: String,
    /// Assigned segment.
    pub segment: Segment,
}

/// A full scoring run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RfmAnalysis {
    /// Day after the latest order date in the input.
    pub snapshot_date: NaiveDateTime,
    /// Scored customers, ascending by customer key.
    pub customers: Vec<CustomerRfm>,
}

impl RfmAnalysis {
    /// Project to the `(customer, segment)` pairs.
    pub fn segments(&self) -> Vec<CustomerSegment> {
        self.customers
            .iter()
            .map(|c| CustomerSegment {
                customer_id: c.customer_id.clone(),
                segment: c.segment,
            })
            .collect()
    }

    /// Customers per segment, in [`Segment::ALL`] order, zeros omitted.
    pub fn segment_counts(&self) -> Vec<(Segment, usize)> {
        Segment::ALL
            .into_iter()
            .map(|s| (s, self.customers.iter().filter(|c| c.segment == s).count()))
            .filter(|&(_, n)| n > 0)
            .collect()
    }
}

/// The day after the latest known order date, or `None` if no line has one.
pub fn snapshot_date<R: RfmRecord>(lines: &[R]) -> Option<NaiveDateTime> {
    lines
        .iter()
        .filter_map(|line| line.order_date())
        .max()
        .map(|latest| latest + Duration::days(1))
}

#[derive(Default)]
struct Aggregate {
    last_order: Option<NaiveDateTime>,
    orders: HashSet<i64>,
    monetary: Decimal,
}

/// Score every customer in `lines`.
///
/// Lines without a customer are ignored. Customers none of whose lines carry
/// an order date are left out of the population (and so get no segment).
///
/// # Errors
///
/// * [`EtlError::EmptyPopulation`] when nobody is left to score.
/// * [`EtlError::DegeneratePopulation`] / [`EtlError::DuplicateQuartileEdges`]
///   when a metric can't be split into four equal-population bins.
/// * [`EtlError::Overflow`] when a customer's total revenue leaves the
///   decimal range; `row` is the position in `lines`.
pub fn score_customers<R: RfmRecord>(lines: &[R]) -> Result<RfmAnalysis, EtlError> {
    let snapshot = snapshot_date(lines).ok_or(EtlError::EmptyPopulation)?;

    let mut by_customer: BTreeMap<&str, Aggregate> = BTreeMap::new();
    for (row, line) in lines.iter().enumerate() {
        let Some(id) = line.customer_id() else { continue };
        let agg = by_customer.entry(id).or_default();
        agg.last_order = agg.last_order.max(line.order_date());
        agg.orders.insert(line.order_id());
        agg.monetary = agg.monetary.checked_add(line.revenue()).ok_or(EtlError::Overflow {
            table: TableKind::OrderDetails,
            row,
            field: "MonetaryValue",
        })?;
    }

    let mut ids = Vec::with_capacity(by_customer.len());
    let mut recency = Vec::with_capacity(by_customer.len());
    let mut frequency = Vec::with_capacity(by_customer.len());
    let mut monetary = Vec::with_capacity(by_customer.len());
    let mut undated = 0usize;
    for (id, agg) in &by_customer {
        let Some(last) = agg.last_order else {
            undated += 1;
            continue;
        };
        ids.push(*id);
        recency.push((snapshot - last).num_days());
        frequency.push(agg.orders.len());
        monetary.push(agg.monetary);
    }
    if undated > 0 {
        warn!(customers = undated, "customers without a dated order left out of RFM");
    }
    if ids.is_empty() {
        return Err(EtlError::EmptyPopulation);
    }

    let as_dec = |v: &[i64]| v.iter().copied().map(Decimal::from).collect::<Vec<_>>();
    let freq_dec: Vec<Decimal> = frequency.iter().map(|&f| Decimal::from(f)).collect();

    let r = quartile::quartile_scores(&as_dec(&recency), Metric::Recency)?;
    let f = quartile::quartile_scores(&freq_dec, Metric::Frequency)?;
    let m = quartile::quartile_scores(&monetary, Metric::MonetaryValue)?;

    let customers: Vec<CustomerRfm> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let code = RfmCode {
                r: r[i],
                f: f[i],
                m: m[i],
            };
            let segment = classify(&code);
            debug!(customer = id, %code, %segment, "scored");
            CustomerRfm {
                customer_id: id.to_string(),
                recency: recency[i],
                frequency: frequency[i],
                monetary_value: monetary[i],
                code,
                segment,
            }
        })
        .collect();

    info!(customers = customers.len(), snapshot = %snapshot, "RFM scoring complete");
    Ok(RfmAnalysis {
        snapshot_date: snapshot,
        customers,
    })
}

/// Score `lines` and keep only each customer's segment.
pub fn segment_customers<R: RfmRecord>(lines: &[R]) -> Result<Vec<CustomerSegment>, EtlError> {
    Ok(score_customers(lines)?.segments())
}
