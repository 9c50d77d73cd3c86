//! Lenient date coercion for raw order cells.
//!
//! Source dates arrive as text in a handful of layouts. A cell that can't be
//! read as a date is *not* an error: it degrades to an absent date and the
//! caller records a data-quality warning.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

/// Layouts tried, in order, for naive date-times.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Result of coercing one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coerced {
    /// The cell parsed.
    Date(NaiveDateTime),
    /// The cell was null or blank, which is a legitimate "not set".
    Absent,
    /// The cell held something that isn't a date.
    Unparseable,
}

impl Coerced {
    /// The date, if one parsed.
    pub fn value(self) -> Option<NaiveDateTime> {
        match self {
            Coerced::Date(d) => Some(d),
            Coerced::Absent | Coerced::Unparseable => None,
        }
    }
}

/// Coerce a raw cell into a date-time.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS[.fff]`, the `T`-separated
/// variant, and RFC 3339 with an offset (normalised to UTC, offset dropped).
///
/// # Examples
///
/// ```rust
/// use sales_etl::dates::{Coerced, coerce};
/// use serde_json::json;
///
/// let d = coerce(&json!("1996-07-04")).value().unwrap();
/// assert_eq!(d.to_string(), "1996-07-04 00:00:00");
/// assert_eq!(coerce(&json!(null)), Coerced::Absent);
/// assert_eq!(coerce(&json!("soon")), Coerced::Unparseable);
/// ```
pub fn coerce(cell: &Value) -> Coerced {
    match cell {
        Value::Null => Coerced::Absent,
        Value::String(s) if s.trim().is_empty() => Coerced::Absent,
        Value::String(s) => parse_text(s.trim()).map_or(Coerced::Unparseable, Coerced::Date),
        _ => Coerced::Unparseable,
    }
}

fn parse_text(s: &str) -> Option<NaiveDateTime> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_time(NaiveTime::MIN));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc())
}
