//! Segment taxonomy and the ordered rule table that assigns it.

use std::{fmt, ops::RangeInclusive};

use serde::{Deserialize, Serialize};

/// Business segment of a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    /// Long gone and rarely bought.
    Hibernating,
    /// Used to buy often, hasn't lately.
    #[serde(rename = "At-Risk")]
    AtRisk,
    /// Middling recency, low frequency.
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
    /// Middling recency, solid frequency.
    #[serde(rename = "Loyal Customers")]
    LoyalCustomers,
    /// Recent and most frequent.
    Champions,
    /// Very recent but not yet frequent.
    #[serde(rename = "Potential Loyalists")]
    PotentialLoyalists,
    /// No rule matched.
    Other,
}

impl Segment {
    /// Every segment, rule order first, fallback last.
    pub const ALL: [Segment; 7] = [
        Segment::Hibernating,
        Segment::AtRisk,
        Segment::NeedsAttention,
        Segment::LoyalCustomers,
        Segment::Champions,
        Segment::PotentialLoyalists,
        Segment::Other,
    ];

    /// Display label, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Hibernating => "Hibernating",
            Segment::AtRisk => "At-Risk",
            Segment::NeedsAttention => "Needs Attention",
            Segment::LoyalCustomers => "Loyal Customers",
            Segment::Champions => "Champions",
            Segment::PotentialLoyalists => "Potential Loyalists",
            Segment::Other => "Other",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three quartile scores of one customer, each in `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RfmCode {
    /// Recency score; 4 is the most recent quartile.
    pub r: u8,
    /// Frequency score; 4 is the most frequent quartile.
    pub f: u8,
    /// Monetary score; 4 is the highest-spending quartile.
    pub m: u8,
}

impl fmt::Display for RfmCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.r, self.f, self.m)
    }
}

/// One row of the rule table: both ranges must contain the code's digit.
///
/// Only recency and frequency take part; the monetary score is carried for
/// reporting and never consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRule {
    /// Accepted recency scores.
    pub recency: RangeInclusive<u8>,
    /// Accepted frequency scores.
    pub frequency: RangeInclusive<u8>,
    /// Segment assigned on match.
    pub segment: Segment,
}

impl SegmentRule {
    /// Whether this rule accepts `code`.
    pub fn matches(&self, code: &RfmCode) -> bool {
        self.recency.contains(&code.r) && self.frequency.contains(&code.f)
    }
}

/// Segment rules, evaluated in order; the first match wins.
pub static SEGMENT_RULES: [SegmentRule; 6] = [
    SegmentRule {
        recency: 1..=2,
        frequency: 1..=2,
        segment: Segment::Hibernating,
    },
    SegmentRule {
        recency: 1..=2,
        frequency: 3..=4,
        segment: Segment::AtRisk,
    },
    SegmentRule {
        recency: 3..=3,
        frequency: 1..=2,
        segment: Segment::NeedsAttention,
    },
    SegmentRule {
        recency: 3..=3,
        frequency: 3..=3,
        segment: Segment::LoyalCustomers,
    },
    SegmentRule {
        recency: 3..=4,
        frequency: 4..=4,
        segment: Segment::Champions,
    },
    SegmentRule {
        recency: 4..=4,
        frequency: 1..=3,
        segment: Segment::PotentialLoyalists,
    },
];

/// Segment for `code`: the first matching rule, else [`Segment::Other`].
pub fn classify(code: &RfmCode) -> Segment {
    SEGMENT_RULES
        .iter()
        .find(|rule| rule.matches(code))
        .map_or(Segment::Other, |rule| rule.segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(r: u8, f: u8) -> Segment {
        classify(&RfmCode { r, f, m: 1 })
    }

    #[test]
    fn rule_table() {
        assert_eq!(seg(1, 1), Segment::Hibernating);
        assert_eq!(seg(2, 2), Segment::Hibernating);
        assert_eq!(seg(1, 3), Segment::AtRisk);
        assert_eq!(seg(2, 4), Segment::AtRisk);
        assert_eq!(seg(3, 1), Segment::NeedsAttention);
        assert_eq!(seg(3, 3), Segment::LoyalCustomers);
        assert_eq!(seg(3, 4), Segment::Champions);
        assert_eq!(seg(4, 4), Segment::Champions);
        assert_eq!(seg(4, 1), Segment::PotentialLoyalists);
        assert_eq!(seg(4, 3), Segment::PotentialLoyalists);
    }

    #[test]
    fn every_valid_code_hits_a_rule() {
        for r in 1..=4 {
            for f in 1..=4 {
                assert_ne!(seg(r, f), Segment::Other, "{r}{f} fell through");
            }
        }
    }

    #[test]
    fn out_of_range_code_falls_back_to_other() {
        assert_eq!(seg(0, 2), Segment::Other);
        assert_eq!(seg(5, 5), Segment::Other);
    }

    #[test]
    fn monetary_is_ignored() {
        let low = classify(&RfmCode { r: 3, f: 3, m: 1 });
        let high = classify(&RfmCode { r: 3, f: 3, m: 4 });
        assert_eq!(low, high);
    }

    #[test]
    fn labels_round_trip_through_serde() {
        for s in Segment::ALL {
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, format!("\"{s}\""));
        }
        assert_eq!(RfmCode { r: 3, f: 4, m: 1 }.to_string(), "341");
    }
}
