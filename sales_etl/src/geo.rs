//! Country enrichment maps.
//!
//! Exhaustive static tables from the country names used by the source data to
//! a business [`Region`] and an ISO 3166-1 alpha-3 code. Lookups are exact
//! (case-sensitive, no trimming) so the enrichment stays auditable: a name
//! is either listed below or it is unmapped.
//!
//! Unmapped names resolve to [`Region::Other`] and no ISO3 code. That is not an
//! error; callers that care count them as data-quality warnings.

use std::{collections::HashMap, fmt, str::FromStr};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Business region of a customer country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    /// USA, Canada, Mexico.
    #[serde(rename = "North America")]
    NorthAmerica,
    /// Brazil, Argentina, Venezuela.
    #[serde(rename = "South America")]
    SouthAmerica,
    /// European markets.
    Europe,
    /// Anything not in the table.
    Other,
}

impl Region {
    /// Every region, in display order.
    pub const ALL: [Region; 4] = [
        Region::NorthAmerica,
        Region::SouthAmerica,
        Region::Europe,
        Region::Other,
    ];

    /// Display label, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Region::NorthAmerica => "North America",
            Region::SouthAmerica => "South America",
            Region::Europe => "Europe",
            Region::Other => "Other",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A region label that isn't one of [`Region::ALL`].
#[derive(Debug, Error)]
#[error("unknown region {0:?} (expected one of: North America, South America, Europe, Other)")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRegion(s.to_string()))
    }
}

/// One row of the country table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountryInfo {
    /// Country name exactly as it appears in the source data.
    pub name: &'static str,
    /// Business region.
    pub region: Region,
    /// ISO 3166-1 alpha-3 code.
    pub iso3: &'static str,
}

const fn c(name: &'static str, region: Region, iso3: &'static str) -> CountryInfo {
    CountryInfo { name, region, iso3 }
}

/// The full country table.
pub static COUNTRIES: [CountryInfo; 21] = [
    c("USA", Region::NorthAmerica, "USA"),
    c("Canada", Region::NorthAmerica, "CAN"),
    c("Mexico", Region::NorthAmerica, "MEX"),
    c("Brazil", Region::SouthAmerica, "BRA"),
    c("Argentina", Region::SouthAmerica, "ARG"),
    c("Venezuela", Region::SouthAmerica, "VEN"),
    c("UK", Region::Europe, "GBR"),
    c("Germany", Region::Europe, "DEU"),
    c("France", Region::Europe, "FRA"),
    c("Spain", Region::Europe, "ESP"),
    c("Italy", Region::Europe, "ITA"),
    c("Sweden", Region::Europe, "SWE"),
    c("Switzerland", Region::Europe, "CHE"),
    c("Belgium", Region::Europe, "BEL"),
    c("Austria", Region::Europe, "AUT"),
    c("Portugal", Region::Europe, "PRT"),
    c("Poland", Region::Europe, "POL"),
    c("Ireland", Region::Europe, "IRL"),
    c("Finland", Region::Europe, "FIN"),
    c("Norway", Region::Europe, "NOR"),
    c("Denmark", Region::Europe, "DNK"),
];

static BY_NAME: Lazy<HashMap<&'static str, &'static CountryInfo>> =
    Lazy::new(|| COUNTRIES.iter().map(|c| (c.name, c)).collect());

/// Table row for `country`, if listed.
pub fn lookup(country: &str) -> Option<&'static CountryInfo> {
    BY_NAME.get(country).copied()
}

/// Region for `country`; [`Region::Other`] when unlisted.
pub fn region_for(country: &str) -> Region {
    lookup(country).map_or(Region::Other, |c| c.region)
}

/// ISO3 code for `country`; `None` when unlisted.
pub fn iso3_for(country: &str) -> Option<&'static str> {
    lookup(country).map(|c| c.iso3)
}
