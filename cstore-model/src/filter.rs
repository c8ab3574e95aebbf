//! Filter parameter structs, one per query pipeline.
//!
//! The presentation layer's page widgets map onto these explicit structures;
//! there is no open-ended parameter dictionary. Every filter is plain data:
//! applying one never mutates the snapshot it is applied to.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::Date;

const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Inclusive date range over the snapshot's µs-epoch timestamp columns.
///
/// `None` bounds leave that side open, matching the page behavior where a
/// missing widget value means "no constraint".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_micros: Option<i64>,
    pub end_micros: Option<i64>,
}

impl DateRange {
    pub const UNBOUNDED: DateRange = DateRange {
        start_micros: None,
        end_micros: None,
    };

    /// Inclusive calendar-day range: `start` at midnight through the last
    /// microsecond of `end`.
    pub fn days(start: Date, end: Date) -> DateRange {
        let start_micros = start.midnight().assume_utc().unix_timestamp() * 1_000_000;
        let end_micros =
            end.midnight().assume_utc().unix_timestamp() * 1_000_000 + (MICROS_PER_DAY - 1);
        DateRange {
            start_micros: Some(start_micros),
            end_micros: Some(end_micros),
        }
    }

    /// Whether a µs-epoch timestamp falls inside the range. Null timestamps
    /// are the caller's concern; this takes a concrete value.
    pub fn contains(&self, micros: i64) -> bool {
        if let Some(start) = self.start_micros {
            if micros < start {
                return false;
            }
        }
        if let Some(end) = self.end_micros {
            if micros > end {
                return false;
            }
        }
        true
    }

    /// A range is valid when its bounds are not inverted.
    pub fn is_valid(&self) -> bool {
        match (self.start_micros, self.end_micros) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }
}

/// Which stores a pipeline run covers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreSelection {
    /// Every store surviving the load-time allowlist.
    #[default]
    All,
    /// An explicit subset of store identifiers.
    Only(Vec<String>),
}

impl StoreSelection {
    pub fn includes(&self, store_id: &str) -> bool {
        match self {
            StoreSelection::All => true,
            StoreSelection::Only(ids) => ids.iter().any(|id| id == store_id),
        }
    }
}

/// Ranking metric for the beverage drop analysis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropMetric {
    #[default]
    Revenue,
    Quantity,
    Transactions,
}

impl fmt::Display for DropMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropMetric::Revenue => write!(f, "revenue"),
            DropMetric::Quantity => write!(f, "quantity"),
            DropMetric::Transactions => write!(f, "transactions"),
        }
    }
}

/// Parameters for the top-products pipeline (Q1).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TopProductsFilter {
    pub date_range: DateRange,
    pub stores: StoreSelection,
    /// Number of ranked products to return. The page asks for 5; fewer
    /// qualifying products are returned as-is, never padded.
    pub limit: usize,
}

impl Default for TopProductsFilter {
    fn default() -> Self {
        Self {
            date_range: DateRange::UNBOUNDED,
            stores: StoreSelection::All,
            limit: 5,
        }
    }
}

/// Parameters for the beverage brand ranking pipeline (Q2).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BeverageFilter {
    pub date_range: DateRange,
    pub stores: StoreSelection,
    /// Optional narrowing to specific beverage categories, as selected on the
    /// page; `None` keeps every category that classifies as a beverage.
    pub categories: Option<Vec<String>>,
    pub drop_metric: DropMetric,
}

/// Parameters for the payment comparison pipeline (Q3).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PaymentFilter {
    pub date_range: DateRange,
    pub stores: StoreSelection,
}

/// Parameters for the demographics pipeline (Q4).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DemographicsRequest {
    pub store_id: String,
    pub radius_miles: f64,
}

impl DemographicsRequest {
    pub fn new(store_id: impl Into<String>, radius_miles: f64) -> Self {
        Self {
            store_id: store_id.into(),
            radius_miles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn day_ranges_are_inclusive_on_both_ends() {
        let range = DateRange::days(date!(2024 - 01 - 01), date!(2024 - 01 - 07));
        let start = range.start_micros.unwrap();
        let end = range.end_micros.unwrap();
        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(start - 1));
        assert!(!range.contains(end + 1));
        assert_eq!(end - start, 7 * MICROS_PER_DAY - 1);
    }

    #[test]
    fn inverted_ranges_are_invalid() {
        let range = DateRange::days(date!(2024 - 02 - 01), date!(2024 - 01 - 01));
        assert!(!range.is_valid());
        assert!(DateRange::UNBOUNDED.is_valid());
    }

    #[test]
    fn store_selection_subset() {
        let only = StoreSelection::Only(vec!["101".into(), "102".into()]);
        assert!(only.includes("101"));
        assert!(!only.includes("103"));
        assert!(StoreSelection::All.includes("103"));
    }
}
