//! Row-scope predicate shared by the pipelines.

use cstore_model::{DateRange, StoreSelection};
use cstore_result::{Error, Result};

/// The date/store scope a pipeline run covers.
///
/// A row with a null timestamp only passes a fully unbounded range: a bounded
/// filter cannot place it, so it is out of scope rather than silently kept.
pub struct Scope<'a> {
    date_range: &'a DateRange,
    stores: &'a StoreSelection,
}

impl<'a> Scope<'a> {
    pub fn new(date_range: &'a DateRange, stores: &'a StoreSelection) -> Result<Scope<'a>> {
        if !date_range.is_valid() {
            return Err(Error::InvalidArgumentError(
                "date range start is after its end".into(),
            ));
        }
        Ok(Scope { date_range, stores })
    }

    pub fn keep(&self, store_id: Option<&str>, micros: Option<i64>) -> bool {
        let store_ok = store_id.is_some_and(|id| self.stores.includes(id));
        let date_ok = match micros {
            Some(ts) => self.date_range.contains(ts),
            None => {
                self.date_range.start_micros.is_none() && self.date_range.end_micros.is_none()
            }
        };
        store_ok && date_ok
    }
}
