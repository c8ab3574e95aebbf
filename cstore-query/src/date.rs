//! Epoch-microsecond to ISO-week conversion.

use cstore_result::{Error, Result};
use time::OffsetDateTime;

/// ISO week key: the ISO year and week number a timestamp falls in.
///
/// The ISO year can differ from the calendar year around New Year, which is
/// exactly why weekly rollups key on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoWeek {
    pub year: i32,
    pub week: u8,
}

impl IsoWeek {
    /// Derive the ISO week for an epoch-µs timestamp.
    pub fn from_micros(micros: i64) -> Result<IsoWeek> {
        let dt = OffsetDateTime::from_unix_timestamp_nanos(micros as i128 * 1_000)
            .map_err(|e| Error::InvalidArgumentError(format!("timestamp out of range: {e}")))?;
        let (year, week, _) = dt.date().to_iso_week_date();
        Ok(IsoWeek { year, week })
    }

    /// Label form used in result tables, e.g. `2024-W05`.
    pub fn label(&self) -> String {
        format!("{}-W{:02}", self.year, self.week)
    }
}
