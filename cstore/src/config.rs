//! Engine configuration.
//!
//! The configuration surface the core recognizes: data directory, store
//! allowlist, Census API key, cache TTL, default date range, and the state
//! used for the demographics comparison. `from_env` reads the `CSTORE_*`
//! environment (the Census key from the conventional `CENSUS_API_KEY`), so a
//! containerized host can configure everything without code.

use std::path::PathBuf;
use std::time::Duration;

use cstore_model::DateRange;
use cstore_result::{Error, Result};
use time::{Date, Month};

pub const ENV_DATA_DIR: &str = "CSTORE_DATA_DIR";
pub const ENV_STORE_CITIES: &str = "CSTORE_STORE_CITIES";
pub const ENV_CENSUS_API_KEY: &str = "CENSUS_API_KEY";
pub const ENV_CACHE_TTL_SECS: &str = "CSTORE_CACHE_TTL_SECS";
pub const ENV_DEFAULT_START_DATE: &str = "CSTORE_DEFAULT_START_DATE";
pub const ENV_DEFAULT_END_DATE: &str = "CSTORE_DEFAULT_END_DATE";
pub const ENV_STATE_FIPS: &str = "CSTORE_STATE_FIPS";

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);
/// Idaho, where the store chain operates.
const DEFAULT_STATE_FIPS: &str = "16";

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    /// Case-insensitive city allowlist; empty keeps every store.
    pub store_allowlist: Vec<String>,
    /// Absent key leaves the demographics pipeline unconfigured; every other
    /// pipeline works without it.
    pub census_api_key: Option<String>,
    pub cache_ttl: Duration,
    /// Range the presentation layer seeds its date widgets from.
    pub default_date_range: DateRange,
    pub census_state_fips: String,
}

impl EngineConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            store_allowlist: cstore_load::DEFAULT_CITIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            census_api_key: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            default_date_range: DateRange::UNBOUNDED,
            census_state_fips: DEFAULT_STATE_FIPS.into(),
        }
    }

    /// Build the configuration from the environment. Only the data directory
    /// is required.
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var(ENV_DATA_DIR)
            .map_err(|_| Error::Config(format!("{ENV_DATA_DIR} is not set")))?;
        let mut config = EngineConfig::new(data_dir);

        if let Ok(cities) = std::env::var(ENV_STORE_CITIES) {
            config.store_allowlist = cities
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }
        if let Ok(key) = std::env::var(ENV_CENSUS_API_KEY) {
            if !key.trim().is_empty() {
                config.census_api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(ttl) = std::env::var(ENV_CACHE_TTL_SECS) {
            let secs: u64 = ttl.parse().map_err(|_| {
                Error::Config(format!("{ENV_CACHE_TTL_SECS} must be an integer, got '{ttl}'"))
            })?;
            config.cache_ttl = Duration::from_secs(secs);
        }
        let start = env_date(ENV_DEFAULT_START_DATE)?;
        let end = env_date(ENV_DEFAULT_END_DATE)?;
        config.default_date_range = match (start, end) {
            (Some(start), Some(end)) => DateRange::days(start, end),
            (Some(start), None) => DateRange {
                start_micros: DateRange::days(start, start).start_micros,
                end_micros: None,
            },
            (None, Some(end)) => DateRange {
                start_micros: None,
                end_micros: DateRange::days(end, end).end_micros,
            },
            (None, None) => DateRange::UNBOUNDED,
        };
        if let Ok(fips) = std::env::var(ENV_STATE_FIPS) {
            config.census_state_fips = fips.trim().to_string();
        }
        Ok(config)
    }
}

/// Parse a `YYYY-MM-DD` date from the environment.
fn env_date(var: &str) -> Result<Option<Date>> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    parse_date(raw)
        .map(Some)
        .ok_or_else(|| Error::Config(format!("{var} must be YYYY-MM-DD, got '{raw}'")))
}

fn parse_date(raw: &str) -> Option<Date> {
    let mut parts = raw.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}
