//! The engine facade: cached load → validate → query.

use std::sync::Arc;

use cstore_cache::{CacheKey, SnapshotCache};
use cstore_census::{
    centroids_from_stores, resolve_radius, CensusClient, CensusConfig, CensusTransport,
    DemographicsReport, GeographyProfile, DEFAULT_VARIABLES,
};
use cstore_load::{LoadOptions, Loader, Snapshot};
use cstore_model::batch::{f64_at, f64_col, str_at, str_col};
use cstore_model::schema::col;
use cstore_model::{BeverageFilter, DemographicsRequest, PaymentFilter, TopProductsFilter};
use cstore_query::{
    beverage_brands, payment_comparison, top_products, BrandRankingReport,
    PaymentComparisonReport, TopProductsReport,
};
use cstore_result::{Error, Result};
use cstore_validate::ValidationReport;

use crate::config::EngineConfig;

/// How a demographics request ended.
///
/// The two degraded endings are ordinary outcomes, not raised errors: the
/// presentation layer renders them as empty/unavailable states.
#[derive(Debug)]
pub enum DemographicsOutcome {
    Report(DemographicsReport),
    /// No census geography intersected the requested radius.
    NoGeography { reason: String },
    /// The Census API stayed unreachable through the retry budget.
    Unavailable { reason: String },
}

/// The in-process entry point the presentation layer drives.
///
/// One engine per process; every session shares its snapshot cache, so
/// concurrent first requests for the same data collapse into one load.
pub struct Engine {
    config: EngineConfig,
    cache: SnapshotCache,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Engine {
        let cache = SnapshotCache::new(config.cache_ttl);
        Engine { config, cache }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The loaded snapshot for this engine's configuration, via the cache.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        let key = CacheKey::new(&self.config.data_dir, &self.config.store_allowlist);
        self.cache.get_or_load(&key, || {
            Loader::new(
                LoadOptions::new(&self.config.data_dir)
                    .with_allowlist(self.config.store_allowlist.clone()),
            )
            .load()
        })
    }

    /// Validate the current snapshot. Quality findings come back in the
    /// report; only structural problems raise.
    pub fn validation_report(&self) -> Result<ValidationReport> {
        cstore_validate::validate(&*self.snapshot()?)
    }

    /// Drop cached snapshots, forcing a reload on the next request.
    pub fn refresh(&self) {
        self.cache.invalidate_all();
    }

    pub fn top_products(&self, filter: &TopProductsFilter) -> Result<TopProductsReport> {
        top_products(&*self.snapshot()?, filter)
    }

    pub fn beverage_brands(&self, filter: &BeverageFilter) -> Result<BrandRankingReport> {
        beverage_brands(&*self.snapshot()?, filter)
    }

    pub fn payment_comparison(&self, filter: &PaymentFilter) -> Result<PaymentComparisonReport> {
        payment_comparison(&*self.snapshot()?, filter)
    }

    /// Run the demographics pipeline against the live Census API.
    pub fn demographics(&self, request: &DemographicsRequest) -> Result<DemographicsOutcome> {
        let config = self.census_config()?;
        let client = CensusClient::new(config)?;
        self.demographics_with_client(request, &client)
    }

    /// Same pipeline with a caller-supplied client, the seam tests use.
    pub fn demographics_with_client<T: CensusTransport>(
        &self,
        request: &DemographicsRequest,
        client: &CensusClient<T>,
    ) -> Result<DemographicsOutcome> {
        let snapshot = self.snapshot()?;
        let (latitude, longitude) = store_coordinates(&snapshot, &request.store_id)?;

        let candidates = centroids_from_stores(&snapshot.stores)?;
        let zctas = match resolve_radius(latitude, longitude, request.radius_miles, &candidates) {
            Ok(zctas) => zctas,
            Err(Error::GeoResolution(reason)) => {
                tracing::debug!(store = %request.store_id, %reason, "no geography in radius");
                return Ok(DemographicsOutcome::NoGeography { reason });
            }
            Err(e) => return Err(e),
        };

        let variables = DEFAULT_VARIABLES.to_vec();
        let local: Vec<GeographyProfile> = match client.fetch_zcta_profiles(&zctas, &variables) {
            Ok(profiles) => profiles,
            Err(Error::ExternalService(reason)) => {
                tracing::warn!(%reason, "census unavailable");
                return Ok(DemographicsOutcome::Unavailable { reason });
            }
            Err(e) => return Err(e),
        };
        let state = match client.fetch_state_profile(&self.config.census_state_fips, &variables) {
            Ok(profile) => profile,
            Err(Error::ExternalService(reason)) => {
                tracing::warn!(%reason, "census unavailable");
                return Ok(DemographicsOutcome::Unavailable { reason });
            }
            Err(e) => return Err(e),
        };

        Ok(DemographicsOutcome::Report(DemographicsReport {
            variables,
            local,
            state,
        }))
    }

    fn census_config(&self) -> Result<CensusConfig> {
        let key = self.config.census_api_key.as_deref().ok_or_else(|| {
            Error::Config("demographics requires a Census API key (CENSUS_API_KEY)".into())
        })?;
        Ok(CensusConfig::new(key))
    }
}

/// Coordinates of one store in the snapshot.
fn store_coordinates(snapshot: &Snapshot, store_id: &str) -> Result<(f64, f64)> {
    let ids = str_col(&snapshot.stores, col::STORE_ID)?;
    let lats = f64_col(&snapshot.stores, col::LATITUDE)?;
    let lons = f64_col(&snapshot.stores, col::LONGITUDE)?;
    for row in 0..snapshot.stores.num_rows() {
        if str_at(ids, row) == Some(store_id) {
            return match (f64_at(lats, row), f64_at(lons, row)) {
                (Some(lat), Some(lon)) => Ok((lat, lon)),
                _ => Err(Error::InvalidArgumentError(format!(
                    "store {store_id} has no coordinates"
                ))),
            };
        }
    }
    Err(Error::InvalidArgumentError(format!(
        "unknown store identifier: {store_id}"
    )))
}
