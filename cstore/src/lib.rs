//! CStore Analytics: the query core behind a convenience-store dashboard.
//!
//! This crate is the primary entrypoint for the CStore analytics toolkit. It
//! re-exports the layered workspace behind one [`Engine`] facade: configure
//! it, and each page of the presentation layer maps onto one call.
//!
//! # Quick Start
//!
//! ```no_run
//! use cstore::{Engine, EngineConfig, TopProductsFilter};
//!
//! let engine = Engine::new(EngineConfig::new("data"));
//! let report = engine.top_products(&TopProductsFilter::default())?;
//! for row in &report.rows {
//!     println!("{:>14} {:>10.2}", row.gtin, row.revenue);
//! }
//! # Ok::<(), cstore::Error>(())
//! ```
//!
//! # Architecture
//!
//! The workspace is layered, smallest crates at the bottom:
//!
//! - **Vocabulary** (`cstore-model`, `cstore-result`): the data dictionary,
//!   domain enums, filter structs, and the unified error type.
//! - **Loading** (`cstore-load`, `cstore-cache`): Parquet snapshots into
//!   normalized Arrow tables, cached with TTL and single-flight loads.
//! - **Validation** (`cstore-validate`): structured data-quality reporting
//!   over a loaded snapshot.
//! - **Queries** (`cstore-query`, `cstore-census`): the four business
//!   questions: three pure pipelines over the snapshot plus the Census
//!   demographics collaborator.
//!
//! Everything downstream of the loader is a pure function of the snapshot
//! and its filter parameters; re-running a query with the same inputs
//! returns the same rows in the same order.

pub mod config;
pub mod engine;

pub use config::EngineConfig;
pub use engine::{DemographicsOutcome, Engine};

// The per-pipeline filter parameters and result tables.
pub use cstore_model::{
    BeverageFilter, DateRange, DemographicsRequest, DropMetric, PaymentClass, PaymentFilter,
    ScanType, StoreSelection, TopProductsFilter,
};
pub use cstore_query::{
    BrandKpis, BrandRankingReport, BrandRow, PaymentClassSummary, PaymentComparisonReport,
    ProductPurchaseRow, TopProductRow, TopProductsKpis, TopProductsReport, WeeklyProductRow,
};

// Loading, caching, and validation surfaces for hosts that drive them
// directly.
pub use cstore_cache::{CacheKey, SnapshotCache};
pub use cstore_census::{CensusClient, CensusConfig, DemographicsReport, GeographyProfile};
pub use cstore_load::{LoadOptions, Loader, Snapshot};
pub use cstore_validate::{DataQualityWarning, ValidationReport};

// Re-export result types for error handling.
pub use cstore_result::{Error, Result};
