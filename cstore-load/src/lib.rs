//! Snapshot loading for the CStore analytics core.
//!
//! The loader reads the fixed set of Parquet tables described by
//! [`cstore_model::TableKind`] into immutable in-memory [`RecordBatch`] tables,
//! normalizing column types on the way in and filtering every store-scoped
//! table to the configured city allowlist so the working set stays bounded.
//!
//! Loading is the only expensive step of the core; everything downstream is a
//! pure function over the returned [`Snapshot`]. A missing required file is
//! [`Error::DataSource`]; an absent required column is [`Error::Schema`].
//!
//! [`RecordBatch`]: arrow::record_batch::RecordBatch
//! [`Error::DataSource`]: cstore_result::Error::DataSource
//! [`Error::Schema`]: cstore_result::Error::Schema

#![forbid(unsafe_code)]

pub mod dedup;
pub mod loader;
pub mod normalize;
pub mod reader;
pub mod snapshot;

pub use loader::{LoadOptions, Loader, DEFAULT_CITIES};
pub use snapshot::{OrphanCounts, Snapshot};
