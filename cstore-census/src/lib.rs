//! Census collaborator for the demographics pipeline.
//!
//! Two responsibilities live in this crate, and only these two:
//!
//! - **Radius-to-geography resolution**: given a store's coordinates and a
//!   radius, find the ZCTA centroids inside it ([`resolve_radius`]). Zero
//!   matches is [`Error::GeoResolution`].
//! - **Response validation**: the ACS array-of-arrays payload is checked for
//!   shape and decoded with sentinel handling before anything downstream
//!   sees it.
//!
//! The statistical lookup itself is the Census Bureau's; [`CensusClient`]
//! wraps it with a bounded timeout and a small number of retries with
//! doubling backoff, surfacing [`Error::ExternalService`] once those are
//! exhausted.
//!
//! [`Error::GeoResolution`]: cstore_result::Error::GeoResolution
//! [`Error::ExternalService`]: cstore_result::Error::ExternalService

#![forbid(unsafe_code)]

pub mod client;
pub mod geography;
pub mod profile;
pub mod variables;

pub use client::{CensusClient, CensusConfig, CensusTransport, HttpTransport, TransportResponse};
pub use geography::{centroids_from_stores, resolve_radius, ZctaCentroid};
pub use profile::{DemographicsReport, GeographyProfile};
pub use variables::{AcsVariable, DEFAULT_VARIABLES};
