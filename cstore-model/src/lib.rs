//! Shared vocabulary for the CStore analytics core.
//!
//! This crate defines the data dictionary (table and column names, required
//! columns), the closed enumerations of the domain ([`ScanType`],
//! [`PaymentClass`]), the category classifiers used by the pipelines, and the
//! filter parameter structs each pipeline accepts. It carries no I/O and no
//! query logic; every other crate builds on these definitions.

#![forbid(unsafe_code)]

pub mod batch;
pub mod category;
pub mod filter;
pub mod payment;
pub mod scan;
pub mod schema;

pub use filter::{
    BeverageFilter, DateRange, DemographicsRequest, DropMetric, PaymentFilter, StoreSelection,
    TopProductsFilter,
};
pub use payment::PaymentClass;
pub use scan::ScanType;
pub use schema::TableKind;
