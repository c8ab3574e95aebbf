//! Query pipelines for the CStore analytics core.
//!
//! One entry point per business question:
//!
//! - [`top_products`]: weekly top-N products outside the fuel categories.
//! - [`beverage_brands`]: packaged-beverage brands ranked for removal.
//! - [`payment_comparison`]: cash vs credit vs other vs unknown, as parallel
//!   per-class aggregates.
//!
//! (The fourth question, demographics, lives in `cstore-census` because its
//! data comes from the Census collaborator, not the snapshot.)
//!
//! Every pipeline is a pure function of `(snapshot, filter)`: it builds
//! transient hash indexes over the shared tables, aggregates, and returns a
//! small typed result table plus KPI scalars. Nothing here mutates the
//! snapshot, so concurrent invocations over one `Arc<Snapshot>` are safe.

#![forbid(unsafe_code)]

pub mod beverages;
pub mod date;
pub mod index;
pub mod payments;
pub mod scope;
pub mod top_products;

pub use beverages::{beverage_brands, BrandKpis, BrandRankingReport, BrandRow};
pub use payments::{
    payment_comparison, PaymentClassSummary, PaymentComparisonReport, ProductPurchaseRow,
};
pub use top_products::{
    top_products, TopProductRow, TopProductsKpis, TopProductsReport, WeeklyProductRow,
};
