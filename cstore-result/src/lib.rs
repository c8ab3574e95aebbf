//! Error types and result definitions for the CStore analytics core.
//!
//! This crate provides a unified error type ([`Error`]) and result type alias
//! ([`Result<T>`]) used throughout all CStore crates. All operations that could
//! fail return `Result<T>`, where the error variant says which boundary failed:
//! the data source, the table structure, the geography resolution, or the
//! external Census collaborator.
//!
//! Data-*quality* findings are deliberately not errors. They are accumulated by
//! the validator and returned inside its report; only structural problems (a
//! missing file, an absent column) surface through [`Error`].

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
