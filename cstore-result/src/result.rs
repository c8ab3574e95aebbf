//! Result type alias used across all CStore crates.

use crate::error::Error;

/// Convenience alias: every fallible CStore operation returns this.
pub type Result<T, E = Error> = std::result::Result<T, E>;
