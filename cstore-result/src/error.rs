use std::{fmt, io};
use thiserror::Error;

/// Unified error type for all CStore operations.
///
/// Each variant corresponds to one failure boundary of the analytics core.
/// Errors propagate upward with the `?` operator; at the presentation boundary
/// they are rendered through their `Display` implementations.
///
/// # Thread Safety
///
/// `Error` implements `Send` and `Sync`, so a failed load can be surfaced to
/// every session waiting on the same cache key.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file access.
    ///
    /// Wraps standard library I/O errors raised while opening or reading the
    /// Parquet source files. Permission and not-found details come from the
    /// underlying `io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Arrow library error during columnar data operations.
    ///
    /// Raised by the Arrow compute kernels (cast, filter, concat) and by
    /// RecordBatch construction. Arrow is the in-memory table format of the
    /// whole core, so these usually indicate a malformed source file.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// A required source file is missing or unreadable.
    ///
    /// Fatal to the load that needed the file; surfaced verbatim to the
    /// caller. The message names the offending path.
    #[error("data source error: {0}")]
    DataSource(String),

    /// A table is structurally different from its data dictionary entry.
    ///
    /// Raised when an expected column is entirely absent or carries a type the
    /// loader cannot normalize. This is a structural problem with the
    /// snapshot, not a data-quality finding, and aborts the load.
    #[error("schema error: {0}")]
    Schema(String),

    /// No census geography intersects the requested radius.
    ///
    /// The demographics pipeline reports this and returns an empty result;
    /// it is not a transport failure and is never retried.
    #[error("geography resolution error: {0}")]
    GeoResolution(String),

    /// The Census API was unreachable after the configured retries.
    ///
    /// Recoverable by retrying the whole request later; the demographics
    /// pipeline degrades to an "unavailable" outcome when it sees this.
    #[error("external service error: {0}")]
    ExternalService(String),

    /// The core is misconfigured (for example, no Census API key).
    ///
    /// Configuration problems are distinguished from core-logic failures so
    /// the host can point the operator at the environment, not the data.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid user input or API parameter.
    ///
    /// An inverted date range, an empty store allowlist, an unknown store
    /// identifier. Fix the input and retry.
    #[error("invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Internal invariant violation. These indicate a bug, not bad input.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Duplicate an error for fan-out to concurrent waiters.
    ///
    /// The snapshot cache shares one load among every session asking for the
    /// same key; when that load fails the failure arrives wrapped in an `Arc`
    /// and must be handed to each waiter by value. Source-carrying variants
    /// (`Io`, `Arrow`) are flattened to their display form.
    pub fn duplicate(&self) -> Error {
        match self {
            Error::Io(e) => Error::Internal(format!("I/O error: {e}")),
            Error::Arrow(e) => Error::Internal(format!("Arrow error: {e}")),
            Error::DataSource(msg) => Error::DataSource(msg.clone()),
            Error::Schema(msg) => Error::Schema(msg.clone()),
            Error::GeoResolution(msg) => Error::GeoResolution(msg.clone()),
            Error::ExternalService(msg) => Error::ExternalService(msg.clone()),
            Error::Config(msg) => Error::Config(msg.clone()),
            Error::InvalidArgumentError(msg) => Error::InvalidArgumentError(msg.clone()),
            Error::Internal(msg) => Error::Internal(msg.clone()),
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(e: fmt::Error) -> Self {
        Error::Internal(format!("format error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_preserves_variant_and_message() {
        let err = Error::DataSource("missing cstore_stores.parquet".into());
        match err.duplicate() {
            Error::DataSource(msg) => assert_eq!(msg, "missing cstore_stores.parquet"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn io_errors_flatten_on_duplicate() {
        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(matches!(err.duplicate(), Error::Internal(_)));
    }
}
