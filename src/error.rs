//! Crate-wide error type.
//!
//! Every error is fatal for the run that raised it: configuration and data
//! errors surface before the first generation, worker failures abort
//! population seeding. Nothing is retried.

use std::path::PathBuf;

/// Errors raised while configuring, loading, or seeding an evolutionary run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration parameter is missing, out of range, or unknown.
    #[error("invalid parameter `{parameter}` = {value}: {reason}")]
    Config {
        parameter: &'static str,
        value: String,
        reason: String,
    },

    /// The dataset is empty or malformed.
    #[error("invalid dataset: {0}")]
    Data(String),

    /// A tour or dataset refers to a city id outside `[0, len)`.
    #[error("city id {id} out of range for {len} cities")]
    CityOutOfRange { id: usize, len: usize },

    /// A parallel seeding task failed; the whole initialization is aborted.
    #[error("initialization worker {index} failed: {source}")]
    Worker {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A distance cache exists but was built for a different dataset.
    #[error("distance cache mismatch: {0}")]
    Cache(String),
}

impl Error {
    /// Shorthand for [`Error::Config`].
    pub(crate) fn config(
        parameter: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::Config {
            parameter,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
