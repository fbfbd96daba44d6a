use thiserror::Error;

use crate::api::Collection;
use crate::id::NetworkEntityId;

/// Failures talking to the network data API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {detail}")]
    Status {
        endpoint: String,
        status: u16,
        detail: String,
    },

    #[error("unexpected payload from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The backend answered with its result envelope and a non-200 code.
    #[error("backend rejected request ({code}): {message}")]
    Rejected { code: i64, message: String },
}

/// A reload step that could not complete.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to load {collection}: {source}")]
    Fetch {
        collection: Collection,
        #[source]
        source: ApiError,
    },
}

/// Malformed boundary GeoJSON.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("boundary is not a GeoJSON object")]
    NotAnObject,

    #[error("unsupported GeoJSON type `{0}`")]
    UnsupportedType(String),

    #[error("boundary feature {index}: {reason}")]
    Feature { index: usize, reason: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocateError {
    #[error("no network entity named `{0}`")]
    NotFound(String),

    #[error("{0} has no resolvable position")]
    NoFocus(NetworkEntityId),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: `{value}`")]
    Invalid { key: &'static str, value: String },
}
