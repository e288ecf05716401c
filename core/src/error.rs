//! Error types for the kintone REST API client.
//!
//! # Design
//! `ConfigurationError` is raised while building a client and never after.
//! `ApiError` covers a single request/response round-trip. When kintone
//! answers with its JSON error envelope the fields are kept in
//! `ApiError::Kintone`; any other non-2xx response lands in `ApiError::Http`
//! with the raw status and body for debugging.

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while resolving client configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Session auth was selected but no request-token provider was injected.
    #[error("session authentication must specify a request token")]
    MissingRequestToken,

    /// No base URL was supplied by the caller or the environment.
    #[error("a base URL must be specified")]
    MissingBaseUrl,

    /// The environment or override layer could not be extracted.
    #[error("invalid client configuration: {0}")]
    Invalid(String),
}

/// Failure reported by a `Transport` before any HTTP status was received.
#[derive(Debug, Error)]
#[error("transport failed: {0}")]
pub struct TransportError(pub String);

/// Errors returned by `HttpClient` and the resource clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// kintone returned its structured error body.
    #[error("kintone error {code} (HTTP {status}): {message}")]
    Kintone {
        status: u16,
        code: String,
        id: String,
        message: String,
        errors: Option<serde_json::Value>,
    },

    /// The server returned a non-2xx status without a kintone error body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized, or was not a JSON object.
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Kintone { status, .. } | ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The JSON envelope kintone uses for every error response.
#[derive(Debug, Deserialize)]
pub(crate) struct KintoneErrorBody {
    pub code: String,
    #[serde(default)]
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}
