//! Typed client core for the kintone REST API.
//!
//! # Overview
//! Credentials are resolved once into a single auth header (plus a request
//! token for session auth), then every resource call is built as plain
//! `HttpRequest` data and sent through a host-supplied `Transport`
//! (host-does-IO pattern). Responses come back as `HttpResponse` data and
//! are parsed here.
//!
//! # Design
//! - `Auth` is an enum decided once by `resolve_auth`; nothing re-inspects
//!   the raw credentials afterwards.
//! - The session request-token source is an injected `RequestTokenProvider`,
//!   not a global lookup.
//! - `HttpClient::build_request` and `parse_response` are pure, so request
//!   shapes are testable without a network.
//! - Record payloads stay as `serde_json` maps; only the field schema
//!   (`FieldsJson`) is typed.

pub mod api_client;
pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod fields;
pub mod http;
pub mod record;
pub mod types;

#[cfg(test)]
mod testing;

pub use api_client::KintoneRestApiClient;
pub use app::AppClient;
pub use auth::{resolve_auth, Auth, AuthHeader, PartialAuth, RequestTokenProvider, ResolvedAuth};
pub use client::{parse_response, HttpClient};
pub use config::{BasicAuth, ClientConfig, ClientOptions};
pub use error::{ApiError, ConfigurationError, TransportError};
pub use fields::{FieldProperties, FieldProperty, FieldType, FieldsJson};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use record::RecordClient;
pub use types::Record;
