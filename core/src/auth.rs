//! Credential resolution.
//!
//! A `PartialAuth` is whatever the caller happened to supply. It is turned
//! into exactly one `Auth` variant, and from that into the single header and
//! the optional body parameter attached to every request. This happens once,
//! when the client is built.

use base64::prelude::BASE64_STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ConfigurationError;

pub const AUTHORIZATION_HEADER: &str = "X-Cybozu-Authorization";
pub const API_TOKEN_HEADER: &str = "X-Cybozu-API-Token";
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";
pub const REQUESTED_WITH_VALUE: &str = "XMLHttpRequest";
pub const REQUEST_TOKEN_PARAM: &str = "__REQUEST_TOKEN__";

/// Credentials as supplied by the caller. Which fields are present decides
/// the auth mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialAuth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl PartialAuth {
    pub fn api_token(token: impl Into<String>) -> Self {
        Self {
            api_token: Some(token.into()),
            ..Self::default()
        }
    }

    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    pub fn session() -> Self {
        Self::default()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    ApiToken { api_token: String },
    Password { username: String, password: String },
    Session,
}

impl Auth {
    pub fn mode(&self) -> &'static str {
        match self {
            Auth::ApiToken { .. } => "apiToken",
            Auth::Password { .. } => "password",
            Auth::Session => "session",
        }
    }

    fn header(&self) -> AuthHeader {
        match self {
            Auth::Password { username, password } => {
                AuthHeader::Authorization(BASE64_STANDARD.encode(format!("{username}:{password}")))
            }
            Auth::ApiToken { api_token } => AuthHeader::ApiToken(api_token.clone()),
            Auth::Session => AuthHeader::RequestedWith,
        }
    }
}

impl From<PartialAuth> for Auth {
    fn from(partial: PartialAuth) -> Self {
        match partial {
            PartialAuth {
                username: Some(username),
                password,
                ..
            } => Auth::Password {
                username,
                password: password.unwrap_or_default(),
            },
            PartialAuth {
                api_token: Some(api_token),
                ..
            } => Auth::ApiToken { api_token },
            _ => Auth::Session,
        }
    }
}

// Keeps secrets out of `{:?}` output and therefore out of logs.
impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::ApiToken { .. } => f.write_str("ApiToken { .. }"),
            Auth::Password { username, .. } => {
                write!(f, "Password {{ username: {username:?}, .. }}")
            }
            Auth::Session => f.write_str("Session"),
        }
    }
}

/// The one auth header a client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthHeader {
    /// `X-Cybozu-Authorization: base64(username:password)`
    Authorization(String),
    /// `X-Cybozu-API-Token: <token>`
    ApiToken(String),
    /// `X-Requested-With: XMLHttpRequest`
    RequestedWith,
}

impl AuthHeader {
    pub fn name(&self) -> &'static str {
        match self {
            AuthHeader::Authorization(_) => AUTHORIZATION_HEADER,
            AuthHeader::ApiToken(_) => API_TOKEN_HEADER,
            AuthHeader::RequestedWith => REQUESTED_WITH_HEADER,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            AuthHeader::Authorization(v) | AuthHeader::ApiToken(v) => v,
            AuthHeader::RequestedWith => REQUESTED_WITH_VALUE,
        }
    }

    pub fn to_pair(&self) -> (String, String) {
        (self.name().to_string(), self.value().to_string())
    }
}

/// Supplies the CSRF request token of the current logged-in session.
pub trait RequestTokenProvider {
    fn request_token(&self) -> String;
}

impl<F> RequestTokenProvider for F
where
    F: Fn() -> String,
{
    fn request_token(&self) -> String {
        self()
    }
}

/// Everything the HTTP client needs from the credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAuth {
    pub auth: Auth,
    pub header: AuthHeader,
    /// Merged into every request payload.
    pub params: Map<String, Value>,
}

/// Decide the auth mode and materialize its header and params.
pub fn resolve_auth(
    partial: PartialAuth,
    token_provider: Option<&dyn RequestTokenProvider>,
) -> Result<ResolvedAuth, ConfigurationError> {
    let auth = Auth::from(partial);
    let params = build_params(&auth, token_provider)?;
    let header = auth.header();
    debug!(mode = auth.mode(), has_params = !params.is_empty(), "auth mode resolved");
    Ok(ResolvedAuth { auth, header, params })
}

fn build_params(
    auth: &Auth,
    token_provider: Option<&dyn RequestTokenProvider>,
) -> Result<Map<String, Value>, ConfigurationError> {
    let mut params = Map::new();
    if let Auth::Session = auth {
        let provider = token_provider.ok_or(ConfigurationError::MissingRequestToken)?;
        let token = provider.request_token();
        if !token.is_empty() {
            params.insert(REQUEST_TOKEN_PARAM.to_string(), Value::String(token));
        }
    }
    Ok(params)
}
