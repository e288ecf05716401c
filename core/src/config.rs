//! Client construction options.
//!
//! `ClientOptions` is what `KintoneRestApiClient::new` consumes. Host
//! applications that configure through the environment load a
//! `ClientConfig` with figment (`KINTONE_*` variables) and convert it.

use base64::prelude::BASE64_STANDARD;
use base64::Engine as _;
use figment::providers::Env;
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::auth::PartialAuth;
use crate::error::ConfigurationError;

pub const ENV_PREFIX: &str = "KINTONE_";

/// Outer HTTP Basic auth some kintone domains sit behind.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn header(&self) -> (String, String) {
        let encoded = BASE64_STANDARD.encode(format!("{}:{}", self.username, self.password));
        ("Authorization".to_string(), format!("Basic {encoded}"))
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub auth: PartialAuth,
    pub basic_auth: Option<BasicAuth>,
    pub guest_space_id: Option<u64>,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>, auth: PartialAuth) -> Self {
        Self {
            base_url: base_url.into(),
            auth,
            basic_auth: None,
            guest_space_id: None,
        }
    }

    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.basic_auth = Some(BasicAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_guest_space_id(mut self, guest_space_id: u64) -> Self {
        self.guest_space_id = Some(guest_space_id);
        self
    }
}

/// Flat, all-optional configuration as read from the environment or CLI.
///
/// `None` fields are skipped on serialization so a `Serialized` override
/// layer only replaces the values it actually sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_space_id: Option<u64>,
}

impl ClientConfig {
    /// The environment layer. Callers may merge further providers on top.
    pub fn figment() -> Figment {
        Figment::new().merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::extract(&Self::figment())
    }

    pub fn extract(figment: &Figment) -> Result<Self, ConfigurationError> {
        figment
            .extract()
            .map_err(|e| ConfigurationError::Invalid(e.to_string()))
    }

    pub fn into_options(self) -> Result<ClientOptions, ConfigurationError> {
        let base_url = self
            .base_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigurationError::MissingBaseUrl)?;
        let auth = PartialAuth {
            api_token: self.api_token,
            username: self.username,
            password: self.password,
        };
        let mut options = ClientOptions::new(base_url, auth);
        if let Some(username) = self.basic_auth_username {
            let password = self.basic_auth_password.unwrap_or_default();
            options = options.with_basic_auth(username, password);
        }
        options.guest_space_id = self.guest_space_id;
        Ok(options)
    }
}
