//! The client facade: one auth resolution shared by every resource client.

use std::sync::Arc;

use tracing::info;

use crate::app::AppClient;
use crate::auth::{resolve_auth, AuthHeader, RequestTokenProvider};
use crate::client::HttpClient;
use crate::config::ClientOptions;
use crate::error::ConfigurationError;
use crate::http::Transport;
use crate::record::RecordClient;

/// Entry point: resolves credentials once and hands the resulting
/// `HttpClient` to every resource client.
#[derive(Debug)]
pub struct KintoneRestApiClient<T> {
    pub record: RecordClient<T>,
    pub app: AppClient<T>,
    header: AuthHeader,
}

impl<T: Transport> KintoneRestApiClient<T> {
    /// Build a client for API token or password auth. Session auth needs
    /// `with_request_token_provider`.
    pub fn new(options: ClientOptions, transport: T) -> Result<Self, ConfigurationError> {
        Self::with_request_token_provider(options, transport, None)
    }

    pub fn with_request_token_provider(
        options: ClientOptions,
        transport: T,
        token_provider: Option<&dyn RequestTokenProvider>,
    ) -> Result<Self, ConfigurationError> {
        if options.base_url.trim().is_empty() {
            return Err(ConfigurationError::MissingBaseUrl);
        }
        let resolved = resolve_auth(options.auth, token_provider)?;

        let mut headers = vec![resolved.header.to_pair()];
        if let Some(basic_auth) = &options.basic_auth {
            headers.push(basic_auth.header());
        }

        let http = Arc::new(
            HttpClient::new(transport, &options.base_url, headers, resolved.params)
                .with_guest_space_id(options.guest_space_id),
        );
        info!(
            base_url = http.base_url(),
            auth = resolved.auth.mode(),
            guest_space_id = options.guest_space_id,
            "kintone client ready"
        );

        Ok(Self {
            record: RecordClient::new(Arc::clone(&http)),
            app: AppClient::new(http),
            header: resolved.header,
        })
    }

    /// The auth header attached to every request.
    pub fn headers(&self) -> &AuthHeader {
        &self.header
    }
}
