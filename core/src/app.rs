//! App endpoints: settings, app lists, form fields and form layout.

use std::sync::Arc;

use crate::client::HttpClient;
use crate::error::ApiError;
use crate::fields::FieldsJson;
use crate::http::Transport;
use crate::types::{
    App, FormLayout, GetAppParams, GetAppsParams, GetAppsResponse, GetFormFieldsParams,
    GetFormLayoutParams,
};

/// Typed access to app settings and form schema endpoints.
#[derive(Debug)]
pub struct AppClient<T> {
    client: Arc<HttpClient<T>>,
}

impl<T: Transport> AppClient<T> {
    pub fn new(client: Arc<HttpClient<T>>) -> Self {
        Self { client }
    }

    pub async fn get_app(&self, params: &GetAppParams) -> Result<App, ApiError> {
        let path = self.client.path("app", false);
        self.client.get(&path, params).await
    }

    pub async fn get_apps(&self, params: &GetAppsParams) -> Result<GetAppsResponse, ApiError> {
        let path = self.client.path("apps", false);
        self.client.get(&path, params).await
    }

    /// `preview` reads the pre-live settings instead of the deployed ones.
    pub async fn get_form_fields(
        &self,
        params: &GetFormFieldsParams,
        preview: bool,
    ) -> Result<FieldsJson, ApiError> {
        let path = self.client.path("app/form/fields", preview);
        self.client.get(&path, params).await
    }

    pub async fn get_form_layout(
        &self,
        params: &GetFormLayoutParams,
        preview: bool,
    ) -> Result<FormLayout, ApiError> {
        let path = self.client.path("app/form/layout", preview);
        self.client.get(&path, params).await
    }
}
