//! Request builder, response parser and dispatcher for the kintone REST API.
//!
//! # Design
//! `HttpClient` holds the base URL, the auth headers and the fixed params
//! resolved at construction, and nothing mutable. `build_request` and
//! `parse_response` are pure; `get`/`post`/`put`/`delete` glue them to the
//! injected `Transport` for callers that want a single async call.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;
use url::form_urlencoded;

use crate::error::{ApiError, KintoneErrorBody};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

#[derive(Debug)]
pub struct HttpClient<T> {
    transport: T,
    base_url: String,
    headers: Vec<(String, String)>,
    params: Map<String, Value>,
    guest_space_id: Option<u64>,
}

impl<T> HttpClient<T> {
    pub fn new(
        transport: T,
        base_url: &str,
        headers: Vec<(String, String)>,
        params: Map<String, Value>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
            params,
            guest_space_id: None,
        }
    }

    pub fn with_guest_space_id(mut self, guest_space_id: Option<u64>) -> Self {
        self.guest_space_id = guest_space_id;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// API path for `endpoint`, e.g. `record` → `/k/v1/record.json`.
    pub fn path(&self, endpoint: &str, preview: bool) -> String {
        build_path(endpoint, self.guest_space_id, preview)
    }

    /// Build the request for `method` without sending it.
    ///
    /// `params` must serialize to a JSON object (or `null`). The fixed params
    /// are merged on top, so a caller can never override the request token.
    pub fn build_request<P>(
        &self,
        method: HttpMethod,
        path: &str,
        params: &P,
    ) -> Result<HttpRequest, ApiError>
    where
        P: Serialize + ?Sized,
    {
        let value =
            serde_json::to_value(params).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut payload = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ApiError::Serialization(format!(
                    "request params must be a JSON object, got {other}"
                )))
            }
        };
        for (key, value) in &self.params {
            payload.insert(key.clone(), value.clone());
        }

        let mut headers = self.headers.clone();
        let mut url = format!("{}{path}", self.base_url);
        let body = if method.uses_query() {
            let query = encode_query(&payload);
            if !query.is_empty() {
                url.push('?');
                url.push_str(&query);
            }
            None
        } else {
            headers.push(("content-type".to_string(), "application/json".to_string()));
            let body = serde_json::to_string(&payload)
                .map_err(|e| ApiError::Serialization(e.to_string()))?;
            Some(body)
        };

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }
}

impl<T: Transport> HttpClient<T> {
    pub async fn get<P, R>(&self, path: &str, params: &P) -> Result<R, ApiError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request(HttpMethod::Get, path, params).await
    }

    pub async fn post<P, R>(&self, path: &str, params: &P) -> Result<R, ApiError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request(HttpMethod::Post, path, params).await
    }

    pub async fn put<P, R>(&self, path: &str, params: &P) -> Result<R, ApiError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request(HttpMethod::Put, path, params).await
    }

    pub async fn delete<P, R>(&self, path: &str, params: &P) -> Result<R, ApiError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request(HttpMethod::Delete, path, params).await
    }

    async fn request<P, R>(&self, method: HttpMethod, path: &str, params: &P) -> Result<R, ApiError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.build_request(method, path, params)?;
        debug!(method = method.as_str(), path, "sending request");
        let response = self.transport.send(request).await?;
        debug!(method = method.as_str(), path, status = response.status, "received response");
        parse_response(response)
    }
}

/// Map a response to `R`, or to the matching `ApiError` for non-2xx.
pub fn parse_response<R: DeserializeOwned>(response: HttpResponse) -> Result<R, ApiError> {
    if !(200..300).contains(&response.status) {
        return Err(match serde_json::from_str::<KintoneErrorBody>(&response.body) {
            Ok(err) => ApiError::Kintone {
                status: response.status,
                code: err.code,
                id: err.id,
                message: err.message,
                errors: err.errors,
            },
            Err(_) => ApiError::Http {
                status: response.status,
                body: response.body,
            },
        });
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

pub fn build_path(endpoint: &str, guest_space_id: Option<u64>, preview: bool) -> String {
    let preview = if preview { "preview/" } else { "" };
    match guest_space_id {
        Some(id) => format!("/k/guest/{id}/v1/{preview}{endpoint}.json"),
        None => format!("/k/v1/{preview}{endpoint}.json"),
    }
}

/// Encode a payload as a query string: arrays as `key[0]=v`, nested objects
/// as `key[sub]=v`, `null` skipped.
pub fn encode_query(params: &Map<String, Value>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        append_pairs(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append_pairs(
    serializer: &mut form_urlencoded::Serializer<'_, String>,
    key: &str,
    value: &Value,
) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        Value::Bool(_) | Value::Number(_) => {
            serializer.append_pair(key, &value.to_string());
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                append_pairs(serializer, &format!("{key}[{i}]"), item);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                append_pairs(serializer, &format!("{key}[{sub}]"), item);
            }
        }
    }
}
