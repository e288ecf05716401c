//! Record lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every record
//! operation through `KintoneRestApiClient` with a ureq-backed `Transport`.
//! Validates that request building, auth decoration and response parsing
//! line up with an actual HTTP server.

use std::net::SocketAddr;

use kintone_core::types::{
    AddRecordParams, AddRecordsParams, DeleteRecordsParams, GetAllRecordsParams, GetAppParams,
    GetFormFieldsParams, GetRecordParams, GetRecordsParams, UpdateRecordParams,
};
use kintone_core::{
    ApiError, ClientOptions, HttpMethod, HttpRequest, HttpResponse, KintoneRestApiClient,
    PartialAuth, Record, Transport, TransportError,
};
use serde_json::json;

/// Execute an `HttpRequest` with ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses come back as data and the core handles status interpretation.
struct UreqTransport;

fn execute(req: HttpRequest) -> Result<HttpResponse, TransportError> {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let result = match req.method {
        HttpMethod::Get => {
            let mut builder = agent.get(&req.url);
            for (name, value) in &req.headers {
                builder = builder.header(name, value);
            }
            builder.call()
        }
        HttpMethod::Delete => {
            let mut builder = agent.delete(&req.url);
            for (name, value) in &req.headers {
                builder = builder.header(name, value);
            }
            builder.call()
        }
        HttpMethod::Post | HttpMethod::Put => {
            let mut builder = if req.method == HttpMethod::Post {
                agent.post(&req.url)
            } else {
                agent.put(&req.url)
            };
            for (name, value) in &req.headers {
                if !name.eq_ignore_ascii_case("content-type") {
                    builder = builder.header(name, value);
                }
            }
            builder
                .content_type("application/json")
                .send(req.body.unwrap_or_default().as_bytes())
        }
    };
    let mut response = result.map_err(|e| TransportError(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body,
    })
}

impl Transport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tokio::task::spawn_blocking(move || execute(request))
            .await
            .map_err(|e| TransportError(e.to_string()))?
    }
}

fn start_mock_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

fn record(value: serde_json::Value) -> Record {
    value.as_object().unwrap().clone()
}

#[tokio::test(flavor = "multi_thread")]
async fn record_lifecycle_with_api_token() {
    let addr = start_mock_server();
    let options = ClientOptions::new(
        format!("http://{addr}/"),
        PartialAuth::api_token(mock_server::API_TOKEN),
    );
    let client = KintoneRestApiClient::new(options, UreqTransport).unwrap();
    let app = mock_server::APP_ID;

    // Step 1: app settings and schema.
    let settings = client.app.get_app(&GetAppParams { id: app }).await.unwrap();
    assert_eq!(settings.app_id, "1");
    let fields = client
        .app
        .get_form_fields(&GetFormFieldsParams { app, lang: None }, false)
        .await
        .unwrap();
    let codes: Vec<&str> = fields.properties.iter().map(|p| p.code.as_str()).collect();
    assert_eq!(codes, ["$id", "Record_number", "title", "tags", "owner", "items"]);

    // Step 2: empty list.
    let listed = client
        .record
        .get_records(&GetRecordsParams {
            app,
            total_count: Some(true),
            ..GetRecordsParams::default()
        })
        .await
        .unwrap();
    assert!(listed.records.is_empty());
    assert_eq!(listed.total_count.as_deref(), Some("0"));

    // Step 3: add one record.
    let added = client
        .record
        .add_record(&AddRecordParams {
            app,
            record: Some(record(json!({ "title": { "value": "Integration test" } }))),
        })
        .await
        .unwrap();
    let id: u64 = added.id.parse().unwrap();

    // Step 4: get it back.
    let fetched = client.record.get_record(&GetRecordParams { app, id }).await.unwrap();
    assert_eq!(fetched.record["title"]["value"], "Integration test");

    // Step 5: update with the current revision.
    let updated = client
        .record
        .update_record(
            &UpdateRecordParams::by_id(app, id, record(json!({ "title": { "value": "Updated" } })))
                .with_revision(added.revision.parse().unwrap()),
        )
        .await
        .unwrap();
    assert_eq!(updated.revision, "2");

    // Step 6: a stale revision is a kintone conflict.
    let err = client
        .record
        .update_record(&UpdateRecordParams::by_id(app, id, record(json!({}))).with_revision(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Kintone { status: 409, .. }));

    // Step 7: bulk add and fetch everything.
    client
        .record
        .add_records(&AddRecordsParams {
            app,
            records: vec![record(json!({})), record(json!({}))],
        })
        .await
        .unwrap();
    let all = client
        .record
        .get_all_records(&GetAllRecordsParams {
            app,
            ..GetAllRecordsParams::default()
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    // Step 8: delete and confirm 404.
    client
        .record
        .delete_records(&DeleteRecordsParams {
            app,
            ids: vec![id],
            revisions: None,
        })
        .await
        .unwrap();
    let err = client.record.get_record(&GetRecordParams { app, id }).await.unwrap_err();
    match err {
        ApiError::Kintone { status, code, .. } => {
            assert_eq!(status, 404);
            assert_eq!(code, "GAIA_RE01");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn password_and_session_auth_reach_the_server() {
    let addr = start_mock_server();
    let base_url = format!("http://{addr}");

    let password = KintoneRestApiClient::new(
        ClientOptions::new(
            base_url.clone(),
            PartialAuth::password(mock_server::USERNAME, mock_server::PASSWORD),
        ),
        UreqTransport,
    )
    .unwrap();
    password.app.get_app(&GetAppParams { id: 1 }).await.unwrap();

    let provider = || mock_server::REQUEST_TOKEN.to_string();
    let session = KintoneRestApiClient::with_request_token_provider(
        ClientOptions::new(base_url.clone(), PartialAuth::session()),
        UreqTransport,
        Some(&provider),
    )
    .unwrap();
    let added = session
        .record
        .add_record(&AddRecordParams { app: 1, record: None })
        .await
        .unwrap();
    let id = added.id.parse().unwrap();
    session.record.get_record(&GetRecordParams { app: 1, id }).await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_credentials_surface_kintone_error() {
    let addr = start_mock_server();
    let client = KintoneRestApiClient::new(
        ClientOptions::new(format!("http://{addr}"), PartialAuth::password("intruder", "nope")),
        UreqTransport,
    )
    .unwrap();
    let err = client.app.get_app(&GetAppParams { id: 1 }).await.unwrap_err();
    assert!(matches!(err, ApiError::Kintone { status: 401, ref code, .. } if code == "CB_WA01"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_host_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = KintoneRestApiClient::new(
        ClientOptions::new(format!("http://{addr}"), PartialAuth::api_token("tok")),
        UreqTransport,
    )
    .unwrap();
    let err = client.app.get_app(&GetAppParams { id: 1 }).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
