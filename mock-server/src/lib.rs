use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{prelude::BASE64_STANDARD, Engine as _};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const API_TOKEN: &str = "mock-api-token";
pub const USERNAME: &str = "mock-user";
pub const PASSWORD: &str = "mock-password";
pub const REQUEST_TOKEN: &str = "mock-request-token";
pub const APP_ID: u64 = 1;

/// Field schema of the seeded app, served verbatim so property order survives.
pub const FIELDS_JSON: &str = r#"{
  "properties": {
    "$id": { "type": "__ID__", "code": "$id", "label": "$id" },
    "Record_number": { "type": "RECORD_NUMBER", "code": "Record_number", "label": "Record number" },
    "title": { "type": "SINGLE_LINE_TEXT", "code": "title", "label": "Title" },
    "tags": { "type": "CHECK_BOX", "code": "tags", "label": "Tags" },
    "owner": { "type": "USER_SELECT", "code": "owner", "label": "Owner" },
    "items": {
      "type": "SUBTABLE",
      "code": "items",
      "label": "Items",
      "fields": {
        "item_name": { "type": "SINGLE_LINE_TEXT", "code": "item_name", "label": "Item" },
        "qty": { "type": "NUMBER", "code": "qty", "label": "Qty" }
      }
    }
  },
  "revision": "2"
}"#;

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: u64,
    pub revision: u64,
    pub fields: Map<String, Value>,
}

impl StoredRecord {
    fn to_json(&self) -> Value {
        let mut record = self.fields.clone();
        record.insert("$id".to_string(), json!({ "type": "__ID__", "value": self.id.to_string() }));
        record.insert(
            "$revision".to_string(),
            json!({ "type": "__REVISION__", "value": self.revision.to_string() }),
        );
        record.insert(
            "Record_number".to_string(),
            json!({ "type": "RECORD_NUMBER", "value": self.id.to_string() }),
        );
        Value::Object(record)
    }
}

#[derive(Debug, Default)]
pub struct Store {
    next_id: u64,
    records: Vec<StoredRecord>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store {
        next_id: 1,
        records: Vec::new(),
    }));
    Router::new()
        .route("/k/v1/record.json", get(get_record).post(add_record).put(update_record))
        .route("/k/v1/records.json", get(get_records).post(add_records).delete(delete_records))
        .route("/k/v1/app.json", get(get_app))
        .route("/k/v1/app/form/fields.json", get(get_form_fields))
        .layer(middleware::from_fn(require_auth))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

type ApiResult = Result<Response, Response>;

fn kintone_error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({ "code": code, "id": "mock", "message": message }))).into_response()
}

fn not_found(id: u64) -> Response {
    kintone_error(
        StatusCode::NOT_FOUND,
        "GAIA_RE01",
        &format!("The specified record (ID: {id}) is not found."),
    )
}

fn invalid(message: &str) -> Response {
    kintone_error(StatusCode::BAD_REQUEST, "CB_VA01", message)
}

/// Accepts exactly the three header shapes a client can send. Session
/// requests carry their token in the query or body, checked by `require_request_token`.
async fn require_auth(headers: HeaderMap, request: Request, next: Next) -> Response {
    let expected_password = BASE64_STANDARD.encode(format!("{USERNAME}:{PASSWORD}"));
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let authorized = header("X-Cybozu-API-Token") == Some(API_TOKEN)
        || header("X-Cybozu-Authorization") == Some(expected_password.as_str())
        || header("X-Requested-With") == Some("XMLHttpRequest");
    if !authorized {
        return kintone_error(
            StatusCode::UNAUTHORIZED,
            "CB_WA01",
            "Password authentication failed.",
        );
    }
    next.run(request).await
}

fn is_session(headers: &HeaderMap) -> bool {
    headers.get("X-Cybozu-API-Token").is_none() && headers.get("X-Cybozu-Authorization").is_none()
}

fn require_request_token(headers: &HeaderMap, token: Option<&str>) -> Result<(), Response> {
    if is_session(headers) && token != Some(REQUEST_TOKEN) {
        return Err(kintone_error(StatusCode::FORBIDDEN, "GAIA_IT01", "Invalid request token."));
    }
    Ok(())
}

fn body_token(body: &Value) -> Option<&str> {
    body.get("__REQUEST_TOKEN__").and_then(Value::as_str)
}

fn query_token(query: &HashMap<String, String>) -> Option<&str> {
    query.get("__REQUEST_TOKEN__").map(String::as_str)
}

/// kintone accepts ids as numbers or numeric strings.
fn as_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn query_u64(query: &HashMap<String, String>, key: &str) -> Option<u64> {
    query.get(key).and_then(|v| v.parse().ok())
}

fn require_app(app: Option<u64>) -> Result<(), Response> {
    match app {
        Some(APP_ID) => Ok(()),
        Some(other) => Err(kintone_error(
            StatusCode::NOT_FOUND,
            "GAIA_AP01",
            &format!("The app (ID: {other}) not found."),
        )),
        None => Err(invalid("Missing or invalid input: app")),
    }
}

/// Values of `key[0]`, `key[1]`, ... in index order.
fn indexed_values(query: &HashMap<String, String>, key: &str) -> Vec<String> {
    let prefix = format!("{key}[");
    let mut values: Vec<(usize, String)> = query
        .iter()
        .filter_map(|(k, v)| {
            let index = k.strip_prefix(&prefix)?.strip_suffix(']')?.parse().ok()?;
            Some((index, v.clone()))
        })
        .collect();
    values.sort_by_key(|(index, _)| *index);
    values.into_iter().map(|(_, v)| v).collect()
}

/// Extract `limit N` and `offset M` from a kintone query string.
fn limit_offset(query: &str) -> (usize, usize) {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    let after = |keyword: &str| {
        tokens
            .iter()
            .position(|t| t.eq_ignore_ascii_case(keyword))
            .and_then(|i| tokens.get(i + 1))
            .and_then(|t| t.parse().ok())
    };
    (after("limit").unwrap_or(100), after("offset").unwrap_or(0))
}

/// Extract the `N` of a `$id > N` cursor condition.
fn id_after(query: &str) -> Option<u64> {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    tokens
        .windows(3)
        .find(|w| w[0] == "$id" && w[1] == ">")
        .and_then(|w| w[2].trim_end_matches(')').parse().ok())
}

fn strip_system_fields(record: &Map<String, Value>) -> Map<String, Value> {
    record
        .iter()
        .filter(|(code, _)| !matches!(code.as_str(), "$id" | "$revision" | "Record_number"))
        .map(|(code, value)| (code.clone(), value.clone()))
        .collect()
}

fn insert(store: &mut Store, record: Option<&Value>) -> StoredRecord {
    let fields = record
        .and_then(Value::as_object)
        .map(strip_system_fields)
        .unwrap_or_default();
    let stored = StoredRecord {
        id: store.next_id,
        revision: 1,
        fields,
    };
    store.next_id += 1;
    store.records.push(stored.clone());
    stored
}

async fn get_record(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    require_request_token(&headers, query_token(&query))?;
    require_app(query_u64(&query, "app"))?;
    let id = query_u64(&query, "id").ok_or_else(|| invalid("Missing or invalid input: id"))?;
    let store = db.read().await;
    let record = store.records.iter().find(|r| r.id == id).ok_or_else(|| not_found(id))?;
    Ok(Json(json!({ "record": record.to_json() })).into_response())
}

async fn add_record(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    require_request_token(&headers, body_token(&body))?;
    require_app(as_u64(body.get("app")))?;
    let stored = insert(&mut *db.write().await, body.get("record"));
    let body = json!({ "id": stored.id.to_string(), "revision": stored.revision.to_string() });
    Ok(Json(body).into_response())
}

async fn update_record(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    require_request_token(&headers, body_token(&body))?;
    require_app(as_u64(body.get("app")))?;
    let id = as_u64(body.get("id")).ok_or_else(|| invalid("Missing or invalid input: id"))?;
    let mut store = db.write().await;
    let record = store.records.iter_mut().find(|r| r.id == id).ok_or_else(|| not_found(id))?;
    if let Some(expected) = as_u64(body.get("revision")) {
        if expected != record.revision {
            return Err(kintone_error(
                StatusCode::CONFLICT,
                "GAIA_CO02",
                "The revision is not the latest.",
            ));
        }
    }
    if let Some(fields) = body.get("record").and_then(Value::as_object) {
        record.fields.extend(strip_system_fields(fields));
    }
    record.revision += 1;
    Ok(Json(json!({ "revision": record.revision.to_string() })).into_response())
}

async fn get_records(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    require_request_token(&headers, query_token(&query))?;
    require_app(query_u64(&query, "app"))?;
    let kintone_query = query.get("query").map(String::as_str).unwrap_or("");
    let (limit, offset) = limit_offset(kintone_query);
    if limit > 500 {
        return Err(invalid("limit must be 500 or less."));
    }
    if offset > 10_000 {
        return Err(invalid("offset must be 10000 or less."));
    }
    let after = id_after(kintone_query).unwrap_or(0);
    let fields = indexed_values(&query, "fields");
    let store = db.read().await;
    let records: Vec<Value> = store
        .records
        .iter()
        .filter(|r| r.id > after)
        .skip(offset)
        .take(limit)
        .map(|r| {
            let mut record = r.to_json();
            if !fields.is_empty() {
                if let Some(map) = record.as_object_mut() {
                    map.retain(|code, _| fields.contains(code));
                }
            }
            record
        })
        .collect();
    let total_count = match query.get("totalCount").map(String::as_str) {
        Some("true") => Value::String(store.records.len().to_string()),
        _ => Value::Null,
    };
    Ok(Json(json!({ "records": records, "totalCount": total_count })).into_response())
}

async fn add_records(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    require_request_token(&headers, body_token(&body))?;
    require_app(as_u64(body.get("app")))?;
    let records = body
        .get("records")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("Missing or invalid input: records"))?;
    if records.len() > 100 {
        return Err(invalid("records must be 100 or less."));
    }
    let mut store = db.write().await;
    let stored: Vec<StoredRecord> = records.iter().map(|r| insert(&mut store, Some(r))).collect();
    Ok(Json(json!({
        "ids": stored.iter().map(|r| r.id.to_string()).collect::<Vec<_>>(),
        "revisions": stored.iter().map(|r| r.revision.to_string()).collect::<Vec<_>>(),
    }))
    .into_response())
}

async fn delete_records(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    require_request_token(&headers, query_token(&query))?;
    require_app(query_u64(&query, "app"))?;
    let ids: Vec<u64> = indexed_values(&query, "ids")
        .iter()
        .filter_map(|v| v.parse().ok())
        .collect();
    let mut store = db.write().await;
    if let Some(missing) = ids.iter().find(|id| !store.records.iter().any(|r| r.id == **id)) {
        return Err(not_found(*missing));
    }
    store.records.retain(|r| !ids.contains(&r.id));
    Ok(Json(json!({})).into_response())
}

async fn get_app(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> ApiResult {
    require_request_token(&headers, query_token(&query))?;
    require_app(query_u64(&query, "id"))?;
    Ok(Json(json!({
        "appId": APP_ID.to_string(),
        "code": "MOCK",
        "name": "Mock app",
        "description": "",
        "spaceId": null,
        "threadId": null,
        "createdAt": "2020-01-01T00:00:00.000Z",
        "creator": { "code": USERNAME, "name": "Mock User" },
        "modifiedAt": "2020-01-01T00:00:00.000Z",
        "modifier": { "code": USERNAME, "name": "Mock User" }
    }))
    .into_response())
}

async fn get_form_fields(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult {
    require_request_token(&headers, query_token(&query))?;
    require_app(query_u64(&query, "app"))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], FIELDS_JSON).into_response())
}
