//! Request and response DTOs for the record and app endpoints.
//!
//! Records stay untyped (`Record`), since their shape depends on each app's
//! field schema. Request structs serialize with kintone's camelCase names and
//! omit unset options.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record as kintone transfers it: field code → `{ "type", "value" }`.
pub type Record = Map<String, Value>;

pub type AppId = u64;
pub type RecordId = u64;

// ---------------------------------------------------------------------------
// Record requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GetRecordParams {
    pub app: AppId,
    pub id: RecordId,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddRecordParams {
    pub app: AppId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateKey {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordParams {
    pub app: AppId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_key: Option<UpdateKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
}

impl UpdateRecordParams {
    pub fn by_id(app: AppId, id: RecordId, record: Record) -> Self {
        Self {
            app,
            id: Some(id),
            update_key: None,
            record: Some(record),
            revision: None,
        }
    }

    pub fn by_update_key(
        app: AppId,
        field: impl Into<String>,
        value: impl Into<String>,
        record: Record,
    ) -> Self {
        Self {
            app,
            id: None,
            update_key: Some(UpdateKey {
                field: field.into(),
                value: value.into(),
            }),
            record: Some(record),
            revision: None,
        }
    }

    /// Fails on the server if the record has moved past `revision`.
    pub fn with_revision(mut self, revision: i64) -> Self {
        self.revision = Some(revision);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRecordsParams {
    pub app: AppId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddRecordsParams {
    pub app: AppId,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordsEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_key: Option<UpdateKey>,
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateRecordsParams {
    pub app: AppId,
    pub records: Vec<UpdateRecordsEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteRecordsParams {
    pub app: AppId,
    pub ids: Vec<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revisions: Option<Vec<i64>>,
}

/// Input for offset-paginated retrieval of every matching record.
#[derive(Debug, Clone, Default)]
pub struct GetAllRecordsParams {
    pub app: AppId,
    pub fields: Option<Vec<String>>,
    /// A kintone query without `limit`/`offset` clauses.
    pub condition: Option<String>,
    pub order_by: Option<String>,
}

// ---------------------------------------------------------------------------
// Record responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetRecordResponse {
    pub record: Record,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRecordsResponse {
    pub records: Vec<Record>,
    #[serde(default)]
    pub total_count: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddRecordResponse {
    pub id: String,
    pub revision: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateRecordResponse {
    pub revision: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddRecordsResponse {
    pub ids: Vec<String>,
    pub revisions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordRevision {
    pub id: String,
    pub revision: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateRecordsResponse {
    pub records: Vec<RecordRevision>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteRecordsResponse {}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GetAppParams {
    pub id: AppId,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAppsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<AppId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_ids: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Ja,
    En,
    Zh,
    User,
    Default,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetFormFieldsParams {
    pub app: AppId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<Lang>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetFormLayoutParams {
    pub app: AppId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Entity {
    pub code: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub app_id: String,
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub space_id: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub creator: Option<Entity>,
    #[serde(default)]
    pub modified_at: String,
    #[serde(default)]
    pub modifier: Option<Entity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GetAppsResponse {
    pub apps: Vec<App>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormLayout {
    pub layout: Vec<Value>,
    #[serde(default)]
    pub revision: String,
}
