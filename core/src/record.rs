//! Record endpoints: single and bulk CRUD plus paged retrieval of every
//! matching record.

use std::sync::Arc;

use tracing::debug;

use crate::client::HttpClient;
use crate::error::ApiError;
use crate::http::Transport;
use crate::types::{
    AddRecordParams, AddRecordResponse, AddRecordsParams, AddRecordsResponse,
    DeleteRecordsParams, DeleteRecordsResponse, GetAllRecordsParams, GetRecordParams,
    GetRecordResponse, GetRecordsParams, GetRecordsResponse, Record, UpdateRecordParams,
    UpdateRecordResponse, UpdateRecordsParams, UpdateRecordsResponse,
};

/// kintone caps `limit` at 500 records per request.
pub const MAX_RECORDS_PER_PAGE: usize = 500;

const ID_FIELD: &str = "$id";

/// Typed access to the `record.json` and `records.json` endpoints.
#[derive(Debug)]
pub struct RecordClient<T> {
    client: Arc<HttpClient<T>>,
}

impl<T: Transport> RecordClient<T> {
    pub fn new(client: Arc<HttpClient<T>>) -> Self {
        Self { client }
    }

    pub fn http(&self) -> &HttpClient<T> {
        &self.client
    }

    pub async fn get_record(
        &self,
        params: &GetRecordParams,
    ) -> Result<GetRecordResponse, ApiError> {
        let path = self.client.path("record", false);
        self.client.get(&path, params).await
    }

    pub async fn add_record(
        &self,
        params: &AddRecordParams,
    ) -> Result<AddRecordResponse, ApiError> {
        let path = self.client.path("record", false);
        self.client.post(&path, params).await
    }

    pub async fn update_record(
        &self,
        params: &UpdateRecordParams,
    ) -> Result<UpdateRecordResponse, ApiError> {
        let path = self.client.path("record", false);
        self.client.put(&path, params).await
    }

    pub async fn get_records(
        &self,
        params: &GetRecordsParams,
    ) -> Result<GetRecordsResponse, ApiError> {
        let path = self.client.path("records", false);
        self.client.get(&path, params).await
    }

    pub async fn add_records(
        &self,
        params: &AddRecordsParams,
    ) -> Result<AddRecordsResponse, ApiError> {
        let path = self.client.path("records", false);
        self.client.post(&path, params).await
    }

    pub async fn update_records(
        &self,
        params: &UpdateRecordsParams,
    ) -> Result<UpdateRecordsResponse, ApiError> {
        let path = self.client.path("records", false);
        self.client.put(&path, params).await
    }

    pub async fn delete_records(
        &self,
        params: &DeleteRecordsParams,
    ) -> Result<DeleteRecordsResponse, ApiError> {
        let path = self.client.path("records", false);
        self.client.delete(&path, params).await
    }

    /// Fetch every record matching `condition`.
    ///
    /// Without `order_by` the pages are walked with a `$id` cursor, which has
    /// no depth limit. With `order_by` the pages are walked by offset, which
    /// kintone stops accepting past 10,000.
    pub async fn get_all_records(
        &self,
        params: &GetAllRecordsParams,
    ) -> Result<Vec<Record>, ApiError> {
        match non_blank(params.order_by.as_deref()) {
            Some(_) => self.get_all_records_by_offset(params).await,
            None => self.get_all_records_by_id(params).await,
        }
    }

    async fn get_all_records_by_id(
        &self,
        params: &GetAllRecordsParams,
    ) -> Result<Vec<Record>, ApiError> {
        // The cursor needs `$id` in every record.
        let fields = params.fields.clone().map(|mut fields| {
            if !fields.iter().any(|f| f == ID_FIELD) {
                fields.push(ID_FIELD.to_string());
            }
            fields
        });
        let mut records = Vec::new();
        let mut last_id = 0;
        loop {
            let page = GetRecordsParams {
                app: params.app,
                fields: fields.clone(),
                query: Some(id_cursor_query(params, last_id)),
                total_count: None,
            };
            let response = self.get_records(&page).await?;
            let fetched = response.records.len();
            if let Some(last) = response.records.last() {
                last_id = record_id(last)?;
            }
            records.extend(response.records);
            debug!(
                app = params.app,
                fetched,
                last_id,
                total = records.len(),
                "fetched record page"
            );
            if fetched < MAX_RECORDS_PER_PAGE {
                return Ok(records);
            }
        }
    }

    async fn get_all_records_by_offset(
        &self,
        params: &GetAllRecordsParams,
    ) -> Result<Vec<Record>, ApiError> {
        let mut records = Vec::new();
        loop {
            let page = GetRecordsParams {
                app: params.app,
                fields: params.fields.clone(),
                query: Some(offset_query(params, records.len())),
                total_count: None,
            };
            let response = self.get_records(&page).await?;
            let fetched = response.records.len();
            records.extend(response.records);
            debug!(app = params.app, fetched, total = records.len(), "fetched record page");
            if fetched < MAX_RECORDS_PER_PAGE {
                return Ok(records);
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn record_id(record: &Record) -> Result<u64, ApiError> {
    record
        .get(ID_FIELD)
        .and_then(|field| field["value"].as_str())
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| ApiError::Deserialization(format!("record without a numeric `{ID_FIELD}`")))
}

fn id_cursor_query(params: &GetAllRecordsParams, last_id: u64) -> String {
    let cursor = format!("{ID_FIELD} > {last_id}");
    let condition = match non_blank(params.condition.as_deref()) {
        Some(condition) => format!("({condition}) and {cursor}"),
        None => cursor,
    };
    format!("{condition} order by {ID_FIELD} asc limit {MAX_RECORDS_PER_PAGE}")
}

fn offset_query(params: &GetAllRecordsParams, offset: usize) -> String {
    let mut query = String::new();
    if let Some(condition) = non_blank(params.condition.as_deref()) {
        query.push_str(condition);
        query.push(' ');
    }
    if let Some(order_by) = non_blank(params.order_by.as_deref()) {
        query.push_str("order by ");
        query.push_str(order_by);
        query.push(' ');
    }
    query.push_str(&format!("limit {MAX_RECORDS_PER_PAGE} offset {offset}"));
    query
}
