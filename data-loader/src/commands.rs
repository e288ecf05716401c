//! Export and import between a kintone app and CSV text.

use kintone_core::types::{AddRecordsParams, AppId, GetAllRecordsParams, GetFormFieldsParams};
use kintone_core::{KintoneRestApiClient, Transport};
use tracing::{debug, info, warn};

use crate::error::LoaderError;
use crate::parser::parse_csv;
use crate::printer::print_as_csv;

/// Most records kintone accepts in one `add_records` call.
pub const IMPORT_CHUNK_SIZE: usize = 100;

/// Fetch every record matching `condition` and print them as CSV.
pub async fn export_records<T: Transport>(
    client: &KintoneRestApiClient<T>,
    app: AppId,
    condition: Option<String>,
) -> Result<String, LoaderError> {
    let fields = client
        .app
        .get_form_fields(&GetFormFieldsParams { app, lang: None }, false)
        .await?;
    let records = client
        .record
        .get_all_records(&GetAllRecordsParams {
            app,
            fields: None,
            condition,
            order_by: None,
        })
        .await?;
    info!(app, records = records.len(), "exporting records");
    Ok(print_as_csv(&records, &fields)?)
}

/// Parse `csv` against the app's schema and add the records. Returns how
/// many were added.
///
/// Uploads run in chunks of [`IMPORT_CHUNK_SIZE`]. A chunk that fails after
/// others went through yields [`LoaderError::PartialImport`] with the count
/// already stored.
pub async fn import_records<T: Transport>(
    client: &KintoneRestApiClient<T>,
    app: AppId,
    csv: &str,
) -> Result<usize, LoaderError> {
    let fields = client
        .app
        .get_form_fields(&GetFormFieldsParams { app, lang: None }, false)
        .await?;
    let records = parse_csv(csv, &fields)?;

    let mut added = 0;
    for chunk in records.chunks(IMPORT_CHUNK_SIZE) {
        let params = AddRecordsParams {
            app,
            records: chunk.to_vec(),
        };
        let response = match client.record.add_records(&params).await {
            Ok(response) => response,
            Err(source) if added > 0 => {
                warn!(app, added, error = %source, "import stopped partway");
                return Err(LoaderError::PartialImport { added, source });
            }
            Err(err) => return Err(err.into()),
        };
        added += response.ids.len();
        debug!(added, total = records.len(), "uploaded chunk");
    }
    info!(app, added, "imported records");
    Ok(added)
}
