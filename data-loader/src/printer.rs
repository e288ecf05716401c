//! Render kintone records as CSV.

use kintone_core::{FieldsJson, Record};
use serde_json::Value;

use crate::constants::{MULTI_VALUE_SEPARATOR, RECORD_INDEX};
use crate::error::CsvError;
use crate::header::{build_header_columns, HeaderField};

/// Print `records` as CSV with one column per header field.
///
/// A record with subtables spans as many rows as its longest subtable. Every
/// row of one record repeats the top-level cells and carries the same
/// `RECORD_INDEX` value, which is emitted only when the schema has a subtable.
pub fn print_as_csv(records: &[Record], fields: &FieldsJson) -> Result<String, CsvError> {
    let columns = build_header_columns(fields);
    let with_index = fields.has_subtable();

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut header: Vec<&str> = Vec::with_capacity(columns.len() + 1);
    if with_index {
        header.push(RECORD_INDEX);
    }
    header.extend(columns.iter().map(HeaderField::code));
    writer.write_record(&header)?;

    for (index, record) in records.iter().enumerate() {
        for row in record_rows(index, record, &columns, with_index) {
            writer.write_record(&row)?;
        }
    }

    let bytes = writer.into_inner().map_err(|e| CsvError::Write(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CsvError::Write(e.to_string()))
}

fn record_rows(
    index: usize,
    record: &Record,
    columns: &[HeaderField<'_>],
    with_index: bool,
) -> Vec<Vec<String>> {
    let row_count = columns
        .iter()
        .filter_map(|column| match column {
            HeaderField::SubtableField { subtable, .. } => {
                Some(subtable_rows(record, &subtable.code).len())
            }
            HeaderField::Field(_) => None,
        })
        .max()
        .unwrap_or(0)
        .max(1);

    (0..row_count)
        .map(|row| {
            let mut cells = Vec::with_capacity(columns.len() + 1);
            if with_index {
                cells.push(index.to_string());
            }
            cells.extend(columns.iter().map(|column| match column {
                HeaderField::Field(field) => record
                    .get(&field.code)
                    .map(|cell| cell_text(&cell["value"]))
                    .unwrap_or_default(),
                HeaderField::SubtableField { subtable, field } => {
                    subtable_rows(record, &subtable.code)
                        .get(row)
                        .and_then(|entry| entry["value"].get(&field.code))
                        .map(|cell| cell_text(&cell["value"]))
                        .unwrap_or_default()
                }
            }));
            cells
        })
        .collect()
}

fn subtable_rows<'r>(record: &'r Record, code: &str) -> &'r [Value] {
    record
        .get(code)
        .and_then(|field| field["value"].as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Text of one field value as it appears in a CSV cell.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(cell_text)
            .collect::<Vec<_>>()
            .join(MULTI_VALUE_SEPARATOR),
        // Entities carry a code, attached files a name.
        Value::Object(entity) => entity
            .get("code")
            .or_else(|| entity.get("name"))
            .map(cell_text)
            .unwrap_or_default(),
        other => other.to_string(),
    }
}
