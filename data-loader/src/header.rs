//! CSV header columns derived from an app's field schema.

use kintone_core::{FieldProperty, FieldsJson};

use crate::constants::PRIMARY_MARK;

/// One CSV column and where its value lives in a record.
#[derive(Debug, Clone, Copy)]
pub enum HeaderField<'a> {
    /// A top-level field.
    Field(&'a FieldProperty),
    /// A field inside a subtable row.
    SubtableField {
        subtable: &'a FieldProperty,
        field: &'a FieldProperty,
    },
}

impl HeaderField<'_> {
    pub fn code(&self) -> &str {
        match self {
            HeaderField::Field(field) | HeaderField::SubtableField { field, .. } => &field.code,
        }
    }
}

/// Columns in schema order. Subtables are replaced by their children (one
/// level only) and the primary marker is dropped wherever it appears.
pub fn build_header_columns(fields: &FieldsJson) -> Vec<HeaderField<'_>> {
    let mut columns = Vec::new();
    for property in fields.properties.iter().filter(|p| p.code != PRIMARY_MARK) {
        match property.subtable_fields() {
            Some(children) => columns.extend(
                children
                    .iter()
                    .filter(|child| child.code != PRIMARY_MARK)
                    .map(|child| HeaderField::SubtableField {
                        subtable: property,
                        field: child,
                    }),
            ),
            None => columns.push(HeaderField::Field(property)),
        }
    }
    columns
}

/// The CSV header row: field codes in schema order.
pub fn build_header_fields(fields: &FieldsJson) -> Vec<String> {
    build_header_columns(fields)
        .iter()
        .map(|column| column.code().to_string())
        .collect()
}
