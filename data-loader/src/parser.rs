//! Read CSV produced by [`crate::printer`] (or by hand) back into records.

use std::collections::{HashMap, HashSet};

use kintone_core::{FieldProperties, FieldProperty, FieldType, FieldsJson, Record};
use serde_json::{json, Value};
use tracing::warn;

use crate::constants::{MULTI_VALUE_SEPARATOR, PRIMARY_MARK, RECORD_INDEX};
use crate::error::CsvError;

/// One CSV row keyed by header.
pub type CsvRecord = HashMap<String, String>;

/// CSV rows bucketed by their `RECORD_INDEX` value.
///
/// Keys keep the order in which they were first seen and every bucket keeps
/// the input order of its rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordGroups {
    groups: Vec<(String, Vec<CsvRecord>)>,
    positions: HashMap<String, usize>,
}

impl RecordGroups {
    fn push(&mut self, key: String, record: CsvRecord) {
        match self.positions.get(&key) {
            Some(&position) => self.groups[position].1.push(record),
            None => {
                self.positions.insert(key.clone(), self.groups.len());
                self.groups.push((key, vec![record]));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[CsvRecord]> {
        self.positions.get(key).map(|&position| self.groups[position].1.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CsvRecord])> {
        self.groups.iter().map(|(key, rows)| (key.as_str(), rows.as_slice()))
    }

    /// Concatenate the buckets in key order.
    pub fn into_records(self) -> Vec<CsvRecord> {
        self.groups.into_iter().flat_map(|(_, rows)| rows).collect()
    }
}

impl IntoIterator for RecordGroups {
    type Item = (String, Vec<CsvRecord>);
    type IntoIter = std::vec::IntoIter<(String, Vec<CsvRecord>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Group rows by their `RECORD_INDEX` value.
///
/// Every row must carry the column; an empty value is a key like any other.
pub fn group_by_index(records: Vec<CsvRecord>) -> Result<RecordGroups, CsvError> {
    let mut groups = RecordGroups::default();
    for (row, record) in records.into_iter().enumerate() {
        let key = record
            .get(RECORD_INDEX)
            .cloned()
            .ok_or(CsvError::MissingIndex { row: row + 1 })?;
        groups.push(key, record);
    }
    Ok(groups)
}

/// Read CSV text into header-keyed rows. Blank lines are skipped and ragged
/// rows are an error.
pub fn read_csv_records(text: &str) -> Result<Vec<CsvRecord>, CsvError> {
    let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());
    let records = reader.deserialize().collect::<Result<Vec<CsvRecord>, _>>()?;
    Ok(records)
}

/// Parse CSV text into records shaped for `add_records`.
///
/// Rows sharing a `RECORD_INDEX` value form one record; without that column
/// every row is its own record. Top-level values come from the first row of
/// a group, subtable rows from every row with a non-empty subtable cell.
pub fn parse_csv(text: &str, fields: &FieldsJson) -> Result<Vec<Record>, CsvError> {
    let rows = read_csv_records(text)?;
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    warn_unknown_columns(first, fields);

    let groups = if first.contains_key(RECORD_INDEX) {
        group_by_index(rows)?
    } else {
        let mut groups = RecordGroups::default();
        for (row, record) in rows.into_iter().enumerate() {
            groups.push(row.to_string(), record);
        }
        groups
    };

    Ok(groups.iter().map(|(_, rows)| build_record(rows, &fields.properties)).collect())
}

fn warn_unknown_columns(row: &CsvRecord, fields: &FieldsJson) {
    let known: HashSet<&str> = fields
        .properties
        .iter()
        .flat_map(|property| match property.subtable_fields() {
            Some(children) => children.iter().map(|child| child.code.as_str()).collect::<Vec<_>>(),
            None => vec![property.code.as_str()],
        })
        .chain([RECORD_INDEX])
        .collect();
    let mut unknown: Vec<&str> = row
        .keys()
        .map(String::as_str)
        .filter(|column| !known.contains(column))
        .collect();
    if !unknown.is_empty() {
        unknown.sort_unstable();
        warn!(columns = ?unknown, "ignoring CSV columns that are not in the form schema");
    }
}

fn build_record(rows: &[CsvRecord], properties: &FieldProperties) -> Record {
    let mut record = Record::new();
    let Some(first) = rows.first() else {
        return record;
    };
    for property in properties.iter().filter(|p| p.code != PRIMARY_MARK) {
        match property.subtable_fields() {
            Some(children) => {
                let table: Vec<Value> = rows
                    .iter()
                    .filter_map(|row| subtable_row(row, children))
                    .map(|value| json!({ "value": value }))
                    .collect();
                record.insert(property.code.clone(), json!({ "value": table }));
            }
            None => {
                if let Some(value) = importable_value(property, first) {
                    record.insert(property.code.clone(), json!({ "value": value }));
                }
            }
        }
    }
    record
}

/// The subtable row a CSV row carries, or `None` when all its importable cells
/// are empty.
fn subtable_row(row: &CsvRecord, children: &FieldProperties) -> Option<Record> {
    let has_cells = children
        .iter()
        .filter(|child| child.field_type.is_importable())
        .any(|child| row.get(&child.code).is_some_and(|cell| !cell.is_empty()));
    if !has_cells {
        return None;
    }
    let mut value = Record::new();
    for child in children.iter().filter(|c| c.code != PRIMARY_MARK) {
        if let Some(cell) = importable_value(child, row) {
            value.insert(child.code.clone(), json!({ "value": cell }));
        }
    }
    Some(value)
}

fn importable_value(property: &FieldProperty, row: &CsvRecord) -> Option<Value> {
    if !property.field_type.is_importable() {
        return None;
    }
    row.get(&property.code)
        .and_then(|cell| field_value(property.field_type, cell))
}

/// Typed JSON value for a cell. `None` leaves the field out of the record.
pub fn field_value(field_type: FieldType, cell: &str) -> Option<Value> {
    let items = || cell.split(MULTI_VALUE_SEPARATOR).filter(|item| !item.is_empty());
    let value = match field_type {
        FieldType::CheckBox | FieldType::MultiSelect => Value::from(items().collect::<Vec<_>>()),
        FieldType::UserSelect | FieldType::OrganizationSelect | FieldType::GroupSelect => {
            items().map(|code| json!({ "code": code })).collect()
        }
        FieldType::Creator | FieldType::Modifier => {
            if cell.is_empty() {
                return None;
            }
            json!({ "code": cell })
        }
        _ => Value::from(cell),
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> CsvRecord {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn schema(json: &str) -> FieldsJson {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn groups_by_index_in_first_seen_order() {
        let x = row(&[(RECORD_INDEX, "1"), ("a", "x")]);
        let y = row(&[(RECORD_INDEX, "2"), ("a", "y")]);
        let z = row(&[(RECORD_INDEX, "1"), ("a", "z")]);

        let groups = group_by_index(vec![x.clone(), y.clone(), z.clone()]).unwrap();
        assert_eq!(groups.keys().collect::<Vec<_>>(), ["1", "2"]);
        assert_eq!(groups.get("1").unwrap(), [x.clone(), z.clone()]);
        assert_eq!(groups.get("2").unwrap(), [y.clone()]);
        assert_eq!(groups.into_records(), [x, z, y]);
    }

    #[test]
    fn flattening_is_a_stable_permutation() {
        let input: Vec<CsvRecord> = ["b", "a", "b", "c", "a", "b"]
            .into_iter()
            .enumerate()
            .map(|(n, key)| {
                let n = n.to_string();
                row(&[(RECORD_INDEX, key), ("n", n.as_str())])
            })
            .collect();

        let flattened = group_by_index(input.clone()).unwrap().into_records();
        assert_eq!(flattened.len(), input.len());

        let order: Vec<&str> = flattened.iter().map(|r| r["n"].as_str()).collect();
        assert_eq!(order, ["0", "2", "5", "1", "4", "3"]);

        // Grouping an already grouped sequence changes nothing.
        let again = group_by_index(flattened.clone()).unwrap().into_records();
        assert_eq!(again, flattened);
    }

    #[test]
    fn empty_index_is_a_key() {
        let rows = vec![row(&[(RECORD_INDEX, "")]), row(&[(RECORD_INDEX, "")])];
        let groups = group_by_index(rows).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get("").unwrap().len(), 2);
    }

    #[test]
    fn missing_index_is_an_error() {
        let rows = vec![row(&[(RECORD_INDEX, "1")]), row(&[("a", "x")])];
        let err = group_by_index(rows).unwrap_err();
        assert!(matches!(err, CsvError::MissingIndex { row: 2 }));
    }

    #[test]
    fn empty_input_has_no_groups() {
        let groups = group_by_index(Vec::new()).unwrap();
        assert!(groups.is_empty());
        assert!(groups.into_records().is_empty());
    }

    #[test]
    fn parses_typed_values() {
        let fields = schema(
            r#"{"properties":{
                "$id":{"type":"__ID__","code":"$id"},
                "name":{"type":"SINGLE_LINE_TEXT","code":"name"},
                "tags":{"type":"CHECK_BOX","code":"tags"},
                "owner":{"type":"USER_SELECT","code":"owner"},
                "creator":{"type":"CREATOR","code":"creator"},
                "total":{"type":"CALC","code":"total"}
            }}"#,
        );
        let text = "$id,name,tags,owner,creator,total\n7,Alice,\"a\nb\",\"u1\nu2\",boss,42\n";

        let records = parse_csv(text, &fields).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert!(!record.contains_key("$id"));
        assert!(!record.contains_key("total"));
        assert_eq!(record["name"], json!({ "value": "Alice" }));
        assert_eq!(record["tags"], json!({ "value": ["a", "b"] }));
        assert_eq!(record["owner"], json!({ "value": [{ "code": "u1" }, { "code": "u2" }] }));
        assert_eq!(record["creator"], json!({ "value": { "code": "boss" } }));
    }

    #[test]
    fn rows_sharing_an_index_rebuild_subtables() {
        let fields = schema(
            r#"{"properties":{
                "title":{"type":"SINGLE_LINE_TEXT","code":"title"},
                "items":{"type":"SUBTABLE","code":"items","fields":{
                    "item":{"type":"SINGLE_LINE_TEXT","code":"item"},
                    "qty":{"type":"NUMBER","code":"qty"}
                }}
            }}"#,
        );
        let text = "__RECORD_INDEX__,title,item,qty\n0,Order,pen,2\n0,ignored,ink,5\n1,Empty,,\n";

        let records = parse_csv(text, &fields).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["title"], json!({ "value": "Order" }));
        assert_eq!(
            records[0]["items"],
            json!({ "value": [
                { "value": { "item": { "value": "pen" }, "qty": { "value": "2" } } },
                { "value": { "item": { "value": "ink" }, "qty": { "value": "5" } } }
            ] })
        );
        assert_eq!(records[1]["title"], json!({ "value": "Empty" }));
        assert_eq!(records[1]["items"], json!({ "value": [] }));
    }

    #[test]
    fn rows_with_only_read_only_subtable_cells_are_dropped() {
        let fields = schema(
            r#"{"properties":{
                "title":{"type":"SINGLE_LINE_TEXT","code":"title"},
                "items":{"type":"SUBTABLE","code":"items","fields":{
                    "item":{"type":"SINGLE_LINE_TEXT","code":"item"},
                    "subtotal":{"type":"CALC","code":"subtotal"},
                    "receipt":{"type":"FILE","code":"receipt"}
                }}
            }}"#,
        );
        let text = "__RECORD_INDEX__,title,item,subtotal,receipt
                    0,Order,pen,10,
                    0,Order,,20,scan.pdf
";

        let records = parse_csv(text, &fields).unwrap();
        assert_eq!(
            records[0]["items"],
            json!({ "value": [{ "value": { "item": { "value": "pen" } } }] })
        );
    }

    #[test]
    fn without_index_column_each_row_is_a_record() {
        let fields = schema(r#"{"properties":{"name":{"type":"SINGLE_LINE_TEXT","code":"name"}}}"#);
        let records = parse_csv("name\nA\nB\n", &fields).unwrap();
        let names: Vec<&Value> = records.iter().map(|r| &r["name"]["value"]).collect();
        assert_eq!(names, [&json!("A"), &json!("B")]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let fields = schema(r#"{"properties":{"name":{"type":"SINGLE_LINE_TEXT","code":"name"}}}"#);
        let err = parse_csv("name\nA,extra\n", &fields).unwrap_err();
        assert!(matches!(err, CsvError::Csv(_)));
    }

    #[test]
    fn header_only_csv_has_no_records() {
        let fields = schema(r#"{"properties":{"name":{"type":"SINGLE_LINE_TEXT","code":"name"}}}"#);
        assert!(parse_csv("name\n", &fields).unwrap().is_empty());
    }

    #[test]
    fn empty_multi_value_cell_is_an_empty_array() {
        assert_eq!(field_value(FieldType::CheckBox, ""), Some(json!([])));
        assert_eq!(field_value(FieldType::GroupSelect, ""), Some(json!([])));
        assert_eq!(field_value(FieldType::Modifier, ""), None);
        assert_eq!(field_value(FieldType::Number, ""), Some(json!("")));
    }
}
