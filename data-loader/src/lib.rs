//! CSV export and import for kintone apps.
//!
//! [`header`] derives CSV columns from a form schema, [`printer`] and
//! [`parser`] convert between records and CSV text, and [`commands`] ties them
//! to a [`kintone_core::KintoneRestApiClient`].

pub mod cli;
pub mod commands;
pub mod constants;
pub mod error;
pub mod header;
pub mod parser;
pub mod printer;
pub mod transport;

pub use commands::{export_records, import_records, IMPORT_CHUNK_SIZE};
pub use constants::{MULTI_VALUE_SEPARATOR, PRIMARY_MARK, RECORD_INDEX};
pub use error::{CsvError, LoaderError};
pub use header::{build_header_columns, build_header_fields, HeaderField};
pub use parser::{group_by_index, parse_csv, read_csv_records, CsvRecord, RecordGroups};
pub use printer::print_as_csv;
pub use transport::UreqTransport;
