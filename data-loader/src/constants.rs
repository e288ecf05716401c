//! Reserved names of the kintone CSV layout.

/// Reserved field code of the relation-to-subtable column. Never emitted
/// as a CSV header, at any nesting level.
pub const PRIMARY_MARK: &str = "*";

/// Reserved column that ties the flattened rows of one record together.
pub const RECORD_INDEX: &str = "__RECORD_INDEX__";

/// Joins multi-value cells (check boxes, user selections, files).
pub const MULTI_VALUE_SEPARATOR: &str = "\n";
