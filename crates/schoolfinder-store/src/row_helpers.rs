use schoolfinder_core::School;

use crate::error::StoreError;

/// Decode a JSON `School` payload column.
pub fn parse_school(raw: &str, table: &'static str, column: &'static str) -> Result<School, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: format!("invalid school JSON: {e}"),
    })
}

/// Escape LIKE special characters for safe pattern matching.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `%term%` pattern for a case-insensitive `LIKE ... ESCAPE '\'`.
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(&term.trim().to_lowercase()))
}
