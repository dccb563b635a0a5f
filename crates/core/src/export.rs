//! CSV export helpers for the lead export endpoint.
//!
//! The export column set is fixed; rows are built by hand (no CSV crate)
//! with minimal RFC 4180 escaping, since notes and tags can contain commas,
//! quotes, or newlines.

/// Fixed export column set, in output order.
pub const EXPORT_COLUMNS: &[&str] = &[
    "id",
    "full_name",
    "email",
    "phone",
    "city",
    "property_type",
    "bhk",
    "purpose",
    "budget_min",
    "budget_max",
    "timeline",
    "source",
    "status",
    "tags",
    "owner_id",
    "updated_at",
];

/// The CSV header line (with trailing newline).
pub fn header_line() -> String {
    let mut line = EXPORT_COLUMNS.join(",");
    line.push('\n');
    line
}

/// Escape a single CSV field: quote it if it contains a comma, quote, or
/// newline, doubling any embedded quotes.
pub fn escape_field(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Build one CSV row (with trailing newline) from pre-rendered field values.
pub fn row_line(fields: &[String]) -> String {
    let mut line = fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}
