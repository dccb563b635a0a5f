//! Buyer lead field value sets and bounds.
//!
//! This module lives in `core` (zero internal deps) so it can be used by both
//! the API/repository layer and any future import or CLI tooling. Enumerated
//! fields are stored as TEXT and validated against these fixed sets.

// ---------------------------------------------------------------------------
// Enumerated value sets
// ---------------------------------------------------------------------------

/// Valid values for the `city` field.
pub const CITIES: &[&str] = &["Chandigarh", "Mohali", "Zirakpur", "Panchkula", "Other"];

/// Valid values for the `property_type` field.
pub const PROPERTY_TYPES: &[&str] = &["Apartment", "Villa", "Plot", "Office", "Retail"];

/// Valid values for the `bhk` field.
pub const BHK_VALUES: &[&str] = &["1", "2", "3", "4", "Studio"];

/// Valid values for the `purpose` field.
pub const PURPOSES: &[&str] = &["Buy", "Rent"];

/// Valid values for the `timeline` field.
pub const TIMELINES: &[&str] = &["0-3m", "3-6m", ">6m", "Exploring"];

/// Valid values for the `source` field.
pub const SOURCES: &[&str] = &["Website", "Referral", "Walk-in", "Call", "Other"];

/// Valid values for the `status` field.
pub const STATUSES: &[&str] = &[
    "New",
    "Qualified",
    "Contacted",
    "Visited",
    "Negotiation",
    "Converted",
    "Dropped",
];

/// Status assigned to a lead when none is supplied at creation.
pub const DEFAULT_STATUS: &str = "New";

// ---------------------------------------------------------------------------
// Field bounds
// ---------------------------------------------------------------------------

/// Minimum length of `full_name`.
pub const FULL_NAME_MIN: usize = 2;

/// Maximum length of `full_name`.
pub const FULL_NAME_MAX: usize = 80;

/// Maximum length of `notes`.
pub const NOTES_MAX: usize = 1000;

/// Maximum number of rows accepted by a single bulk import call.
pub const IMPORT_MAX_ROWS: usize = 200;

/// Fixed page size for lead listings.
pub const PAGE_SIZE: i64 = 10;

// ---------------------------------------------------------------------------
// Membership helpers
// ---------------------------------------------------------------------------

/// Check whether a status value is one of the fixed set.
pub fn is_valid_status(status: &str) -> bool {
    STATUSES.contains(&status)
}

/// Whether `bhk` is mandatory for the given property type.
///
/// Residential types (Apartment, Villa) require a bhk value; for every other
/// property type the field must be absent.
pub fn bhk_required(property_type: &str) -> bool {
    matches!(property_type, "Apartment" | "Villa")
}
