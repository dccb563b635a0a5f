//! Buyer payload validation. Pure and deterministic, no I/O.
//!
//! [`validate_buyer`] checks a raw [`BuyerInput`] against every field and
//! cross-field rule at once, accumulating per-field errors instead of
//! stopping at the first violation. On success it returns a normalized
//! [`ValidatedBuyer`] ready for persistence.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::buyer;
use crate::error::FieldError;

/// Phone numbers are 10-15 ASCII digits, nothing else.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10,15}$").expect("valid regex"));

/// Minimal well-formedness check: local@domain with a dotted domain part.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Raw buyer payload as submitted by a client (create, update, or import row).
#[derive(Debug, Clone, Deserialize)]
pub struct BuyerInput {
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
    pub city: String,
    pub property_type: String,
    #[serde(default)]
    pub bhk: Option<String>,
    pub purpose: String,
    #[serde(default)]
    pub budget_min: Option<i64>,
    #[serde(default)]
    pub budget_max: Option<i64>,
    pub timeline: String,
    pub source: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A buyer payload that has passed validation and normalization.
///
/// Guarantees: all enumerated fields are members of their fixed sets, `bhk`
/// is present exactly when the property type requires it, budgets satisfy
/// `budget_max >= budget_min`, `status` is always set, and `tags` is a
/// deduplicated list of non-empty trimmed strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBuyer {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub city: String,
    pub property_type: String,
    pub bhk: Option<String>,
    pub purpose: String,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub timeline: String,
    pub source: String,
    pub status: String,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate and normalize a raw buyer payload.
///
/// Returns every rule violation at once so a form can surface all problems
/// in a single round trip. Deterministic and free of I/O.
pub fn validate_buyer(input: &BuyerInput) -> Result<ValidatedBuyer, Vec<FieldError>> {
    let mut errors: Vec<FieldError> = Vec::new();

    let name_len = input.full_name.chars().count();
    if name_len < buyer::FULL_NAME_MIN || name_len > buyer::FULL_NAME_MAX {
        errors.push(FieldError::new(
            "full_name",
            format!(
                "must be between {} and {} characters",
                buyer::FULL_NAME_MIN,
                buyer::FULL_NAME_MAX
            ),
        ));
    }

    if !PHONE_RE.is_match(&input.phone) {
        errors.push(FieldError::new("phone", "must be 10-15 digits"));
    }

    // An empty email string is treated as absent.
    let email = match input.email.as_deref() {
        None | Some("") => None,
        Some(e) if EMAIL_RE.is_match(e) => Some(e.to_string()),
        Some(_) => {
            errors.push(FieldError::new("email", "must be a valid email address"));
            None
        }
    };

    check_member(&mut errors, "city", &input.city, buyer::CITIES);
    check_member(
        &mut errors,
        "property_type",
        &input.property_type,
        buyer::PROPERTY_TYPES,
    );
    check_member(&mut errors, "purpose", &input.purpose, buyer::PURPOSES);
    check_member(&mut errors, "timeline", &input.timeline, buyer::TIMELINES);
    check_member(&mut errors, "source", &input.source, buyer::SOURCES);

    let status = match input.status.as_deref() {
        None | Some("") => buyer::DEFAULT_STATUS.to_string(),
        Some(s) if buyer::is_valid_status(s) => s.to_string(),
        Some(s) => {
            errors.push(FieldError::new(
                "status",
                format!("'{s}' is not a valid status"),
            ));
            buyer::DEFAULT_STATUS.to_string()
        }
    };

    // bhk is mandatory for residential property types and dropped otherwise.
    let bhk = match (&input.bhk, buyer::bhk_required(&input.property_type)) {
        (Some(b), _) if !buyer::BHK_VALUES.contains(&b.as_str()) => {
            errors.push(FieldError::new(
                "bhk",
                format!("'{b}' is not a valid bhk value"),
            ));
            None
        }
        (Some(b), true) => Some(b.clone()),
        (None, true) => {
            errors.push(FieldError::new("bhk", "required for Apartment/Villa"));
            None
        }
        (_, false) => None,
    };

    if let Some(min) = input.budget_min {
        if min <= 0 {
            errors.push(FieldError::new("budget_min", "must be a positive integer"));
        }
    }
    if let Some(max) = input.budget_max {
        if max <= 0 {
            errors.push(FieldError::new("budget_max", "must be a positive integer"));
        }
    }
    if let (Some(min), Some(max)) = (input.budget_min, input.budget_max) {
        if min > 0 && max > 0 && max < min {
            errors.push(FieldError::new(
                "budget_max",
                "must be greater than or equal to budget_min",
            ));
        }
    }

    if let Some(notes) = &input.notes {
        if notes.chars().count() > buyer::NOTES_MAX {
            errors.push(FieldError::new(
                "notes",
                format!("must be at most {} characters", buyer::NOTES_MAX),
            ));
        }
    }

    let tags = normalize_tags(&input.tags);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidatedBuyer {
        full_name: input.full_name.clone(),
        email,
        phone: input.phone.clone(),
        city: input.city.clone(),
        property_type: input.property_type.clone(),
        bhk,
        purpose: input.purpose.clone(),
        budget_min: input.budget_min,
        budget_max: input.budget_max,
        timeline: input.timeline.clone(),
        source: input.source.clone(),
        status,
        notes: input.notes.clone().filter(|n| !n.is_empty()),
        tags,
    })
}

fn check_member(errors: &mut Vec<FieldError>, field: &'static str, value: &str, set: &[&str]) {
    if !set.contains(&value) {
        errors.push(FieldError::new(field, format!("'{value}' is not a valid {field}")));
    }
}

/// Trim tags, drop empties, and deduplicate preserving first occurrence.
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !seen.iter().any(|t| t == trimmed) {
            seen.push(trimmed.to_string());
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
