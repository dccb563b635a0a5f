//! Field-level diff computation for buyer lead mutations.
//!
//! The tracked field list is a static enumeration of `(name, extractor)`
//! pairs evaluated in a fixed order, and diff maps serialize with a
//! deterministic key order, so two identical mutations always produce
//! byte-identical diffs. Scalars compare by value; `tags` compares as an
//! order-independent set, so a pure reordering of tags is not a change.

use serde_json::{json, Map, Value};

use crate::validation::ValidatedBuyer;

/// A diff entry value: the previous and new value of one field.
///
/// Serialized as `{ "old": ..., "new": ... }`; `old` is null for every field
/// in a creation diff.
pub type FieldDiff = Map<String, Value>;

type Extract = fn(&ValidatedBuyer) -> Value;

/// Tracked fields in fixed declaration order.
pub const TRACKED_FIELDS: &[(&str, Extract)] = &[
    ("full_name", |b| json!(b.full_name)),
    ("email", |b| json!(b.email)),
    ("phone", |b| json!(b.phone)),
    ("city", |b| json!(b.city)),
    ("property_type", |b| json!(b.property_type)),
    ("bhk", |b| json!(b.bhk)),
    ("purpose", |b| json!(b.purpose)),
    ("budget_min", |b| json!(b.budget_min)),
    ("budget_max", |b| json!(b.budget_max)),
    ("timeline", |b| json!(b.timeline)),
    ("source", |b| json!(b.source)),
    ("status", |b| json!(b.status)),
    ("notes", |b| json!(b.notes)),
    ("tags", |b| json!(b.tags)),
];

/// Compute the diff between the currently stored field values and a proposed
/// replacement. Only changed fields appear in the result.
pub fn update_diff(current: &ValidatedBuyer, proposed: &ValidatedBuyer) -> FieldDiff {
    let mut diff = Map::new();

    for (name, extract) in TRACKED_FIELDS {
        let old = extract(current);
        let new = extract(proposed);

        let changed = if *name == "tags" {
            !tags_equal(&current.tags, &proposed.tags)
        } else {
            old != new
        };

        if changed {
            diff.insert((*name).to_string(), json!({ "old": old, "new": new }));
        }
    }

    diff
}

/// Diff written for a freshly created lead: every field maps to
/// `{ old: null, new: value }`.
pub fn creation_diff(values: &ValidatedBuyer) -> FieldDiff {
    let mut diff = Map::new();
    for (name, extract) in TRACKED_FIELDS {
        diff.insert(
            (*name).to_string(),
            json!({ "old": Value::Null, "new": extract(values) }),
        );
    }
    diff
}

/// Order-independent tag comparison.
fn tags_equal(a: &[String], b: &[String]) -> bool {
    let mut a: Vec<&str> = a.iter().map(String::as_str).collect();
    let mut b: Vec<&str> = b.iter().map(String::as_str).collect();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
