//! Buyer lead entity model, filter/query DTOs, and mutation outcomes.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use leadbook_core::diff::FieldDiff;
use leadbook_core::types::{DbId, LeadId, Timestamp};
use leadbook_core::validation::ValidatedBuyer;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A buyer lead row. `updated_at` doubles as the optimistic-concurrency
/// token: clients echo it back on update and any mismatch is a conflict.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Buyer {
    pub id: LeadId,
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
    pub owner_id: DbId,
    pub updated_at: Timestamp,
}

impl Buyer {
    /// Project the tracked field values out of the row for diffing against a
    /// proposed replacement.
    pub fn field_values(&self) -> ValidatedBuyer {
        ValidatedBuyer {
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            city: self.city.clone(),
            property_type: self.property_type.clone(),
            bhk: self.bhk.clone(),
            purpose: self.purpose.clone(),
            budget_min: self.budget_min,
            budget_max: self.budget_max,
            timeline: self.timeline.clone(),
            source: self.source.clone(),
            status: self.status.clone(),
            notes: self.notes.clone(),
            tags: self.tags.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Filters & pagination
// ---------------------------------------------------------------------------

/// Filter parameters shared by listing and export.
///
/// `search` is a case-insensitive substring match over full_name, email, and
/// phone (OR); the exact-match filters are ANDed together.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuyerFilter {
    pub search: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub status: Option<String>,
    pub timeline: Option<String>,
}

/// One listing entry: the lead plus whether the requesting principal may
/// mutate it.
#[derive(Debug, Clone, Serialize)]
pub struct BuyerListItem {
    #[serde(flatten)]
    pub buyer: Buyer,
    pub can_edit: bool,
}

/// Paginated listing response.
#[derive(Debug, Clone, Serialize)]
pub struct BuyerPage {
    pub items: Vec<BuyerListItem>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

// ---------------------------------------------------------------------------
// Mutation outcomes
// ---------------------------------------------------------------------------

/// Outcome of the guarded update path. The expected failure gates are data,
/// not errors: callers translate them into their own error taxonomy.
#[derive(Debug)]
pub enum BuyerUpdateOutcome {
    /// No lead with the given id.
    NotFound,
    /// The principal does not own the lead.
    Forbidden,
    /// The supplied `updated_at` token no longer matches the stored row.
    Conflict,
    /// Validation passed but every tracked field was unchanged; nothing was
    /// written and no history entry was created.
    NoChanges(Box<Buyer>),
    /// The row was updated and a history entry recorded the diff.
    Updated {
        buyer: Box<Buyer>,
        diff: FieldDiff,
    },
}

/// Outcome of the guarded status-only update.
#[derive(Debug)]
pub enum BuyerStatusOutcome {
    NotFound,
    Forbidden,
    Updated(Box<Buyer>),
}

/// Outcome of the guarded delete.
#[derive(Debug)]
pub enum BuyerDeleteOutcome {
    NotFound,
    Forbidden,
    Deleted,
}
