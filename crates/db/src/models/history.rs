//! Buyer history entity model.
//!
//! History rows are immutable once created: the table is an append-only
//! audit trail and has no update or delete operations anywhere in the
//! repository layer.

use serde::Serialize;
use sqlx::FromRow;

use leadbook_core::types::{DbId, LeadId, Timestamp};

/// One audit entry: the field-level diff of a single successful mutation.
///
/// `diff` maps field name to `{ "old": ..., "new": ... }`; on creation `old`
/// is null for every field written.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BuyerHistory {
    pub id: LeadId,
    pub buyer_id: LeadId,
    pub changed_by: DbId,
    pub changed_at: Timestamp,
    pub diff: serde_json::Value,
}
