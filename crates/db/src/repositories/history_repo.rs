//! Repository for the `buyer_history` table.
//!
//! Append-only: entries are inserted inside the same transaction as the
//! buyer mutation they describe and are never updated or deleted.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use leadbook_core::diff::FieldDiff;
use leadbook_core::types::{DbId, LeadId};

use crate::models::history::BuyerHistory;

/// Column list for buyer_history queries.
const COLUMNS: &str = "id, buyer_id, changed_by, changed_at, diff";

/// Provides insert and query operations for the buyer change log.
pub struct BuyerHistoryRepo;

impl BuyerHistoryRepo {
    /// Append one history entry.
    ///
    /// Takes a connection (not a pool) so the insert joins the caller's
    /// transaction; `changed_at` uses the transaction timestamp and therefore
    /// matches the `updated_at` written by the same transaction.
    pub async fn insert(
        conn: &mut PgConnection,
        buyer_id: LeadId,
        changed_by: DbId,
        diff: &FieldDiff,
    ) -> Result<BuyerHistory, sqlx::Error> {
        let query = format!(
            "INSERT INTO buyer_history (id, buyer_id, changed_by, changed_at, diff)
             VALUES ($1, $2, $3, NOW(), $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BuyerHistory>(&query)
            .bind(Uuid::new_v4())
            .bind(buyer_id)
            .bind(changed_by)
            .bind(serde_json::Value::Object(diff.clone()))
            .fetch_one(conn)
            .await
    }

    /// List history entries for a lead, most recent first.
    pub async fn list_by_buyer(
        pool: &PgPool,
        buyer_id: LeadId,
        limit: Option<i64>,
    ) -> Result<Vec<BuyerHistory>, sqlx::Error> {
        match limit {
            Some(limit) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM buyer_history
                     WHERE buyer_id = $1
                     ORDER BY changed_at DESC, id DESC
                     LIMIT $2"
                );
                sqlx::query_as::<_, BuyerHistory>(&query)
                    .bind(buyer_id)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM buyer_history
                     WHERE buyer_id = $1
                     ORDER BY changed_at DESC, id DESC"
                );
                sqlx::query_as::<_, BuyerHistory>(&query)
                    .bind(buyer_id)
                    .fetch_all(pool)
                    .await
            }
        }
    }
}
