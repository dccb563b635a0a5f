//! Repository for the `buyers` table.
//!
//! The update, status, and delete paths run their ownership/conflict gates
//! inside a transaction holding a `FOR UPDATE` row lock, so concurrent
//! writers to the same lead serialize and cannot both pass the conflict
//! check on stale views. Record and history writes always share one
//! transaction: either both land or neither does.

use sqlx::PgPool;
use uuid::Uuid;

use leadbook_core::diff::{creation_diff, update_diff};
use leadbook_core::types::{DbId, LeadId, Timestamp};
use leadbook_core::validation::ValidatedBuyer;

use crate::models::buyer::{
    Buyer, BuyerDeleteOutcome, BuyerFilter, BuyerStatusOutcome, BuyerUpdateOutcome,
};
use crate::repositories::BuyerHistoryRepo;

/// Column list for buyers queries.
const COLUMNS: &str = "\
    id, full_name, email, phone, city, property_type, bhk, purpose, \
    budget_min, budget_max, timeline, source, status, notes, tags, \
    owner_id, updated_at";

/// Provides CRUD, listing, and bulk operations for buyer leads.
pub struct BuyerRepo;

impl BuyerRepo {
    /// Create a new lead and its creation history entry in one transaction.
    ///
    /// The id is generated app-side so the history row can reference it
    /// before commit. The creation diff records every field with a null
    /// `old` value.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        values: &ValidatedBuyer,
    ) -> Result<Buyer, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO buyers
                (id, full_name, email, phone, city, property_type, bhk, purpose,
                 budget_min, budget_max, timeline, source, status, notes, tags,
                 owner_id, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, NOW())
             RETURNING {COLUMNS}"
        );
        let buyer = bind_values(sqlx::query_as::<_, Buyer>(&query).bind(Uuid::new_v4()), values)
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?;

        let diff = creation_diff(values);
        BuyerHistoryRepo::insert(&mut tx, buyer.id, owner_id, &diff).await?;

        tx.commit().await?;
        Ok(buyer)
    }

    /// Find a lead by its id.
    pub async fn find_by_id(pool: &PgPool, id: LeadId) -> Result<Option<Buyer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM buyers WHERE id = $1");
        sqlx::query_as::<_, Buyer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Full-field update guarded by existence, ownership, and the
    /// optimistic-concurrency token, with a field diff written to history.
    ///
    /// Gates run in order against the row locked `FOR UPDATE`; an empty diff
    /// commits nothing and reports [`BuyerUpdateOutcome::NoChanges`].
    pub async fn update(
        pool: &PgPool,
        id: LeadId,
        principal: DbId,
        values: &ValidatedBuyer,
        expected_updated_at: Option<Timestamp>,
    ) -> Result<BuyerUpdateOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM buyers WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, Buyer>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            return Ok(BuyerUpdateOutcome::NotFound);
        };
        if current.owner_id != principal {
            return Ok(BuyerUpdateOutcome::Forbidden);
        }
        // Exact-match token check: any mismatch means another writer got
        // there first and the client must refetch.
        if let Some(expected) = expected_updated_at {
            if expected != current.updated_at {
                return Ok(BuyerUpdateOutcome::Conflict);
            }
        }

        let diff = update_diff(&current.field_values(), values);
        if diff.is_empty() {
            return Ok(BuyerUpdateOutcome::NoChanges(Box::new(current)));
        }

        let query = format!(
            "UPDATE buyers SET
                full_name = $2, email = $3, phone = $4, city = $5,
                property_type = $6, bhk = $7, purpose = $8, budget_min = $9,
                budget_max = $10, timeline = $11, source = $12, status = $13,
                notes = $14, tags = $15, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let buyer = bind_values(sqlx::query_as::<_, Buyer>(&query).bind(id), values)
            .fetch_one(&mut *tx)
            .await?;

        BuyerHistoryRepo::insert(&mut tx, id, principal, &diff).await?;

        tx.commit().await?;
        Ok(BuyerUpdateOutcome::Updated {
            buyer: Box::new(buyer),
            diff,
        })
    }

    /// Status-only update guarded by existence and ownership.
    ///
    /// Narrow path: sets `status` and refreshes `updated_at` without the
    /// full-field diff, and writes no history entry.
    pub async fn set_status(
        pool: &PgPool,
        id: LeadId,
        principal: DbId,
        status: &str,
    ) -> Result<BuyerStatusOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let owner: Option<DbId> =
            sqlx::query_scalar("SELECT owner_id FROM buyers WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(owner) = owner else {
            return Ok(BuyerStatusOutcome::NotFound);
        };
        if owner != principal {
            return Ok(BuyerStatusOutcome::Forbidden);
        }

        let query = format!(
            "UPDATE buyers SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let buyer = sqlx::query_as::<_, Buyer>(&query)
            .bind(id)
            .bind(status)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(BuyerStatusOutcome::Updated(Box::new(buyer)))
    }

    /// Delete a lead after existence and ownership gates.
    ///
    /// History rows for the lead are retained: the audit trail is
    /// orphan-tolerant by design.
    pub async fn delete(
        pool: &PgPool,
        id: LeadId,
        principal: DbId,
    ) -> Result<BuyerDeleteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let owner: Option<DbId> =
            sqlx::query_scalar("SELECT owner_id FROM buyers WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(owner) = owner else {
            return Ok(BuyerDeleteOutcome::NotFound);
        };
        if owner != principal {
            return Ok(BuyerDeleteOutcome::Forbidden);
        }

        sqlx::query("DELETE FROM buyers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(BuyerDeleteOutcome::Deleted)
    }

    /// List leads matching the filter, most recently updated first.
    pub async fn list(
        pool: &PgPool,
        filter: &BuyerFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Buyer>, sqlx::Error> {
        let (where_clause, binds, bind_idx) = build_filter(filter);

        let query = format!(
            "SELECT {COLUMNS} FROM buyers {where_clause} \
             ORDER BY updated_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let mut q = sqlx::query_as::<_, Buyer>(&query);
        for value in &binds {
            q = q.bind(value);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Count leads matching the filter (for pagination metadata).
    pub async fn count(pool: &PgPool, filter: &BuyerFilter) -> Result<i64, sqlx::Error> {
        let (where_clause, binds, _) = build_filter(filter);

        let query = format!("SELECT COUNT(*)::BIGINT FROM buyers {where_clause}");

        let mut q = sqlx::query_scalar::<_, i64>(&query);
        for value in &binds {
            q = q.bind(value);
        }
        q.fetch_one(pool).await
    }

    /// Fetch every lead matching the filter for export, most recently
    /// updated first. No pagination.
    pub async fn export(pool: &PgPool, filter: &BuyerFilter) -> Result<Vec<Buyer>, sqlx::Error> {
        let (where_clause, binds, _) = build_filter(filter);

        let query = format!(
            "SELECT {COLUMNS} FROM buyers {where_clause} \
             ORDER BY updated_at DESC, id DESC"
        );

        let mut q = sqlx::query_as::<_, Buyer>(&query);
        for value in &binds {
            q = q.bind(value);
        }
        q.fetch_all(pool).await
    }

    /// Insert a batch of validated import rows in one transaction, all owned
    /// by the importing principal. No history entries are written for
    /// imported rows.
    pub async fn insert_batch(
        pool: &PgPool,
        owner_id: DbId,
        rows: &[ValidatedBuyer],
    ) -> Result<u64, sqlx::Error> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO buyers
                (id, full_name, email, phone, city, property_type, bhk, purpose,
                 budget_min, budget_max, timeline, source, status, notes, tags,
                 owner_id, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, NOW())
             RETURNING {COLUMNS}"
        );

        let mut inserted = 0u64;
        for values in rows {
            bind_values(sqlx::query_as::<_, Buyer>(&query).bind(Uuid::new_v4()), values)
                .bind(owner_id)
                .fetch_one(&mut *tx)
                .await?;
            inserted += 1;
        }

        tx.commit().await?;
        Ok(inserted)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Bind the 14 tracked field values in column order, starting at `$2`
/// (callers bind `$1` themselves).
fn bind_values<'q>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, Buyer, sqlx::postgres::PgArguments>,
    values: &'q ValidatedBuyer,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, Buyer, sqlx::postgres::PgArguments> {
    q.bind(&values.full_name)
        .bind(&values.email)
        .bind(&values.phone)
        .bind(&values.city)
        .bind(&values.property_type)
        .bind(&values.bhk)
        .bind(&values.purpose)
        .bind(values.budget_min)
        .bind(values.budget_max)
        .bind(&values.timeline)
        .bind(&values.source)
        .bind(&values.status)
        .bind(&values.notes)
        .bind(&values.tags)
}

/// Build a WHERE clause and bind values from filter parameters.
///
/// Returns `(where_clause, bind_values, next_bind_index)`. The clause is
/// empty when no filters are active, otherwise starts with `WHERE `. All
/// filter values bind as text, so a plain `Vec<String>` carries them.
fn build_filter(filter: &BuyerFilter) -> (String, Vec<String>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut binds: Vec<String> = Vec::new();

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        conditions.push(format!(
            "(full_name ILIKE ${bind_idx} OR email ILIKE ${bind_idx} OR phone ILIKE ${bind_idx})"
        ));
        bind_idx += 1;
        binds.push(format!("%{search}%"));
    }

    for (column, value) in [
        ("city", &filter.city),
        ("property_type", &filter.property_type),
        ("status", &filter.status),
        ("timeline", &filter.timeline),
    ] {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            conditions.push(format!("{column} = ${bind_idx}"));
            bind_idx += 1;
            binds.push(value.to_string());
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, binds, bind_idx)
}
