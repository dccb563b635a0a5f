//! Repository-level tests for buyer lead CRUD, the guarded update path, and
//! the change history invariants.

use sqlx::PgPool;

use assert_matches::assert_matches;
use leadbook_core::types::DbId;
use leadbook_core::validation::ValidatedBuyer;
use leadbook_db::models::buyer::{
    BuyerDeleteOutcome, BuyerFilter, BuyerStatusOutcome, BuyerUpdateOutcome,
};
use leadbook_db::models::user::CreateUser;
use leadbook_db::repositories::{BuyerHistoryRepo, BuyerRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, username: &str) -> DbId {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            display_name: username.to_string(),
            password_hash: "$argon2id$test-hash".to_string(),
        },
    )
    .await
    .expect("user insert should succeed");
    user.id
}

fn sample_lead() -> ValidatedBuyer {
    ValidatedBuyer {
        full_name: "Asha Verma".to_string(),
        email: Some("asha@example.com".to_string()),
        phone: "9876543210".to_string(),
        city: "Mohali".to_string(),
        property_type: "Apartment".to_string(),
        bhk: Some("2".to_string()),
        purpose: "Buy".to_string(),
        budget_min: Some(2_500_000),
        budget_max: Some(4_000_000),
        timeline: "0-3m".to_string(),
        source: "Website".to_string(),
        status: "New".to_string(),
        notes: None,
        tags: vec!["hot".to_string(), "nri".to_string()],
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn create_round_trips_field_values(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    let created = BuyerRepo::create(&pool, owner, &sample_lead())
        .await
        .expect("create should succeed");

    let fetched = BuyerRepo::find_by_id(&pool, created.id)
        .await
        .expect("query should succeed")
        .expect("lead should exist");

    assert_eq!(fetched.full_name, "Asha Verma");
    assert_eq!(fetched.phone, "9876543210");
    assert_eq!(fetched.city, "Mohali");
    assert_eq!(fetched.bhk.as_deref(), Some("2"));
    assert_eq!(fetched.budget_min, Some(2_500_000));
    assert_eq!(fetched.tags, vec!["hot".to_string(), "nri".to_string()]);
    assert_eq!(fetched.owner_id, owner);
}

#[sqlx::test(migrations = "./migrations")]
async fn create_writes_one_history_entry_with_null_olds(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    let created = BuyerRepo::create(&pool, owner, &sample_lead())
        .await
        .expect("create should succeed");

    let history = BuyerHistoryRepo::list_by_buyer(&pool, created.id, None)
        .await
        .expect("history query should succeed");

    assert_eq!(history.len(), 1);
    let entry = &history[0];
    assert_eq!(entry.buyer_id, created.id);
    assert_eq!(entry.changed_by, owner);

    let diff = entry.diff.as_object().expect("diff should be an object");
    assert_eq!(diff["full_name"]["old"], serde_json::Value::Null);
    assert_eq!(diff["full_name"]["new"], serde_json::json!("Asha Verma"));
    assert_eq!(diff["tags"]["new"], serde_json::json!(["hot", "nri"]));
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn update_writes_diff_and_refreshes_token(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    let created = BuyerRepo::create(&pool, owner, &sample_lead())
        .await
        .expect("create should succeed");

    let mut proposed = sample_lead();
    proposed.status = "Qualified".to_string();
    proposed.budget_max = Some(4_500_000);

    let outcome = BuyerRepo::update(
        &pool,
        created.id,
        owner,
        &proposed,
        Some(created.updated_at),
    )
    .await
    .expect("update should succeed");

    let BuyerUpdateOutcome::Updated { buyer, diff } = outcome else {
        panic!("expected Updated outcome");
    };
    assert_eq!(buyer.status, "Qualified");
    assert!(buyer.updated_at > created.updated_at);

    assert_eq!(diff.len(), 2);
    assert_eq!(diff["status"]["old"], serde_json::json!("New"));
    assert_eq!(diff["status"]["new"], serde_json::json!("Qualified"));
    assert_eq!(diff["budget_max"]["new"], serde_json::json!(4_500_000));

    // Creation entry + update entry.
    let history = BuyerHistoryRepo::list_by_buyer(&pool, created.id, None)
        .await
        .expect("history query should succeed");
    assert_eq!(history.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn noop_update_reports_no_changes_and_writes_no_history(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    let created = BuyerRepo::create(&pool, owner, &sample_lead())
        .await
        .expect("create should succeed");

    let outcome = BuyerRepo::update(
        &pool,
        created.id,
        owner,
        &sample_lead(),
        Some(created.updated_at),
    )
    .await
    .expect("update should succeed");

    let BuyerUpdateOutcome::NoChanges(buyer) = outcome else {
        panic!("expected NoChanges outcome");
    };
    assert_eq!(
        buyer.updated_at, created.updated_at,
        "no-op must not refresh the token"
    );

    let history = BuyerHistoryRepo::list_by_buyer(&pool, created.id, None)
        .await
        .expect("history query should succeed");
    assert_eq!(history.len(), 1, "only the creation entry should exist");
}

#[sqlx::test(migrations = "./migrations")]
async fn tag_reorder_alone_is_no_change(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    let created = BuyerRepo::create(&pool, owner, &sample_lead())
        .await
        .expect("create should succeed");

    let mut proposed = sample_lead();
    proposed.tags = vec!["nri".to_string(), "hot".to_string()];

    let outcome = BuyerRepo::update(
        &pool,
        created.id,
        owner,
        &proposed,
        Some(created.updated_at),
    )
    .await
    .expect("update should succeed");

    assert_matches!(outcome, BuyerUpdateOutcome::NoChanges(_));
}

#[sqlx::test(migrations = "./migrations")]
async fn stale_token_is_a_conflict(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    let created = BuyerRepo::create(&pool, owner, &sample_lead())
        .await
        .expect("create should succeed");
    let stale_token = created.updated_at;

    // First writer succeeds with the fresh token.
    let mut first = sample_lead();
    first.status = "Contacted".to_string();
    let outcome = BuyerRepo::update(&pool, created.id, owner, &first, Some(stale_token))
        .await
        .expect("update should succeed");
    assert_matches!(outcome, BuyerUpdateOutcome::Updated { .. });

    // Second writer still carries the original token and must be rejected,
    // even though its payload differs from the current row.
    let mut second = sample_lead();
    second.status = "Visited".to_string();
    let outcome = BuyerRepo::update(&pool, created.id, owner, &second, Some(stale_token))
        .await
        .expect("update should succeed");
    assert_matches!(outcome, BuyerUpdateOutcome::Conflict);
}

#[sqlx::test(migrations = "./migrations")]
async fn update_without_token_skips_conflict_check(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    let created = BuyerRepo::create(&pool, owner, &sample_lead())
        .await
        .expect("create should succeed");

    let mut proposed = sample_lead();
    proposed.status = "Contacted".to_string();

    let outcome = BuyerRepo::update(&pool, created.id, owner, &proposed, None)
        .await
        .expect("update should succeed");
    assert_matches!(outcome, BuyerUpdateOutcome::Updated { .. });
}

#[sqlx::test(migrations = "./migrations")]
async fn update_by_non_owner_is_forbidden(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    let other = seed_user(&pool, "bob").await;
    let created = BuyerRepo::create(&pool, owner, &sample_lead())
        .await
        .expect("create should succeed");

    let mut proposed = sample_lead();
    proposed.status = "Dropped".to_string();

    let outcome = BuyerRepo::update(&pool, created.id, other, &proposed, None)
        .await
        .expect("update should succeed");
    assert_matches!(outcome, BuyerUpdateOutcome::Forbidden);

    // The non-owner can still read the lead.
    let fetched = BuyerRepo::find_by_id(&pool, created.id)
        .await
        .expect("query should succeed");
    assert!(fetched.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn update_of_missing_lead_is_not_found(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    let outcome = BuyerRepo::update(&pool, uuid::Uuid::new_v4(), owner, &sample_lead(), None)
        .await
        .expect("update should succeed");
    assert_matches!(outcome, BuyerUpdateOutcome::NotFound);
}

// ---------------------------------------------------------------------------
// Status-only update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn set_status_refreshes_token_without_history(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    let created = BuyerRepo::create(&pool, owner, &sample_lead())
        .await
        .expect("create should succeed");

    let outcome = BuyerRepo::set_status(&pool, created.id, owner, "Converted")
        .await
        .expect("set_status should succeed");

    let BuyerStatusOutcome::Updated(buyer) = outcome else {
        panic!("expected Updated outcome");
    };
    assert_eq!(buyer.status, "Converted");
    assert!(buyer.updated_at > created.updated_at);

    let history = BuyerHistoryRepo::list_by_buyer(&pool, created.id, None)
        .await
        .expect("history query should succeed");
    assert_eq!(history.len(), 1, "status path writes no history entry");
}

#[sqlx::test(migrations = "./migrations")]
async fn set_status_by_non_owner_is_forbidden(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    let other = seed_user(&pool, "bob").await;
    let created = BuyerRepo::create(&pool, owner, &sample_lead())
        .await
        .expect("create should succeed");

    let outcome = BuyerRepo::set_status(&pool, created.id, other, "Dropped")
        .await
        .expect("set_status should succeed");
    assert_matches!(outcome, BuyerStatusOutcome::Forbidden);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn delete_removes_lead_but_keeps_history(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    let created = BuyerRepo::create(&pool, owner, &sample_lead())
        .await
        .expect("create should succeed");

    let outcome = BuyerRepo::delete(&pool, created.id, owner)
        .await
        .expect("delete should succeed");
    assert_matches!(outcome, BuyerDeleteOutcome::Deleted);

    let fetched = BuyerRepo::find_by_id(&pool, created.id)
        .await
        .expect("query should succeed");
    assert!(fetched.is_none());

    // The audit trail is orphan-tolerant: entries survive the delete.
    let history = BuyerHistoryRepo::list_by_buyer(&pool, created.id, None)
        .await
        .expect("history query should succeed");
    assert_eq!(history.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn delete_by_non_owner_is_forbidden(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    let other = seed_user(&pool, "bob").await;
    let created = BuyerRepo::create(&pool, owner, &sample_lead())
        .await
        .expect("create should succeed");

    let outcome = BuyerRepo::delete(&pool, created.id, other)
        .await
        .expect("delete should succeed");
    assert_matches!(outcome, BuyerDeleteOutcome::Forbidden);

    let fetched = BuyerRepo::find_by_id(&pool, created.id)
        .await
        .expect("query should succeed");
    assert!(fetched.is_some(), "the lead must not have been deleted");
}

// ---------------------------------------------------------------------------
// List / filter / export
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn combined_filters_intersect_and_order_by_recency(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;

    let mut converted_mohali = sample_lead();
    converted_mohali.status = "Converted".to_string();
    let first = BuyerRepo::create(&pool, owner, &converted_mohali)
        .await
        .expect("create should succeed");

    let mut converted_other_city = sample_lead();
    converted_other_city.city = "Zirakpur".to_string();
    converted_other_city.status = "Converted".to_string();
    BuyerRepo::create(&pool, owner, &converted_other_city)
        .await
        .expect("create should succeed");

    let mut new_mohali = sample_lead();
    new_mohali.status = "New".to_string();
    BuyerRepo::create(&pool, owner, &new_mohali)
        .await
        .expect("create should succeed");

    let second = BuyerRepo::create(&pool, owner, &converted_mohali)
        .await
        .expect("create should succeed");

    let filter = BuyerFilter {
        city: Some("Mohali".to_string()),
        status: Some("Converted".to_string()),
        ..Default::default()
    };

    let items = BuyerRepo::list(&pool, &filter, 10, 0)
        .await
        .expect("list should succeed");
    let total = BuyerRepo::count(&pool, &filter)
        .await
        .expect("count should succeed");

    assert_eq!(total, 2);
    assert_eq!(items.len(), 2);
    // Most recently updated first.
    assert_eq!(items[0].id, second.id);
    assert_eq!(items[1].id, first.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn search_matches_name_email_and_phone(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;

    BuyerRepo::create(&pool, owner, &sample_lead())
        .await
        .expect("create should succeed");

    let mut other = sample_lead();
    other.full_name = "Rohan Gupta".to_string();
    other.email = Some("rohan@example.com".to_string());
    other.phone = "8765432109".to_string();
    BuyerRepo::create(&pool, owner, &other)
        .await
        .expect("create should succeed");

    for (needle, expected_name) in [
        ("asha", "Asha Verma"),
        ("rohan@", "Rohan Gupta"),
        ("876543210", "Rohan Gupta"),
    ] {
        let filter = BuyerFilter {
            search: Some(needle.to_string()),
            ..Default::default()
        };
        let items = BuyerRepo::list(&pool, &filter, 10, 0)
            .await
            .expect("list should succeed");
        assert!(
            items.iter().any(|b| b.full_name == expected_name),
            "search '{needle}' should match {expected_name}"
        );
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn pagination_returns_total_for_whole_filter_set(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;
    for _ in 0..12 {
        BuyerRepo::create(&pool, owner, &sample_lead())
            .await
            .expect("create should succeed");
    }

    let filter = BuyerFilter::default();
    let page_one = BuyerRepo::list(&pool, &filter, 10, 0)
        .await
        .expect("list should succeed");
    let page_two = BuyerRepo::list(&pool, &filter, 10, 10)
        .await
        .expect("list should succeed");
    let total = BuyerRepo::count(&pool, &filter)
        .await
        .expect("count should succeed");

    assert_eq!(page_one.len(), 10);
    assert_eq!(page_two.len(), 2);
    assert_eq!(total, 12);
}

// ---------------------------------------------------------------------------
// Bulk import
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn insert_batch_assigns_owner_and_writes_no_history(pool: PgPool) {
    let owner = seed_user(&pool, "alice").await;

    let mut second = sample_lead();
    second.full_name = "Rohan Gupta".to_string();
    let inserted = BuyerRepo::insert_batch(&pool, owner, &[sample_lead(), second])
        .await
        .expect("batch insert should succeed");
    assert_eq!(inserted, 2);

    let items = BuyerRepo::list(&pool, &BuyerFilter::default(), 10, 0)
        .await
        .expect("list should succeed");
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|b| b.owner_id == owner));

    for item in &items {
        let history = BuyerHistoryRepo::list_by_buyer(&pool, item.id, None)
            .await
            .expect("history query should succeed");
        assert!(history.is_empty(), "imported rows are audit-exempt");
    }
}
