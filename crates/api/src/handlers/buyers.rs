//! Handlers for the buyer lead resource.
//!
//! Covers create, list/filter, detail with change history, the guarded
//! full-field update, status-only update, delete, bulk import, and CSV
//! export. Listing and reads are open to any authenticated principal;
//! mutations are gated on ownership and rate limited per principal.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use leadbook_core::buyer::{self, IMPORT_MAX_ROWS, PAGE_SIZE};
use leadbook_core::error::{CoreError, FieldError};
use leadbook_core::export;
use leadbook_core::types::{LeadId, Timestamp};
use leadbook_core::validation::{validate_buyer, BuyerInput, ValidatedBuyer};
use leadbook_db::models::buyer::{
    Buyer, BuyerDeleteOutcome, BuyerFilter, BuyerListItem, BuyerPage, BuyerStatusOutcome,
    BuyerUpdateOutcome,
};
use leadbook_db::models::history::BuyerHistory;
use leadbook_db::repositories::{BuyerHistoryRepo, BuyerRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// History entries returned inline on the detail view.
const DETAIL_HISTORY_LIMIT: i64 = 5;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for listing and export.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<String>,
    pub status: Option<String>,
    pub timeline: Option<String>,
    /// 1-based page number; pages are a fixed size.
    pub page: Option<i64>,
}

impl ListParams {
    fn filter(&self) -> BuyerFilter {
        BuyerFilter {
            search: self.search.clone(),
            city: self.city.clone(),
            property_type: self.property_type.clone(),
            status: self.status.clone(),
            timeline: self.timeline.clone(),
        }
    }
}

/// Request body for `PUT /buyers/{id}`: the full proposed field set plus the
/// optimistic-concurrency token the client last observed.
#[derive(Debug, Deserialize)]
pub struct UpdateBuyerRequest {
    #[serde(flatten)]
    pub values: BuyerInput,
    pub updated_at: Option<Timestamp>,
}

/// Response body for `PUT /buyers/{id}`.
///
/// `updated` distinguishes a persisted change from a no-op; both are
/// successes.
#[derive(Debug, Serialize)]
pub struct UpdateBuyerResponse {
    pub updated: bool,
    pub message: &'static str,
    pub buyer: Buyer,
}

/// Request body for `PUT /buyers/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Request body for `POST /buyers/import`.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub rows: Vec<serde_json::Value>,
}

/// One rejected import row, referenced by 1-based index.
#[derive(Debug, Serialize)]
pub struct ImportRowError {
    pub row: usize,
    pub message: String,
}

/// Response body for `POST /buyers/import`.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub inserted: u64,
    pub errors: Vec<ImportRowError>,
}

/// Response body for the detail view.
#[derive(Debug, Serialize)]
pub struct BuyerDetail {
    pub buyer: Buyer,
    pub can_edit: bool,
    pub history: Vec<BuyerHistory>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Consume one rate-limit slot for the principal or reject the request.
fn check_rate_limit(state: &AppState, auth: &AuthUser) -> Result<(), AppError> {
    if state.rate_limiter.allow(auth.user_id) {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::RateLimited(
            "Too many requests. Try again later.".into(),
        )))
    }
}

/// Run the payload validator, mapping failures into the error taxonomy.
fn validated(input: &BuyerInput) -> Result<ValidatedBuyer, AppError> {
    validate_buyer(input).map_err(|errors| AppError::Core(CoreError::Validation(errors)))
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /buyers
///
/// Create a new lead owned by the requesting principal. The creation history
/// entry is written in the same transaction as the row.
pub async fn create_buyer(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<BuyerInput>,
) -> AppResult<impl IntoResponse> {
    check_rate_limit(&state, &auth)?;
    let values = validated(&input)?;

    let created = BuyerRepo::create(&state.pool, auth.user_id, &values).await?;

    tracing::info!(
        user_id = auth.user_id,
        buyer_id = %created.id,
        "Buyer lead created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /buyers?search=&city=&property_type=&status=&timeline=&page=
///
/// List leads with filters, most recently updated first. Visible to any
/// authenticated principal; each item reports whether the requester may
/// edit it.
pub async fn list_buyers(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let filter = params.filter();
    let page = params.page.unwrap_or(1).max(1);
    let offset = (page - 1) * PAGE_SIZE;

    let buyers = BuyerRepo::list(&state.pool, &filter, PAGE_SIZE, offset).await?;
    let total = BuyerRepo::count(&state.pool, &filter).await?;

    let items = buyers
        .into_iter()
        .map(|buyer| BuyerListItem {
            can_edit: buyer.owner_id == auth.user_id,
            buyer,
        })
        .collect();

    Ok(Json(DataResponse {
        data: BuyerPage {
            items,
            total,
            page,
            page_size: PAGE_SIZE,
        },
    }))
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

/// GET /buyers/{id}
///
/// Fetch one lead with its most recent history entries and the requester's
/// edit permission.
pub async fn get_buyer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<LeadId>,
) -> AppResult<impl IntoResponse> {
    let buyer = BuyerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Buyer", id)))?;

    let history =
        BuyerHistoryRepo::list_by_buyer(&state.pool, id, Some(DETAIL_HISTORY_LIMIT)).await?;

    let can_edit = buyer.owner_id == auth.user_id;

    Ok(Json(DataResponse {
        data: BuyerDetail {
            buyer,
            can_edit,
            history,
        },
    }))
}

/// GET /buyers/{id}/history
///
/// Full change history for a lead, newest first. Also serves ids of deleted
/// leads: the audit trail outlives the record.
pub async fn list_history(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<LeadId>,
) -> AppResult<impl IntoResponse> {
    let history = BuyerHistoryRepo::list_by_buyer(&state.pool, id, None).await?;
    Ok(Json(DataResponse { data: history }))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PUT /buyers/{id}
///
/// Full-field update guarded by ownership and the `updated_at` token. A
/// payload identical to the stored row succeeds with `updated: false` and
/// writes nothing.
pub async fn update_buyer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<LeadId>,
    Json(request): Json<UpdateBuyerRequest>,
) -> AppResult<impl IntoResponse> {
    check_rate_limit(&state, &auth)?;

    // Gate order is part of the API contract: a missing record, foreign
    // owner, or stale token is reported before payload validation. The
    // repository re-runs the same gates under the row lock before
    // persisting.
    let current = BuyerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Buyer", id)))?;
    if current.owner_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the owner can modify this lead".into(),
        )));
    }
    if let Some(expected) = request.updated_at {
        if expected != current.updated_at {
            return Err(AppError::Core(CoreError::Conflict(
                "Record has been modified by another user. Please refresh and try again.".into(),
            )));
        }
    }

    let values = validated(&request.values)?;

    let outcome =
        BuyerRepo::update(&state.pool, id, auth.user_id, &values, request.updated_at).await?;

    match outcome {
        BuyerUpdateOutcome::NotFound => {
            Err(AppError::Core(CoreError::not_found("Buyer", id)))
        }
        BuyerUpdateOutcome::Forbidden => Err(AppError::Core(CoreError::Forbidden(
            "Only the owner can modify this lead".into(),
        ))),
        BuyerUpdateOutcome::Conflict => Err(AppError::Core(CoreError::Conflict(
            "Record has been modified by another user. Please refresh and try again.".into(),
        ))),
        BuyerUpdateOutcome::NoChanges(buyer) => Ok(Json(DataResponse {
            data: UpdateBuyerResponse {
                updated: false,
                message: "No changes detected",
                buyer: *buyer,
            },
        })),
        BuyerUpdateOutcome::Updated { buyer, diff } => {
            tracing::info!(
                user_id = auth.user_id,
                buyer_id = %id,
                changed_fields = diff.len(),
                "Buyer lead updated"
            );
            Ok(Json(DataResponse {
                data: UpdateBuyerResponse {
                    updated: true,
                    message: "Buyer updated successfully",
                    buyer: *buyer,
                },
            }))
        }
    }
}

// ---------------------------------------------------------------------------
// Status-only update
// ---------------------------------------------------------------------------

/// PUT /buyers/{id}/status
///
/// Narrow update path: sets the status and refreshes `updated_at`, skipping
/// the full-field diff.
pub async fn update_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<LeadId>,
    Json(request): Json<StatusUpdateRequest>,
) -> AppResult<impl IntoResponse> {
    check_rate_limit(&state, &auth)?;

    if !buyer::is_valid_status(&request.status) {
        return Err(AppError::Core(CoreError::Validation(vec![FieldError::new(
            "status",
            format!("'{}' is not a valid status", request.status),
        )])));
    }

    let outcome = BuyerRepo::set_status(&state.pool, id, auth.user_id, &request.status).await?;

    match outcome {
        BuyerStatusOutcome::NotFound => {
            Err(AppError::Core(CoreError::not_found("Buyer", id)))
        }
        BuyerStatusOutcome::Forbidden => Err(AppError::Core(CoreError::Forbidden(
            "Only the owner can modify this lead".into(),
        ))),
        BuyerStatusOutcome::Updated(updated) => {
            tracing::info!(
                user_id = auth.user_id,
                buyer_id = %id,
                status = %updated.status,
                "Buyer status updated"
            );
            Ok(Json(DataResponse { data: *updated }))
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /buyers/{id}
///
/// Remove a lead. Its history entries are retained.
pub async fn delete_buyer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<LeadId>,
) -> AppResult<impl IntoResponse> {
    let outcome = BuyerRepo::delete(&state.pool, id, auth.user_id).await?;

    match outcome {
        BuyerDeleteOutcome::NotFound => {
            Err(AppError::Core(CoreError::not_found("Buyer", id)))
        }
        BuyerDeleteOutcome::Forbidden => Err(AppError::Core(CoreError::Forbidden(
            "Only the owner can delete this lead".into(),
        ))),
        BuyerDeleteOutcome::Deleted => {
            tracing::info!(user_id = auth.user_id, buyer_id = %id, "Buyer lead deleted");
            Ok(StatusCode::NO_CONTENT)
        }
    }
}

// ---------------------------------------------------------------------------
// Bulk import
// ---------------------------------------------------------------------------

/// POST /buyers/import
///
/// Validate up to 200 raw rows independently, collect per-row errors, and
/// insert all valid rows in one transaction owned by the importer. Imported
/// rows are audit-exempt: no history entries are written.
pub async fn import_buyers(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> AppResult<impl IntoResponse> {
    if request.rows.len() > IMPORT_MAX_ROWS {
        return Err(AppError::BadRequest(format!(
            "Max {IMPORT_MAX_ROWS} rows allowed per import"
        )));
    }

    let mut valid: Vec<ValidatedBuyer> = Vec::new();
    let mut errors: Vec<ImportRowError> = Vec::new();

    for (idx, raw) in request.rows.iter().enumerate() {
        let row = idx + 1;
        match serde_json::from_value::<BuyerInput>(raw.clone()) {
            Ok(input) => match validate_buyer(&input) {
                Ok(values) => valid.push(values),
                Err(field_errors) => errors.push(ImportRowError {
                    row,
                    message: field_errors
                        .iter()
                        .map(|e| format!("{}: {}", e.field, e.message))
                        .collect::<Vec<_>>()
                        .join("; "),
                }),
            },
            Err(e) => errors.push(ImportRowError {
                row,
                message: format!("Malformed row: {e}"),
            }),
        }
    }

    let inserted = BuyerRepo::insert_batch(&state.pool, auth.user_id, &valid).await?;

    tracing::info!(
        user_id = auth.user_id,
        inserted,
        rejected = errors.len(),
        "Buyer import completed"
    );

    Ok(Json(DataResponse {
        data: ImportResponse { inserted, errors },
    }))
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// GET /buyers/export?search=&city=&property_type=&status=&timeline=
///
/// Export all leads matching the filter as CSV, most recently updated
/// first. Pure read; pagination does not apply.
pub async fn export_buyers(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let buyers = BuyerRepo::export(&state.pool, &params.filter()).await?;

    let mut csv_output = export::header_line();
    for buyer in &buyers {
        csv_output.push_str(&export::row_line(&export_fields(buyer)));
    }

    Ok(axum::response::Response::builder()
        .status(200)
        .header("Content-Type", "text/csv")
        .header("Content-Disposition", "attachment; filename=\"buyers.csv\"")
        .body(axum::body::Body::from(csv_output))
        .unwrap()
        .into_response())
}

/// Render one lead's export fields in the fixed column order.
fn export_fields(buyer: &Buyer) -> Vec<String> {
    vec![
        buyer.id.to_string(),
        buyer.full_name.clone(),
        buyer.email.clone().unwrap_or_default(),
        buyer.phone.clone(),
        buyer.city.clone(),
        buyer.property_type.clone(),
        buyer.bhk.clone().unwrap_or_default(),
        buyer.purpose.clone(),
        buyer.budget_min.map_or(String::new(), |v| v.to_string()),
        buyer.budget_max.map_or(String::new(), |v| v.to_string()),
        buyer.timeline.clone(),
        buyer.source.clone(),
        buyer.status.clone(),
        buyer.tags.join(","),
        buyer.owner_id.to_string(),
        buyer.updated_at.to_rfc3339(),
    ]
}
