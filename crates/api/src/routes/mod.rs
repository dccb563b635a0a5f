pub mod auth;
pub mod buyers;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                 create an account (public)
/// /auth/login                    obtain an access token (public)
/// /auth/me                       current principal (requires auth)
///
/// /buyers                        list (GET), create (POST)
/// /buyers/export                 CSV export (GET)
/// /buyers/import                 bulk import (POST)
/// /buyers/{id}                   detail (GET), update (PUT), delete (DELETE)
/// /buyers/{id}/status            status-only update (PUT)
/// /buyers/{id}/history           full change history (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(buyers::router())
}
