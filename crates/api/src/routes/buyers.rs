use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::buyers;
use crate::state::AppState;

/// Mount `/buyers` routes.
///
/// `export` and `import` are registered as literal segments alongside the
/// `{id}` matcher; axum prefers the literal match, so they never shadow a
/// lead id.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/buyers",
            get(buyers::list_buyers).post(buyers::create_buyer),
        )
        .route("/buyers/export", get(buyers::export_buyers))
        .route("/buyers/import", post(buyers::import_buyers))
        .route(
            "/buyers/{id}",
            get(buyers::get_buyer)
                .put(buyers::update_buyer)
                .delete(buyers::delete_buyer),
        )
        .route("/buyers/{id}/status", put(buyers::update_status))
        .route("/buyers/{id}/history", get(buyers::list_history))
}
