use axum::{
    Router,
    routing::{get, patch},
};

use super::gated;
use crate::{AppState, auth::AccessPolicy, handlers::admin};

/// Admin Router Module
///
/// ADMIN only; both 401 and 403 answer "Admin access required". Provides oversight
/// (users, quotes, dashboard counts) and moderation (contractor verification,
/// quote status override).
pub fn admin_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/admin/quotes", get(admin::list_quotes))
        .route("/admin/stats", get(admin::get_stats))
        // Lists or delists the contractor in the public directory.
        .route("/admin/contractors/{id}/verify", patch(admin::verify_contractor))
        // Bypasses the quote workflow.
        .route("/admin/quotes/{id}/status", patch(admin::set_quote_status));

    gated(routes, state, AccessPolicy::ADMIN)
}
