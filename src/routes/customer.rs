use axum::{
    Router,
    routing::{get, patch, post},
};

use super::gated;
use crate::{AppState, auth::AccessPolicy, handlers::customer};

/// Customer Router Module
///
/// CUSTOMER only. Every handler scopes its reads and writes to the caller's own
/// customer profile.
pub fn customer_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/quotes", post(customer::create_quote))
        .route("/customer/quotes", get(customer::list_my_quotes))
        // Accept or cancel; other statuses are rejected with 400.
        .route("/customer/quotes/{id}", patch(customer::update_my_quote))
        .route("/customer/reviews", post(customer::create_review));

    gated(routes, state, AccessPolicy::CUSTOMER)
}
