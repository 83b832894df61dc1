use axum::{
    Router,
    routing::{get, patch},
};

use super::gated;
use crate::{AppState, auth::AccessPolicy, handlers::contractor};

/// Contractor Router Module
///
/// CONTRACTOR only. Leads belonging to another contractor are reported as missing.
pub fn contractor_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route(
            "/contractor/profile",
            get(contractor::get_profile).put(contractor::update_profile),
        )
        .route("/contractor/leads", get(contractor::list_leads))
        // Respond, decline or complete.
        .route("/contractor/leads/{id}", patch(contractor::update_lead));

    gated(routes, state, AccessPolicy::CONTRACTOR)
}
