//! Route groups, one per audience. Every group except `public` carries its own
//! access gate as a `route_layer`, so a handler cannot be mounted without the
//! policy of the group it lives in.

use axum::{Router, middleware};

use crate::{
    AppState,
    auth::{AccessPolicy, Gate, access_gate},
};

/// Anonymous access: health, auth flows, the contractor directory.
pub mod public;

/// Any signed-in user: account info, messaging, tools, uploads.
pub mod authenticated;

pub mod customer;
pub mod contractor;
pub mod admin;

/// gated
///
/// Puts `router` behind the access gate for `policy`. Uses `route_layer` so that
/// unknown paths still fall through to a plain 404.
pub(crate) fn gated(router: Router<AppState>, state: &AppState, policy: AccessPolicy) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        Gate::new(state, policy),
        access_gate,
    ))
}

/// All API routes, relative to the `/api` prefix.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes(state))
        .merge(customer::customer_routes(state))
        .merge(contractor::contractor_routes(state))
        .merge(admin::admin_routes(state))
}
