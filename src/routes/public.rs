use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    AppState,
    handlers::{auth, directory, health},
};

/// Public Router Module
///
/// No gate. Handlers here must not read `AuthUser`; the directory only ever returns
/// verified contractors.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // Load balancer and uptime probe. Answers regardless of credentials.
        .route("/health", get(health::health))
        // --- Account lifecycle ---
        .route("/auth/register", post(auth::register))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/signout", post(auth::sign_out))
        // Always answers the same message, whether or not the email exists.
        .route("/auth/forgot-password", post(auth::forgot_password))
        // Read-only; does not consume the token.
        .route("/auth/verify-reset-token", post(auth::verify_reset_token))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/verify-email", post(auth::verify_email))
        // --- Contractor directory ---
        .route("/contractors", get(directory::list_contractors))
        .route("/contractors/{id}", get(directory::get_contractor))
}
