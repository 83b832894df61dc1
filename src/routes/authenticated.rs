use axum::{
    Router,
    routing::{get, post},
};

use super::gated;
use crate::{
    AppState,
    auth::AccessPolicy,
    handlers::{me, messaging, tools, uploads},
};

/// Authenticated Router Module
///
/// Any role may call these. Handlers receive the `AuthUser` the gate resolved.
pub fn authenticated_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/me", get(me::get_me))
        // --- Provider proxies ---
        .route("/sms", post(messaging::send_sms))
        .route("/voice", post(messaging::place_call))
        .route(
            "/voice/sarah-agent",
            get(messaging::get_voice_agent).post(messaging::message_voice_agent),
        )
        .route("/grader", post(messaging::grade))
        // --- Stubbed tools (501) ---
        .route("/tools/material-detection", post(tools::material_detection))
        .route("/tools/voice-translation", post(tools::voice_translation))
        .route("/tools/ai-transform", post(tools::ai_transform))
        // Presigned PUT for quote photos, straight to object storage.
        .route("/uploads/presigned", post(uploads::get_presigned_upload));

    gated(routes, state, AccessPolicy::AUTHENTICATED)
}
