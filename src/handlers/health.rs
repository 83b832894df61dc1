use axum::Json;
use chrono::Utc;

use crate::models::HealthResponse;

/// health
///
/// [Public Route] Liveness probe. Never touches the store and ignores credentials.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "system",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
