use axum::extract::{Path, State};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, AppJson},
    models::{
        AdminQuoteView, AdminStats, AdminUserSummary, Contractor, Quote, QuoteStatusRequest,
        VerifyContractorRequest,
    },
};

/// list_users
///
/// [Admin Route] Every account with a summary of its role profile.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    responses(
        (status = 200, description = "Users", body = [AdminUserSummary]),
        (status = 401, description = "Not signed in", body = crate::error::ErrorBody),
        (status = 403, description = "Not an admin", body = crate::error::ErrorBody)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<AppJson<Vec<AdminUserSummary>>> {
    Ok(AppJson(state.repo.list_users_admin().await?))
}

/// list_quotes
///
/// [Admin Route] Every quote, joined with the names and emails of both parties.
#[utoipa::path(
    get,
    path = "/api/admin/quotes",
    tag = "admin",
    responses((status = 200, description = "Quotes", body = [AdminQuoteView]))
)]
pub async fn list_quotes(State(state): State<AppState>) -> ApiResult<AppJson<Vec<AdminQuoteView>>> {
    Ok(AppJson(state.repo.list_quotes_admin().await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    tag = "admin",
    responses((status = 200, description = "Dashboard counts", body = AdminStats))
)]
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<AppJson<AdminStats>> {
    Ok(AppJson(state.repo.get_stats().await?))
}

/// verify_contractor
///
/// [Admin Route] Lists or delists a contractor in the public directory.
#[utoipa::path(
    patch,
    path = "/api/admin/contractors/{id}/verify",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Contractor id")),
    request_body = VerifyContractorRequest,
    responses(
        (status = 200, description = "Contractor updated", body = Contractor),
        (status = 404, description = "Contractor not found", body = crate::error::ErrorBody)
    )
)]
pub async fn verify_contractor(
    admin: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<VerifyContractorRequest>,
) -> ApiResult<AppJson<Contractor>> {
    let contractor = state
        .repo
        .set_contractor_verified(id, payload.is_verified)
        .await?
        .ok_or(ApiError::NotFound {
            resource: "Contractor",
        })?;

    tracing::info!(admin_id = %admin.id, contractor_id = %id, verified = payload.is_verified, "contractor verification changed");
    Ok(AppJson(contractor))
}

/// set_quote_status
///
/// [Admin Route] Moderation override. Sets any status without the workflow checks
/// customers and contractors are held to.
#[utoipa::path(
    patch,
    path = "/api/admin/quotes/{id}/status",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Quote id")),
    request_body = QuoteStatusRequest,
    responses(
        (status = 200, description = "Quote updated", body = Quote),
        (status = 404, description = "Quote not found", body = crate::error::ErrorBody)
    )
)]
pub async fn set_quote_status(
    admin: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<QuoteStatusRequest>,
) -> ApiResult<AppJson<Quote>> {
    let quote = state
        .repo
        .set_quote_status(id, payload.status)
        .await?
        .ok_or(ApiError::NotFound { resource: "Quote" })?;

    tracing::warn!(admin_id = %admin.id, quote_id = %id, status = %payload.status, "quote status overridden");
    Ok(AppJson(quote))
}
