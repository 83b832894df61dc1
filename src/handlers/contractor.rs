use axum::extract::{Path, State};
use uuid::Uuid;

use super::{contractor_profile, customer::apply_transition};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, AppJson},
    models::{Contractor, LeadUpdateRequest, Quote, QuoteStatus, UpdateContractorRequest},
};

/// get_profile
///
/// [Contractor Route] The caller's own profile, including unverified state.
#[utoipa::path(
    get,
    path = "/api/contractor/profile",
    tag = "contractor",
    responses(
        (status = 200, description = "Profile", body = Contractor),
        (status = 404, description = "No contractor profile", body = crate::error::ErrorBody)
    )
)]
pub async fn get_profile(user: AuthUser, State(state): State<AppState>) -> ApiResult<AppJson<Contractor>> {
    contractor_profile(&state.repo, &user).await.map(AppJson)
}

/// update_profile
///
/// [Contractor Route] Partial update: absent fields keep their stored value.
/// Verification and rating are not editable here.
#[utoipa::path(
    put,
    path = "/api/contractor/profile",
    tag = "contractor",
    request_body = UpdateContractorRequest,
    responses(
        (status = 200, description = "Profile updated", body = Contractor),
        (status = 400, description = "Invalid input", body = crate::error::ErrorBody),
        (status = 404, description = "No contractor profile", body = crate::error::ErrorBody)
    )
)]
pub async fn update_profile(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<UpdateContractorRequest>,
) -> ApiResult<AppJson<Contractor>> {
    if let Some(name) = payload.business_name.as_deref() {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("Business name cannot be empty"));
        }
        payload.business_name = Some(name.to_string());
    }
    if let Some(specialties) = payload.specialties.as_mut() {
        specialties.retain(|s| !s.trim().is_empty());
    }

    state
        .repo
        .update_contractor_profile(user.id, payload)
        .await?
        .map(AppJson)
        .ok_or(ApiError::NotFound {
            resource: "Contractor profile",
        })
}

/// list_leads
///
/// [Contractor Route] Quotes addressed to the caller, newest first.
#[utoipa::path(
    get,
    path = "/api/contractor/leads",
    tag = "contractor",
    responses((status = 200, description = "Leads", body = [Quote]))
)]
pub async fn list_leads(user: AuthUser, State(state): State<AppState>) -> ApiResult<AppJson<Vec<Quote>>> {
    let contractor = contractor_profile(&state.repo, &user).await?;
    Ok(AppJson(state.repo.list_contractor_quotes(contractor.id).await?))
}

/// update_lead
///
/// [Contractor Route] Responds to, declines or completes a lead, optionally with
/// notes and an estimate. Leads addressed to someone else report 404.
#[utoipa::path(
    patch,
    path = "/api/contractor/leads/{id}",
    tag = "contractor",
    params(("id" = Uuid, Path, description = "Quote id")),
    request_body = LeadUpdateRequest,
    responses(
        (status = 200, description = "Lead updated", body = Quote),
        (status = 400, description = "Status not allowed for contractors", body = crate::error::ErrorBody),
        (status = 404, description = "Lead not found", body = crate::error::ErrorBody),
        (status = 409, description = "Transition not allowed", body = crate::error::ErrorBody)
    )
)]
pub async fn update_lead(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<LeadUpdateRequest>,
) -> ApiResult<AppJson<Quote>> {
    let next = payload.status;
    if !matches!(
        next,
        QuoteStatus::Responded | QuoteStatus::Declined | QuoteStatus::Completed
    ) {
        return Err(ApiError::validation(
            "Contractors may only respond to, decline or complete leads",
        ));
    }
    if payload.estimated_cost.is_some_and(|cost| !cost.is_finite() || cost < 0.0) {
        return Err(ApiError::validation("Estimated cost must be a non-negative number"));
    }

    let contractor = contractor_profile(&state.repo, &user).await?;
    let quote = state
        .repo
        .get_quote(id)
        .await?
        .filter(|q| q.contractor_id == contractor.id)
        .ok_or(ApiError::NotFound { resource: "Lead" })?;

    let notes = payload
        .contractor_notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    apply_transition(&state, quote, next, notes, payload.estimated_cost)
        .await
        .map(AppJson)
}
