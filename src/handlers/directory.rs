use axum::extract::{Path, State};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult, AppJson},
    models::ContractorListing,
};

/// list_contractors
///
/// [Public Route] Verified contractors, best rated first. Listings never carry the
/// owning account id.
#[utoipa::path(
    get,
    path = "/api/contractors",
    tag = "contractors",
    responses((status = 200, description = "Verified contractors", body = [ContractorListing]))
)]
pub async fn list_contractors(
    State(state): State<AppState>,
) -> ApiResult<AppJson<Vec<ContractorListing>>> {
    let contractors = state.repo.list_verified_contractors().await?;
    Ok(AppJson(contractors.into_iter().map(ContractorListing::from).collect()))
}

/// get_contractor
///
/// [Public Route] One contractor's public profile. Unverified contractors are not
/// part of the directory and report 404 like missing ones.
#[utoipa::path(
    get,
    path = "/api/contractors/{id}",
    tag = "contractors",
    params(("id" = Uuid, Path, description = "Contractor id")),
    responses(
        (status = 200, description = "Contractor", body = ContractorListing),
        (status = 404, description = "Not found", body = crate::error::ErrorBody)
    )
)]
pub async fn get_contractor(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<AppJson<ContractorListing>> {
    state
        .repo
        .get_contractor(id)
        .await?
        .filter(|c| c.is_verified)
        .map(|c| AppJson(c.into()))
        .ok_or(ApiError::NotFound {
            resource: "Contractor",
        })
}
