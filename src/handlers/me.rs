use axum::extract::State;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, AppJson},
    models::{MeResponse, Role},
};

/// get_me
///
/// [Authenticated Route] The caller's account and the profile that matches their role.
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "account",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Not signed in", body = crate::error::ErrorBody)
    )
)]
pub async fn get_me(user: AuthUser, State(state): State<AppState>) -> ApiResult<AppJson<MeResponse>> {
    // A valid token for a deleted account.
    let account = state
        .repo
        .get_user(user.id)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    let (contractor, customer) = match account.user_type {
        Role::Contractor => (state.repo.get_contractor_by_user(account.id).await?, None),
        Role::Customer => (None, state.repo.get_customer_by_user(account.id).await?),
        Role::Admin => (None, None),
    };

    Ok(AppJson(MeResponse {
        user: account,
        contractor,
        customer,
    }))
}
