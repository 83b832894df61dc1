//! HTTP handlers, grouped by who may call them. Authorization happens in the
//! access gate in front of each route group; handlers only receive `AuthUser`.

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult},
    models::{Contractor, Customer},
    repository::RepositoryState,
};

pub mod admin;
pub mod auth;
pub mod contractor;
pub mod customer;
pub mod directory;
pub mod health;
pub mod me;
pub mod messaging;
pub mod tools;
pub mod uploads;

/// required
///
/// Trimmed value of a required text field; blank counts as missing.
pub(crate) fn required(value: Option<String>, message: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(message))
}

/// The caller's customer profile. A CUSTOMER without one is a data error, reported as 404.
pub(crate) async fn customer_profile(repo: &RepositoryState, user: &AuthUser) -> ApiResult<Customer> {
    repo.get_customer_by_user(user.id)
        .await?
        .ok_or(ApiError::NotFound {
            resource: "Customer profile",
        })
}

pub(crate) async fn contractor_profile(
    repo: &RepositoryState,
    user: &AuthUser,
) -> ApiResult<Contractor> {
    repo.get_contractor_by_user(user.id)
        .await?
        .ok_or(ApiError::NotFound {
            resource: "Contractor profile",
        })
}
