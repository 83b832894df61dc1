use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{customer_profile, required};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, AppJson},
    models::{CreateQuoteRequest, CreateReviewRequest, Quote, QuoteStatus, QuoteStatusRequest, Review},
    repository::ReviewOutcome,
};

/// create_quote
///
/// [Customer Route] Requests a quote from a contractor listed in the directory.
/// New quotes always start PENDING.
#[utoipa::path(
    post,
    path = "/api/quotes",
    tag = "customer",
    request_body = CreateQuoteRequest,
    responses(
        (status = 201, description = "Quote requested", body = Quote),
        (status = 400, description = "Invalid input", body = crate::error::ErrorBody),
        (status = 404, description = "Contractor not found", body = crate::error::ErrorBody)
    )
)]
pub async fn create_quote(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<CreateQuoteRequest>,
) -> ApiResult<(StatusCode, AppJson<Quote>)> {
    payload.project_type = required(Some(payload.project_type), "Project type is required")?;
    payload.description = required(Some(payload.description), "Description is required")?;

    let customer = customer_profile(&state.repo, &user).await?;

    let contractor_listed = state
        .repo
        .get_contractor(payload.contractor_id)
        .await?
        .is_some_and(|c| c.is_verified);
    if !contractor_listed {
        return Err(ApiError::NotFound {
            resource: "Contractor",
        });
    }

    let quote = state.repo.create_quote(customer.id, payload).await?;
    tracing::info!(quote_id = %quote.id, contractor_id = %quote.contractor_id, "quote requested");
    Ok((StatusCode::CREATED, AppJson(quote)))
}

/// list_my_quotes
///
/// [Customer Route] Quotes the caller has requested, newest first.
#[utoipa::path(
    get,
    path = "/api/customer/quotes",
    tag = "customer",
    responses((status = 200, description = "My quotes", body = [Quote]))
)]
pub async fn list_my_quotes(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<AppJson<Vec<Quote>>> {
    let customer = customer_profile(&state.repo, &user).await?;
    Ok(AppJson(state.repo.list_customer_quotes(customer.id).await?))
}

/// update_my_quote
///
/// [Customer Route] Accepts or cancels one of the caller's quotes. The change is a
/// compare-and-set against the status that was read, so two racing updates cannot
/// both win.
#[utoipa::path(
    patch,
    path = "/api/customer/quotes/{id}",
    tag = "customer",
    params(("id" = Uuid, Path, description = "Quote id")),
    request_body = QuoteStatusRequest,
    responses(
        (status = 200, description = "Quote updated", body = Quote),
        (status = 400, description = "Status not allowed for customers", body = crate::error::ErrorBody),
        (status = 404, description = "Quote not found", body = crate::error::ErrorBody),
        (status = 409, description = "Transition not allowed", body = crate::error::ErrorBody)
    )
)]
pub async fn update_my_quote(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<QuoteStatusRequest>,
) -> ApiResult<AppJson<Quote>> {
    let next = payload.status;
    if !matches!(next, QuoteStatus::Accepted | QuoteStatus::Cancelled) {
        return Err(ApiError::validation(
            "Customers may only accept or cancel quotes",
        ));
    }

    let customer = customer_profile(&state.repo, &user).await?;
    let quote = state
        .repo
        .get_quote(id)
        .await?
        .filter(|q| q.customer_id == customer.id)
        .ok_or(ApiError::NotFound { resource: "Quote" })?;

    apply_transition(&state, quote, next, None, None).await.map(AppJson)
}

/// apply_transition
///
/// Shared by the customer and contractor workflows: checks the transition table,
/// then writes with a compare-and-set on the status that was read.
pub(crate) async fn apply_transition(
    state: &AppState,
    quote: Quote,
    next: QuoteStatus,
    contractor_notes: Option<String>,
    estimated_cost: Option<f64>,
) -> ApiResult<Quote> {
    if !quote.status.can_transition_to(next) {
        return Err(ApiError::conflict(format!(
            "Cannot change quote status from {} to {}",
            quote.status, next
        )));
    }

    let updated = state
        .repo
        .transition_quote(quote.id, quote.status, next, contractor_notes, estimated_cost)
        .await?
        .ok_or_else(|| ApiError::conflict("Quote was modified by another request"))?;

    tracing::info!(quote_id = %updated.id, from = %quote.status, to = %next, "quote status changed");
    Ok(updated)
}

/// create_review
///
/// [Customer Route] Reviews the contractor on one of the caller's COMPLETED quotes.
/// One review per quote; the contractor's rating aggregates are updated with it.
#[utoipa::path(
    post,
    path = "/api/customer/reviews",
    tag = "customer",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 400, description = "Invalid rating or quote not completed", body = crate::error::ErrorBody),
        (status = 404, description = "Quote not found", body = crate::error::ErrorBody),
        (status = 409, description = "Quote already reviewed", body = crate::error::ErrorBody)
    )
)]
pub async fn create_review(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> ApiResult<(StatusCode, AppJson<Review>)> {
    if !(1..=5).contains(&payload.rating) {
        return Err(ApiError::validation("Rating must be between 1 and 5"));
    }

    let customer = customer_profile(&state.repo, &user).await?;
    match state.repo.create_review(customer.id, payload).await? {
        ReviewOutcome::Created(review) => Ok((StatusCode::CREATED, AppJson(review))),
        ReviewOutcome::QuoteNotFound => Err(ApiError::NotFound { resource: "Quote" }),
        ReviewOutcome::QuoteNotCompleted => Err(ApiError::validation(
            "Only completed quotes can be reviewed",
        )),
    }
}
