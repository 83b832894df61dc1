use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::{TimeDelta, Utc};

use super::required;
use crate::{
    AppState,
    auth::{password, session},
    config::{AppConfig, Env},
    error::{ApiError, ApiResult, AppJson},
    models::{
        ForgotPasswordRequest, MessageResponse, NewUser, RegisterRequest, ResetPasswordRequest,
        Role, SignInRequest, SignInResponse, SuccessResponse, TokenRequest, TokenValidity, User,
    },
};

/// Email verification links stay valid for a day.
const EMAIL_VERIFICATION_TTL_HOURS: i64 = 24;

const INVALID_TOKEN: &str = "Invalid or expired token";

fn normalize_email(email: &str) -> ApiResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ApiError::validation("Invalid email address")),
    }
}

/// register
///
/// [Public Route] Creates a CUSTOMER or CONTRACTOR account together with its
/// profile, then issues an email verification token. ADMIN accounts cannot be
/// self-registered.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid input", body = crate::error::ErrorBody),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, AppJson<User>)> {
    let email = normalize_email(&payload.email)?;
    password::validate_password_strength(&payload.password)?;

    let business_name = match payload.user_type {
        Role::Admin => return Err(ApiError::validation("Cannot register as admin")),
        Role::Contractor => Some(required(
            payload.business_name,
            "Business name is required for contractors",
        )?),
        Role::Customer => None,
    };

    let token = session::generate_token();
    let expires_at = TimeDelta::try_hours(EMAIL_VERIFICATION_TTL_HOURS)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| ApiError::internal("email verification ttl out of range"))?;

    let user = state
        .repo
        .register_user(NewUser {
            email,
            password_hash: password::hash_password(&payload.password)?,
            name: payload.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            user_type: payload.user_type,
            business_name,
            phone: payload.phone,
            verification_token: token.clone(),
            verification_expires_at: expires_at,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %user.user_type, "account registered");
    if state.config.env == Env::Local {
        tracing::debug!(user_id = %user.id, %token, "email verification token");
    }

    Ok((StatusCode::CREATED, AppJson(user)))
}

/// sign_in
///
/// [Public Route] Exchanges email and password for a session. The token is returned
/// in the body and set as an HttpOnly cookie. Unknown email and wrong password are
/// indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Invalid email or password", body = crate::error::ErrorBody)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignInRequest>,
) -> ApiResult<impl IntoResponse> {
    let invalid = || ApiError::Unauthenticated {
        message: "Invalid email or password".to_string(),
    };

    let email = payload.email.trim().to_lowercase();
    let credentials = state.repo.find_credentials_by_email(&email).await?;

    // Unknown emails still pay for one argon2 verification.
    let stored_hash = credentials.as_ref().map(|c| c.password_hash.as_str());
    if !password::verify_password_or_dummy(&payload.password, stored_hash) {
        tracing::debug!(user_id = ?credentials.as_ref().map(|c| c.user.id), "sign-in rejected");
        return Err(invalid());
    }
    let user = credentials.ok_or_else(invalid)?.user;

    let token = session::issue_token(&user, &state.config)?;
    let cookie = session::session_cookie_header(&token, &state.config)?;

    tracing::info!(user_id = %user.id, "signed in");
    Ok((
        [(header::SET_COOKIE, cookie)],
        AppJson(SignInResponse { token, user }),
    ))
}

/// sign_out
///
/// [Public Route] Expires the session cookie. Bearer tokens stay valid until `exp`.
#[utoipa::path(
    post,
    path = "/api/auth/signout",
    tag = "auth",
    responses((status = 200, description = "Signed out", body = SuccessResponse))
)]
pub async fn sign_out(State(config): State<AppConfig>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, session::clear_session_cookie_header(&config))],
        AppJson(SuccessResponse { success: true }),
    )
}

/// forgot_password
///
/// [Public Route] Issues a reset token when the email belongs to an account. The
/// response is the same either way.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses((status = 200, description = "Request accepted", body = MessageResponse))
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordRequest>,
) -> ApiResult<AppJson<MessageResponse>> {
    let email = required(Some(payload.email), "Email is required")?.to_lowercase();

    if let Some(credentials) = state.repo.find_credentials_by_email(&email).await? {
        let token = session::generate_token();
        let expires_at = TimeDelta::try_minutes(state.config.reset_token_ttl_minutes)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| ApiError::internal("reset token ttl out of range"))?;
        state
            .repo
            .create_reset_token(credentials.user.id, &token, expires_at)
            .await?;

        tracing::info!(user_id = %credentials.user.id, "password reset token issued");
        if state.config.env == Env::Local {
            tracing::debug!(user_id = %credentials.user.id, %token, "password reset token");
        }
    }

    Ok(AppJson(MessageResponse {
        message: "If an account exists for that email, a reset link has been sent".to_string(),
    }))
}

/// verify_reset_token
///
/// [Public Route] Read-only check that a reset token is unused and unexpired.
/// Calling it any number of times does not consume the token.
#[utoipa::path(
    post,
    path = "/api/auth/verify-reset-token",
    tag = "auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token is valid", body = TokenValidity),
        (status = 400, description = "Invalid or expired token", body = crate::error::ErrorBody)
    )
)]
pub async fn verify_reset_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> ApiResult<AppJson<TokenValidity>> {
    let token = required(payload.token, "Token is required")?;

    if state.repo.reset_token_is_valid(&token, Utc::now()).await? {
        Ok(AppJson(TokenValidity { valid: true }))
    } else {
        Err(ApiError::validation(INVALID_TOKEN))
    }
}

/// reset_password
///
/// [Public Route] Consumes the token and stores the new password hash in one
/// transaction. A token can succeed at most once.
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid token or password", body = crate::error::ErrorBody)
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> ApiResult<AppJson<MessageResponse>> {
    let token = required(payload.token, "Token is required")?;
    let new_password = payload
        .password
        .ok_or_else(|| ApiError::validation("Password is required"))?;
    password::validate_password_strength(&new_password)?;

    let hash = password::hash_password(&new_password)?;
    if !state.repo.consume_reset_token(&token, &hash, Utc::now()).await? {
        return Err(ApiError::validation(INVALID_TOKEN));
    }

    Ok(AppJson(MessageResponse {
        message: "Password has been reset".to_string(),
    }))
}

/// verify_email
///
/// [Public Route] Consumes an email verification token and marks the account verified.
#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    tag = "auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = crate::error::ErrorBody)
    )
)]
pub async fn verify_email(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> ApiResult<AppJson<MessageResponse>> {
    let token = required(payload.token, "Token is required")?;

    if !state.repo.consume_email_verification(&token, Utc::now()).await? {
        return Err(ApiError::validation(INVALID_TOKEN));
    }

    Ok(AppJson(MessageResponse {
        message: "Email verified".to_string(),
    }))
}
