//! Session tokens: issuing, decoding and carrying them in cookies.

use axum::http::{HeaderMap, header};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::{Role, User},
};

/// Claims
///
/// Payload of a session JWT. The role is embedded so the gate can decide without
/// touching the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: Uuid,
    pub email: String,
    pub user_type: Role,
    pub exp: usize,
    pub iat: usize,
}

/// issue_token
///
/// Signs a session token for `user` valid for `session_ttl_hours`.
pub fn issue_token(user: &User, config: &AppConfig) -> Result<String, ApiError> {
    let now = Utc::now();
    let expires = TimeDelta::try_hours(config.session_ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| ApiError::internal("session ttl out of range"))?;
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        user_type: user.user_type,
        iat: now.timestamp().max(0) as usize,
        exp: expires.timestamp().max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("sign session token: {e}")))
}

/// decode_token
///
/// Any failure (bad signature, malformed, expired) yields `None`; callers treat that
/// exactly like a missing credential.
pub fn decode_token(token: &str, secret: &str) -> Option<Claims> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            tracing::debug!(error = ?e.kind(), "rejected session token");
            None
        }
    }
}

/// bearer_token
///
/// Value of `Authorization: Bearer <token>`, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// session_cookie
///
/// Value of the cookie named `name` across all `Cookie` headers.
pub fn session_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Set-Cookie value carrying a freshly issued session.
pub fn session_cookie_header(token: &str, config: &AppConfig) -> Result<String, ApiError> {
    let max_age = config
        .session_ttl_hours
        .checked_mul(3600)
        .ok_or_else(|| ApiError::internal("session ttl out of range"))?;
    Ok(format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        config.session_cookie_name,
        token,
        max_age,
        secure_flag(config)
    ))
}

/// Set-Cookie value that removes the session cookie.
pub fn clear_session_cookie_header(config: &AppConfig) -> String {
    format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{}",
        config.session_cookie_name,
        secure_flag(config)
    )
}

fn secure_flag(config: &AppConfig) -> &'static str {
    match config.env {
        Env::Production => "; Secure",
        Env::Local => "",
    }
}

/// generate_token
///
/// Opaque one-time token for password resets and email verification: 32 random
/// bytes, base64url without padding.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
