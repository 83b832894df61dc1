//! Password hashing and verification.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use once_cell::sync::Lazy;

use crate::{auth::session, error::ApiError};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash of a random secret, verified against when an account does not exist.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password(&session::generate_token()).ok());

/// Hash a password with Argon2id and a random salt (PHC string format).
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("hash password: {e}")))
}

/// Verify a password against a stored PHC hash. An unparsable hash never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Like [`verify_password`], but with no stored hash it still runs one argon2
/// verification against [`DUMMY_HASH`] and then returns `false`.
pub fn verify_password_or_dummy(password: &str, stored_hash: Option<&str>) -> bool {
    match stored_hash {
        Some(hash) => verify_password(password, hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(password, dummy);
            }
            false
        }
    }
}

pub fn validate_password_strength(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
