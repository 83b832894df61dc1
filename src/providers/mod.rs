//! Third-party collaborators reached over HTTP. Each one is a trait with a real
//! client and a mock, shared through `AppState` as `Arc<dyn ...>`.

use axum::http::StatusCode;
use thiserror::Error;

use crate::error::ApiError;

pub mod grader;
pub mod twilio;

pub use grader::{GraderService, GraderState, HttpGrader, MockGrader};
pub use twilio::{MessagingService, MessagingState, MockMessagingService, TwilioClient};

/// Twilio: trial accounts may only message verified numbers.
pub const TWILIO_UNVERIFIED_NUMBER: i64 = 21219;
/// Twilio: the 'To' number is not a valid phone number.
pub const TWILIO_INVALID_NUMBER: i64 = 21211;

/// ProviderError
///
/// A failed call to a hosted provider. `code` is the provider's own error code when
/// it returned one.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("provider error (status {status:?}, code {code:?}): {message}")]
pub struct ProviderError {
    pub status: Option<u16>,
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    /// classify
    ///
    /// Maps a provider failure onto the client-facing taxonomy. Only failures the
    /// caller can fix are 400s; the rest are 500s and carry `fallback` as message.
    pub fn classify(&self, fallback: &str) -> ApiError {
        match self.code {
            Some(TWILIO_UNVERIFIED_NUMBER) => ApiError::Upstream {
                status: StatusCode::BAD_REQUEST,
                message: "This number is not verified. Trial accounts can only contact verified numbers."
                    .to_string(),
                code: Some("UNVERIFIED_NUMBER".to_string()),
            },
            Some(TWILIO_INVALID_NUMBER) => ApiError::Upstream {
                status: StatusCode::BAD_REQUEST,
                message: "Invalid phone number".to_string(),
                code: Some("INVALID_NUMBER".to_string()),
            },
            _ => ApiError::Upstream {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: fallback.to_string(),
                code: Some("UPSTREAM_ERROR".to_string()),
            },
        }
    }
}
