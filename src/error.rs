use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{repository::RepositoryError, storage::StorageError};

/// ErrorBody
///
/// The one error envelope every route returns. `code` is only present when a
/// provider failure has a stable machine-readable classification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// ApiError
///
/// Central error taxonomy. Handlers return `Result<_, ApiError>` and never build
/// error responses themselves, so status codes and bodies stay uniform.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Unauthenticated { message: String },

    #[error("{message}")]
    Forbidden { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("{message}")]
    Conflict { message: String },

    /// A third-party provider rejected the call. `status` is the classification we
    /// chose for the client, not the provider's own status.
    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: String,
        code: Option<String>,
    },

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self::Unauthenticated {
            message: "Unauthorized".to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn internal(context: impl Into<String>) -> Self {
        Self::Internal(context.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Repository(RepositoryError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing body. Internal failures collapse to a generic message.
    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::Internal(_) | ApiError::Repository(RepositoryError::Database(_)) => {
                ErrorBody {
                    error: "Internal server error".to_string(),
                    code: None,
                }
            }
            ApiError::Upstream { message, code, .. } => ErrorBody {
                error: message.clone(),
                code: code.clone(),
            },
            other => ErrorBody {
                error: other.to_string(),
                code: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(_) | ApiError::Repository(RepositoryError::Database(_)) => {
                tracing::error!(error = %self, "internal error");
            }
            ApiError::Upstream { .. } => tracing::warn!(error = %self, "upstream provider error"),
            ApiError::Unauthenticated { .. } | ApiError::Forbidden { .. } => {
                tracing::debug!(error = %self, "access denied");
            }
            _ => tracing::debug!(error = %self, "client error"),
        }

        (self.status_code(), Json(self.body())).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnsupportedContentType(content_type) => {
                ApiError::validation(format!("Unsupported content type: {content_type}"))
            }
            StorageError::Backend(detail) => ApiError::internal(format!("media store: {detail}")),
        }
    }
}

/// AppJson
///
/// Drop-in replacement for `axum::Json` whose rejection is an `ApiError`, so a
/// malformed body gets the same `{ error }` envelope as everything else.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

impl<T: Serialize> IntoResponse for AppJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
