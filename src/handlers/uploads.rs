use axum::extract::State;

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiResult, AppJson},
    models::{PresignedUploadRequest, PresignedUploadResponse},
    storage::{self, UPLOAD_URL_TTL},
};

/// get_presigned_upload
///
/// [Authenticated Route] Issues a short-lived PUT URL for a project photo. The object
/// key is generated server-side under the caller's prefix; the client filename is
/// only logged.
#[utoipa::path(
    post,
    path = "/api/uploads/presigned",
    tag = "uploads",
    request_body = PresignedUploadRequest,
    responses(
        (status = 200, description = "Upload URL", body = PresignedUploadResponse),
        (status = 400, description = "Unsupported content type", body = crate::error::ErrorBody),
        (status = 500, description = "Storage unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn get_presigned_upload(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<PresignedUploadRequest>,
) -> ApiResult<AppJson<PresignedUploadResponse>> {
    let key = storage::quote_photo_key(user.id, &payload.content_type)?;
    let upload_url = state
        .storage
        .presign_upload(&key, &payload.content_type)
        .await?;

    tracing::debug!(user_id = %user.id, filename = %payload.filename, %key, "presigned upload issued");
    Ok(AppJson(PresignedUploadResponse {
        upload_url,
        resource_key: key,
        expires_in_secs: UPLOAD_URL_TTL.as_secs(),
    }))
}
