//! Project tools with no backing implementation yet. Each validates its input and
//! answers 501 with a `status: "stub"` body, never with made-up results.

use axum::http::StatusCode;

use super::required;
use crate::{
    error::{ApiResult, AppJson},
    models::{AiTransformRequest, MaterialDetectionRequest, StubResponse, VoiceTranslationRequest},
};

type StubReply = ApiResult<(StatusCode, AppJson<StubResponse>)>;

fn not_implemented(feature: &str) -> StubReply {
    Ok((
        StatusCode::NOT_IMPLEMENTED,
        AppJson(StubResponse::for_feature(feature)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/tools/material-detection",
    tag = "tools",
    request_body = MaterialDetectionRequest,
    responses(
        (status = 400, description = "Missing imageUrl", body = crate::error::ErrorBody),
        (status = 501, description = "Not implemented", body = StubResponse)
    )
)]
pub async fn material_detection(AppJson(payload): AppJson<MaterialDetectionRequest>) -> StubReply {
    required(payload.image_url, "imageUrl is required")?;
    not_implemented("material-detection")
}

#[utoipa::path(
    post,
    path = "/api/tools/voice-translation",
    tag = "tools",
    request_body = VoiceTranslationRequest,
    responses(
        (status = 400, description = "Missing text or targetLanguage", body = crate::error::ErrorBody),
        (status = 501, description = "Not implemented", body = StubResponse)
    )
)]
pub async fn voice_translation(AppJson(payload): AppJson<VoiceTranslationRequest>) -> StubReply {
    required(payload.text, "text is required")?;
    required(payload.target_language, "targetLanguage is required")?;
    not_implemented("voice-translation")
}

#[utoipa::path(
    post,
    path = "/api/tools/ai-transform",
    tag = "tools",
    request_body = AiTransformRequest,
    responses(
        (status = 400, description = "Missing imageUrl or style", body = crate::error::ErrorBody),
        (status = 501, description = "Not implemented", body = StubResponse)
    )
)]
pub async fn ai_transform(AppJson(payload): AppJson<AiTransformRequest>) -> StubReply {
    required(payload.image_url, "imageUrl is required")?;
    required(payload.style, "style is required")?;
    not_implemented("ai-transform")
}
