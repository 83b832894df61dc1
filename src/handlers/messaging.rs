use axum::{extract::State, http::StatusCode};
use serde_json::Value;

use super::required;
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, AppJson},
    models::{AgentInfo, AgentMessageRequest, MessageRequest, ProviderSendResponse, StubResponse, StubStatus},
};

const MISSING_FIELDS: &str = "Missing required fields: to, message";

/// is_e164
///
/// `+` followed by 8 to 15 digits, the first non-zero.
fn is_e164(number: &str) -> bool {
    let Some(digits) = number.strip_prefix('+') else {
        return false;
    };
    (8..=15).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0')
}

fn destination_and_body(payload: MessageRequest) -> ApiResult<(String, String)> {
    let to = required(payload.to, MISSING_FIELDS)?;
    let message = required(payload.message, MISSING_FIELDS)?;
    if !is_e164(&to) {
        return Err(ApiError::validation(
            "Phone number must be in E.164 format, e.g. +15551234567",
        ));
    }
    Ok((to, message))
}

/// send_sms
///
/// [Authenticated Route] Sends a text message through the messaging provider.
/// Provider rejections are classified; only caller-fixable ones are 400s.
#[utoipa::path(
    post,
    path = "/api/sms",
    tag = "tools",
    request_body = MessageRequest,
    responses(
        (status = 200, description = "SMS sent", body = ProviderSendResponse),
        (status = 400, description = "Missing fields or unverified number", body = crate::error::ErrorBody),
        (status = 500, description = "Provider failure", body = crate::error::ErrorBody)
    )
)]
pub async fn send_sms(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<MessageRequest>,
) -> ApiResult<AppJson<ProviderSendResponse>> {
    let (to, message) = destination_and_body(payload)?;

    let sid = state
        .messaging
        .send_sms(&to, &message)
        .await
        .map_err(|e| {
            tracing::warn!(user_id = %user.id, error = %e, "sms provider rejected request");
            e.classify("Failed to send SMS")
        })?;

    tracing::info!(user_id = %user.id, %sid, "sms sent");
    Ok(AppJson(ProviderSendResponse {
        success: true,
        message: "SMS sent successfully".to_string(),
        sid,
    }))
}

/// place_call
///
/// [Authenticated Route] Places a voice call that reads the message aloud.
#[utoipa::path(
    post,
    path = "/api/voice",
    tag = "tools",
    request_body = MessageRequest,
    responses(
        (status = 200, description = "Call initiated", body = ProviderSendResponse),
        (status = 400, description = "Missing fields or unverified number", body = crate::error::ErrorBody),
        (status = 500, description = "Provider failure", body = crate::error::ErrorBody)
    )
)]
pub async fn place_call(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<MessageRequest>,
) -> ApiResult<AppJson<ProviderSendResponse>> {
    let (to, message) = destination_and_body(payload)?;

    let sid = state
        .messaging
        .place_call(&to, &message)
        .await
        .map_err(|e| {
            tracing::warn!(user_id = %user.id, error = %e, "voice provider rejected request");
            e.classify("Failed to initiate call")
        })?;

    tracing::info!(user_id = %user.id, %sid, "call initiated");
    Ok(AppJson(ProviderSendResponse {
        success: true,
        message: "Call initiated successfully".to_string(),
        sid,
    }))
}

/// grade
///
/// [Authenticated Route] Forwards a JSON object to the remote scoring service and
/// returns its answer unchanged.
#[utoipa::path(
    post,
    path = "/api/grader",
    tag = "tools",
    responses(
        (status = 200, description = "Grader result, passed through as returned"),
        (status = 400, description = "Body is not a JSON object", body = crate::error::ErrorBody),
        (status = 500, description = "Grader failure", body = crate::error::ErrorBody)
    )
)]
pub async fn grade(
    user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<Value>,
) -> ApiResult<AppJson<Value>> {
    if !payload.is_object() {
        return Err(ApiError::validation("Request body must be a JSON object"));
    }

    let result = state.grader.grade(payload).await.map_err(|e| {
        tracing::warn!(user_id = %user.id, error = %e, "grader call failed");
        e.classify("Grading service unavailable")
    })?;

    Ok(AppJson(result))
}

/// get_voice_agent
///
/// [Authenticated Route] Static description of the voice consultation agent.
#[utoipa::path(
    get,
    path = "/api/voice/sarah-agent",
    tag = "tools",
    responses((status = 200, description = "Agent metadata", body = AgentInfo))
)]
pub async fn get_voice_agent() -> AppJson<AgentInfo> {
    AppJson(AgentInfo {
        id: "sarah-agent".to_string(),
        name: "Sarah".to_string(),
        description: "Voice consultation assistant for remodeling projects".to_string(),
        languages: vec!["en".to_string(), "es".to_string()],
        status: StubStatus::Stub,
    })
}

/// message_voice_agent
///
/// [Authenticated Route] Conversation endpoint of the voice agent. Not implemented.
#[utoipa::path(
    post,
    path = "/api/voice/sarah-agent",
    tag = "tools",
    request_body = AgentMessageRequest,
    responses(
        (status = 400, description = "Missing message", body = crate::error::ErrorBody),
        (status = 501, description = "Not implemented", body = StubResponse)
    )
)]
pub async fn message_voice_agent(
    AppJson(payload): AppJson<AgentMessageRequest>,
) -> ApiResult<(StatusCode, AppJson<StubResponse>)> {
    required(payload.message, "Message is required")?;
    Ok((
        StatusCode::NOT_IMPLEMENTED,
        AppJson(StubResponse::for_feature("sarah-agent")),
    ))
}
