use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod providers;
pub mod repository;
pub mod storage;

// Route groups, each behind the access gate for its audience.
pub mod routes;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use providers::{GraderState, MessagingState};
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockMediaStore, S3MediaStore, StorageState};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json` and browsable
/// through Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::register, handlers::auth::sign_in, handlers::auth::sign_out,
        handlers::auth::forgot_password, handlers::auth::verify_reset_token,
        handlers::auth::reset_password, handlers::auth::verify_email,
        handlers::directory::list_contractors, handlers::directory::get_contractor,
        handlers::me::get_me,
        handlers::messaging::send_sms, handlers::messaging::place_call, handlers::messaging::grade,
        handlers::messaging::get_voice_agent, handlers::messaging::message_voice_agent,
        handlers::tools::material_detection, handlers::tools::voice_translation,
        handlers::tools::ai_transform,
        handlers::uploads::get_presigned_upload,
        handlers::customer::create_quote, handlers::customer::list_my_quotes,
        handlers::customer::update_my_quote, handlers::customer::create_review,
        handlers::contractor::get_profile, handlers::contractor::update_profile,
        handlers::contractor::list_leads, handlers::contractor::update_lead,
        handlers::admin::list_users, handlers::admin::list_quotes, handlers::admin::get_stats,
        handlers::admin::verify_contractor, handlers::admin::set_quote_status
    ),
    components(
        schemas(
            error::ErrorBody,
            models::Role, models::QuoteStatus, models::User, models::Customer, models::Contractor,
            models::ContractorListing,
            models::Quote, models::Review, models::ContractorSummary, models::CustomerSummary,
            models::AdminUserSummary, models::AdminQuoteView, models::AdminStats,
            models::RegisterRequest, models::SignInRequest, models::SignInResponse,
            models::ForgotPasswordRequest, models::TokenRequest, models::ResetPasswordRequest,
            models::CreateQuoteRequest, models::QuoteStatusRequest, models::LeadUpdateRequest,
            models::UpdateContractorRequest, models::VerifyContractorRequest,
            models::CreateReviewRequest, models::MessageRequest, models::ProviderSendResponse,
            models::PresignedUploadRequest, models::PresignedUploadResponse,
            models::MaterialDetectionRequest, models::VoiceTranslationRequest,
            models::AiTransformRequest, models::AgentMessageRequest, models::StubStatus,
            models::StubResponse, models::MeResponse, models::HealthResponse, models::AgentInfo,
            models::MessageResponse, models::SuccessResponse, models::TokenValidity,
        )
    ),
    tags(
        (name = "remodel-market", description = "Home remodeling marketplace API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a handler may need, cloned cheaply per request. Collaborators are
/// trait objects so tests can substitute in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub messaging: MessagingState,
    pub grader: GraderState,
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- FromRef: lets extractors pull single components out of AppState ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for MessagingState {
    fn from_ref(app_state: &AppState) -> MessagingState {
        app_state.messaging.clone()
    }
}

impl FromRef<AppState> for GraderState {
    fn from_ref(app_state: &AppState) -> GraderState {
        app_state.grader.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Mounts the API under `/api`, Swagger UI next to it, and wraps everything in the
/// request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", routes::api_routes(&state))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Echo the id back so clients can quote it in bug reports.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request: method, uri and the `x-request-id` set by the layer above,
/// so every log line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
