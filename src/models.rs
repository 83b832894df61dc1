use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enumerations ---

/// Role
///
/// The `userType` of an account. Every access policy is expressed as a set of these.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "user_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum Role {
    #[default]
    Customer,
    Contractor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Contractor => "CONTRACTOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// QuoteStatus
///
/// Lifecycle of a quote request. Quotes are never deleted; they end in one of the
/// terminal states instead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "quote_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum QuoteStatus {
    #[default]
    Pending,
    Responded,
    Accepted,
    Declined,
    Completed,
    Cancelled,
}

impl QuoteStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QuoteStatus::Declined | QuoteStatus::Completed | QuoteStatus::Cancelled
        )
    }

    /// Whether the normal (non-moderation) workflow allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: QuoteStatus) -> bool {
        use QuoteStatus::*;
        matches!(
            (self, next),
            (Pending, Responded | Declined | Cancelled)
                | (Responded, Accepted | Declined | Cancelled)
                | (Accepted, Completed | Cancelled)
        )
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuoteStatus::Pending => "PENDING",
            QuoteStatus::Responded => "RESPONDED",
            QuoteStatus::Accepted => "ACCEPTED",
            QuoteStatus::Declined => "DECLINED",
            QuoteStatus::Completed => "COMPLETED",
            QuoteStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

// --- Core entities (mapped to the database) ---

/// User
///
/// Account record from the `users` table. The password hash never leaves the repository.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub user_type: Role,
    pub email_verified: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// UserCredentials
///
/// Internal row used only by sign-in: the account plus its Argon2 hash.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Customer
///
/// Profile owned by a `CUSTOMER` account.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Contractor
///
/// Profile owned by a `CONTRACTOR` account. `rating` and `review_count` are
/// aggregates maintained alongside review inserts.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Contractor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub specialties: Vec<String>,
    pub service_area: Option<String>,
    pub is_verified: bool,
    pub rating: f64,
    pub review_count: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// ContractorListing
///
/// Public directory view of a contractor. The owning account id stays private.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ContractorListing {
    pub id: Uuid,
    pub business_name: String,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub specialties: Vec<String>,
    pub service_area: Option<String>,
    pub is_verified: bool,
    pub rating: f64,
    pub review_count: i32,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<Contractor> for ContractorListing {
    fn from(c: Contractor) -> Self {
        Self {
            id: c.id,
            business_name: c.business_name,
            phone: c.phone,
            description: c.description,
            specialties: c.specialties,
            service_area: c.service_area,
            is_verified: c.is_verified,
            rating: c.rating,
            review_count: c.review_count,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Quote
///
/// A customer's request for work addressed to one contractor.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Quote {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub contractor_id: Uuid,
    pub project_type: String,
    pub description: String,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub address: Option<String>,
    pub status: QuoteStatus,
    pub contractor_notes: Option<String>,
    pub estimated_cost: Option<f64>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Review
///
/// A customer's rating of a contractor for one completed quote.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Review {
    pub id: Uuid,
    pub contractor_id: Uuid,
    pub customer_id: Uuid,
    pub quote_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Admin read models ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ContractorSummary {
    pub id: Uuid,
    pub business_name: String,
    pub is_verified: bool,
    pub rating: f64,
    pub review_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub phone: Option<String>,
}

/// AdminUserSummary
///
/// One row of GET /api/admin/users: the account plus whichever profile it owns.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminUserSummary {
    #[serde(flatten)]
    pub user: User,
    pub contractor: Option<ContractorSummary>,
    pub customer: Option<CustomerSummary>,
}

/// AdminQuoteView
///
/// A quote joined with the names and emails of both parties.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminQuoteView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub quote: Quote,
    pub customer_name: Option<String>,
    pub customer_email: String,
    pub contractor_business_name: String,
    pub contractor_email: String,
}

/// AdminStats
///
/// Output of GET /api/admin/stats.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_customers: i64,
    pub total_contractors: i64,
    pub verified_contractors: i64,
    pub total_quotes: i64,
    pub pending_quotes: i64,
    pub total_reviews: i64,
}

// --- Request payloads ---

/// RegisterRequest
///
/// Public sign-up. `business_name` is required when `user_type` is `CONTRACTOR`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub user_type: Role,
    pub business_name: Option<String>,
    pub phone: Option<String>,
}

/// NewUser
///
/// Validated registration handed to the repository; the password is already hashed.
/// The email verification token is stored in the same write as the account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub user_type: Role,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub verification_token: String,
    pub verification_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SignInResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// TokenRequest
///
/// Body of verify-reset-token and verify-email.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TokenRequest {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateQuoteRequest {
    pub contractor_id: Uuid,
    pub project_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// QuoteStatusRequest
///
/// Status change from a customer (accept/cancel) or an admin override.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct QuoteStatusRequest {
    pub status: QuoteStatus,
}

/// LeadUpdateRequest
///
/// A contractor's response to a lead. Notes and estimate are only written when present.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LeadUpdateRequest {
    pub status: QuoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contractor_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
}

/// UpdateContractorRequest
///
/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateContractorRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialties: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_area: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct VerifyContractorRequest {
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateReviewRequest {
    pub quote_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
}

/// MessageRequest
///
/// Body of POST /api/sms and POST /api/voice. Fields are optional so that a missing
/// value produces our own validation message rather than a deserializer error.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MessageRequest {
    pub to: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProviderSendResponse {
    pub success: bool,
    pub message: String,
    pub sid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PresignedUploadRequest {
    #[schema(example = "kitchen.jpg")]
    pub filename: String,
    #[schema(example = "image/jpeg")]
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PresignedUploadResponse {
    /// Time-limited URL for the PUT request.
    pub upload_url: String,
    /// Object key to reference the file afterwards.
    pub resource_key: String,
    pub expires_in_secs: u64,
}

// --- Tool payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDetectionRequest {
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct VoiceTranslationRequest {
    pub text: Option<String>,
    pub target_language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct AiTransformRequest {
    pub image_url: Option<String>,
    pub style: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessageRequest {
    pub message: Option<String>,
}

/// StubStatus
///
/// Marks a response as placeholder output so clients never mistake it for a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum StubStatus {
    Stub,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StubResponse {
    pub status: StubStatus,
    pub feature: String,
    pub message: String,
}

impl StubResponse {
    pub fn for_feature(feature: &str) -> Self {
        Self {
            status: StubStatus::Stub,
            feature: feature.to_string(),
            message: "Not yet implemented".to_string(),
        }
    }
}

// --- Profile / health output ---

/// MeResponse
///
/// GET /api/me: the caller's account plus the profile matching their role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MeResponse {
    pub user: User,
    pub contractor: Option<Contractor>,
    pub customer: Option<Customer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub languages: Vec<String>,
    pub status: StubStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenValidity {
    pub valid: bool,
}
