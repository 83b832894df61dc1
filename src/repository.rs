use crate::models::{
    AdminQuoteView, AdminStats, AdminUserSummary, Contractor, ContractorSummary,
    CreateQuoteRequest, CreateReviewRequest, Customer, CustomerSummary, NewUser, Quote,
    QuoteStatus, Review, Role, UpdateContractorRequest, User, UserCredentials,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// RepositoryError
///
/// Persistence failures as seen by the handlers. Unique-constraint violations are
/// separated out because they are client errors (409), everything else is a 500.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                let message = match db_error.constraint() {
                    Some("users_email_key") => "Email already registered",
                    Some("reviews_quote_id_key") => "Quote has already been reviewed",
                    _ => "Resource already exists",
                };
                return RepositoryError::Conflict(message.to_string());
            }
        }
        RepositoryError::Database(error)
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// ReviewOutcome
///
/// Result of the review transaction. Rule violations are reported as values so the
/// handler can pick the status code.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewOutcome {
    Created(Review),
    QuoteNotFound,
    QuoteNotCompleted,
}

/// Repository Trait
///
/// Abstract contract for every persistence operation. Handlers only ever see
/// `Arc<dyn Repository>`, so tests can swap in an in-memory double.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Accounts ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>>;
    // Inserts the account, its role profile and its email verification token in one transaction.
    async fn register_user(&self, user: NewUser) -> RepoResult<User>;

    // --- Profiles ---
    async fn get_customer_by_user(&self, user_id: Uuid) -> RepoResult<Option<Customer>>;
    async fn get_contractor_by_user(&self, user_id: Uuid) -> RepoResult<Option<Contractor>>;
    async fn get_contractor(&self, id: Uuid) -> RepoResult<Option<Contractor>>;
    async fn list_verified_contractors(&self) -> RepoResult<Vec<Contractor>>;
    async fn update_contractor_profile(
        &self,
        user_id: Uuid,
        req: UpdateContractorRequest,
    ) -> RepoResult<Option<Contractor>>;
    async fn set_contractor_verified(&self, id: Uuid, verified: bool) -> RepoResult<Option<Contractor>>;

    // --- Quotes ---
    async fn create_quote(&self, customer_id: Uuid, req: CreateQuoteRequest) -> RepoResult<Quote>;
    async fn get_quote(&self, id: Uuid) -> RepoResult<Option<Quote>>;
    async fn list_customer_quotes(&self, customer_id: Uuid) -> RepoResult<Vec<Quote>>;
    async fn list_contractor_quotes(&self, contractor_id: Uuid) -> RepoResult<Vec<Quote>>;
    /// Compare-and-set: only applies when the quote is still in `expected`.
    /// Returns `None` when the quote moved on (or does not exist).
    async fn transition_quote(
        &self,
        id: Uuid,
        expected: QuoteStatus,
        next: QuoteStatus,
        contractor_notes: Option<String>,
        estimated_cost: Option<f64>,
    ) -> RepoResult<Option<Quote>>;
    /// Admin override, no workflow check.
    async fn set_quote_status(&self, id: Uuid, status: QuoteStatus) -> RepoResult<Option<Quote>>;

    // --- Reviews ---
    async fn create_review(&self, customer_id: Uuid, req: CreateReviewRequest) -> RepoResult<ReviewOutcome>;

    // --- Admin ---
    async fn list_users_admin(&self) -> RepoResult<Vec<AdminUserSummary>>;
    async fn list_quotes_admin(&self) -> RepoResult<Vec<AdminQuoteView>>;
    async fn get_stats(&self) -> RepoResult<AdminStats>;

    // --- One-time tokens ---
    async fn create_reset_token(&self, user_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> RepoResult<()>;
    // Read-only: unused and not expired at `now`.
    async fn reset_token_is_valid(&self, token: &str, now: DateTime<Utc>) -> RepoResult<bool>;
    // Verifies and consumes the token and stores the new hash atomically.
    async fn consume_reset_token(&self, token: &str, password_hash: &str, now: DateTime<Utc>) -> RepoResult<bool>;
    async fn consume_email_verification(&self, token: &str, now: DateTime<Utc>) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The shared handle stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, email, name, user_type, email_verified, created_at";
const CUSTOMER_COLUMNS: &str = "id, user_id, phone, address, created_at";
const CONTRACTOR_COLUMNS: &str = "id, user_id, business_name, phone, description, specialties, service_area, is_verified, rating, review_count, created_at, updated_at";
const QUOTE_COLUMNS: &str = "id, customer_id, contractor_id, project_type, description, budget, timeline, address, status, contractor_notes, estimated_cost, created_at, updated_at";
const REVIEW_COLUMNS: &str = "id, contractor_id, customer_id, quote_id, rating, comment, created_at";

/// Flat LEFT JOIN row behind `list_users_admin`.
#[derive(FromRow)]
struct AdminUserRow {
    #[sqlx(flatten)]
    user: User,
    contractor_id: Option<Uuid>,
    business_name: Option<String>,
    is_verified: Option<bool>,
    rating: Option<f64>,
    review_count: Option<i32>,
    customer_id: Option<Uuid>,
    customer_phone: Option<String>,
}

impl From<AdminUserRow> for AdminUserSummary {
    fn from(row: AdminUserRow) -> Self {
        let contractor = row.contractor_id.map(|id| ContractorSummary {
            id,
            business_name: row.business_name.unwrap_or_default(),
            is_verified: row.is_verified.unwrap_or(false),
            rating: row.rating.unwrap_or(0.0),
            review_count: row.review_count.unwrap_or(0),
        });
        let customer = row.customer_id.map(|id| CustomerSummary {
            id,
            phone: row.customer_phone,
        });
        AdminUserSummary {
            user: row.user,
            contractor,
            customer,
        }
    }
}

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL through a shared connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        let creds = sqlx::query_as::<_, UserCredentials>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(creds)
    }

    /// register_user
    ///
    /// A `CONTRACTOR` always gets a contractor row and a `CUSTOMER` a customer row.
    /// The account, the profile and the verification token commit together or not at all.
    async fn register_user(&self, new_user: NewUser) -> RepoResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, name, password_hash, user_type) VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .bind(new_user.user_type)
        .fetch_one(&mut *tx)
        .await?;

        match user.user_type {
            Role::Contractor => {
                sqlx::query(
                    "INSERT INTO contractors (id, user_id, business_name, phone) VALUES ($1, $2, $3, $4)",
                )
                .bind(Uuid::new_v4())
                .bind(user.id)
                .bind(new_user.business_name.unwrap_or_default())
                .bind(&new_user.phone)
                .execute(&mut *tx)
                .await?;
            }
            Role::Customer => {
                sqlx::query("INSERT INTO customers (id, user_id, phone) VALUES ($1, $2, $3)")
                    .bind(Uuid::new_v4())
                    .bind(user.id)
                    .bind(&new_user.phone)
                    .execute(&mut *tx)
                    .await?;
            }
            Role::Admin => {}
        }

        sqlx::query("INSERT INTO email_verification_tokens (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&new_user.verification_token)
            .bind(user.id)
            .bind(new_user.verification_expires_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn get_customer_by_user(&self, user_id: Uuid) -> RepoResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    async fn get_contractor_by_user(&self, user_id: Uuid) -> RepoResult<Option<Contractor>> {
        let contractor = sqlx::query_as::<_, Contractor>(&format!(
            "SELECT {CONTRACTOR_COLUMNS} FROM contractors WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contractor)
    }

    async fn get_contractor(&self, id: Uuid) -> RepoResult<Option<Contractor>> {
        let contractor = sqlx::query_as::<_, Contractor>(&format!(
            "SELECT {CONTRACTOR_COLUMNS} FROM contractors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contractor)
    }

    async fn list_verified_contractors(&self) -> RepoResult<Vec<Contractor>> {
        let contractors = sqlx::query_as::<_, Contractor>(&format!(
            "SELECT {CONTRACTOR_COLUMNS} FROM contractors WHERE is_verified = true ORDER BY rating DESC, review_count DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(contractors)
    }

    /// update_contractor_profile
    ///
    /// COALESCE keeps the stored value for every field left as `None`.
    async fn update_contractor_profile(
        &self,
        user_id: Uuid,
        req: UpdateContractorRequest,
    ) -> RepoResult<Option<Contractor>> {
        let contractor = sqlx::query_as::<_, Contractor>(&format!(
            r#"
            UPDATE contractors
            SET business_name = COALESCE($2, business_name),
                phone = COALESCE($3, phone),
                description = COALESCE($4, description),
                specialties = COALESCE($5, specialties),
                service_area = COALESCE($6, service_area),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {CONTRACTOR_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(req.business_name)
        .bind(req.phone)
        .bind(req.description)
        .bind(req.specialties)
        .bind(req.service_area)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contractor)
    }

    async fn set_contractor_verified(&self, id: Uuid, verified: bool) -> RepoResult<Option<Contractor>> {
        let contractor = sqlx::query_as::<_, Contractor>(&format!(
            "UPDATE contractors SET is_verified = $2, updated_at = NOW() WHERE id = $1 RETURNING {CONTRACTOR_COLUMNS}"
        ))
        .bind(id)
        .bind(verified)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contractor)
    }

    async fn create_quote(&self, customer_id: Uuid, req: CreateQuoteRequest) -> RepoResult<Quote> {
        let quote = sqlx::query_as::<_, Quote>(&format!(
            r#"
            INSERT INTO quotes (id, customer_id, contractor_id, project_type, description, budget, timeline, address, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'PENDING')
            RETURNING {QUOTE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(customer_id)
        .bind(req.contractor_id)
        .bind(req.project_type)
        .bind(req.description)
        .bind(req.budget)
        .bind(req.timeline)
        .bind(req.address)
        .fetch_one(&self.pool)
        .await?;
        Ok(quote)
    }

    async fn get_quote(&self, id: Uuid) -> RepoResult<Option<Quote>> {
        let quote = sqlx::query_as::<_, Quote>(&format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(quote)
    }

    async fn list_customer_quotes(&self, customer_id: Uuid) -> RepoResult<Vec<Quote>> {
        let quotes = sqlx::query_as::<_, Quote>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes WHERE customer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(quotes)
    }

    async fn list_contractor_quotes(&self, contractor_id: Uuid) -> RepoResult<Vec<Quote>> {
        let quotes = sqlx::query_as::<_, Quote>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes WHERE contractor_id = $1 ORDER BY created_at DESC"
        ))
        .bind(contractor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(quotes)
    }

    async fn transition_quote(
        &self,
        id: Uuid,
        expected: QuoteStatus,
        next: QuoteStatus,
        contractor_notes: Option<String>,
        estimated_cost: Option<f64>,
    ) -> RepoResult<Option<Quote>> {
        let quote = sqlx::query_as::<_, Quote>(&format!(
            r#"
            UPDATE quotes
            SET status = $3,
                contractor_notes = COALESCE($4, contractor_notes),
                estimated_cost = COALESCE($5, estimated_cost),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {QUOTE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(expected)
        .bind(next)
        .bind(contractor_notes)
        .bind(estimated_cost)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quote)
    }

    async fn set_quote_status(&self, id: Uuid, status: QuoteStatus) -> RepoResult<Option<Quote>> {
        let quote = sqlx::query_as::<_, Quote>(&format!(
            "UPDATE quotes SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {QUOTE_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quote)
    }

    /// create_review
    ///
    /// Locks the quote and the contractor row, inserts the review and recomputes the
    /// contractor's rating aggregates before committing.
    async fn create_review(&self, customer_id: Uuid, req: CreateReviewRequest) -> RepoResult<ReviewOutcome> {
        let mut tx = self.pool.begin().await?;

        let quote = sqlx::query_as::<_, Quote>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = $1 FOR UPDATE"
        ))
        .bind(req.quote_id)
        .fetch_optional(&mut *tx)
        .await?;

        let quote = match quote {
            Some(q) if q.customer_id == customer_id => q,
            _ => return Ok(ReviewOutcome::QuoteNotFound),
        };
        if quote.status != QuoteStatus::Completed {
            return Ok(ReviewOutcome::QuoteNotCompleted);
        }

        // Serializes concurrent aggregate updates for the same contractor.
        sqlx::query("SELECT id FROM contractors WHERE id = $1 FOR UPDATE")
            .bind(quote.contractor_id)
            .execute(&mut *tx)
            .await?;

        let review = sqlx::query_as::<_, Review>(&format!(
            "INSERT INTO reviews (id, contractor_id, customer_id, quote_id, rating, comment) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(quote.contractor_id)
        .bind(customer_id)
        .bind(quote.id)
        .bind(req.rating)
        .bind(req.comment)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE contractors
            SET rating = COALESCE((SELECT AVG(rating)::float8 FROM reviews WHERE contractor_id = $1), 0),
                review_count = (SELECT COUNT(*)::int4 FROM reviews WHERE contractor_id = $1),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(quote.contractor_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ReviewOutcome::Created(review))
    }

    async fn list_users_admin(&self) -> RepoResult<Vec<AdminUserSummary>> {
        let rows = sqlx::query_as::<_, AdminUserRow>(
            r#"
            SELECT u.id, u.email, u.name, u.user_type, u.email_verified, u.created_at,
                   c.id AS contractor_id, c.business_name, c.is_verified, c.rating, c.review_count,
                   cu.id AS customer_id, cu.phone AS customer_phone
            FROM users u
            LEFT JOIN contractors c ON c.user_id = u.id
            LEFT JOIN customers cu ON cu.user_id = u.id
            ORDER BY u.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AdminUserSummary::from).collect())
    }

    async fn list_quotes_admin(&self) -> RepoResult<Vec<AdminQuoteView>> {
        let quotes = sqlx::query_as::<_, AdminQuoteView>(
            r#"
            SELECT q.id, q.customer_id, q.contractor_id, q.project_type, q.description, q.budget,
                   q.timeline, q.address, q.status, q.contractor_notes, q.estimated_cost,
                   q.created_at, q.updated_at,
                   cu_user.name AS customer_name,
                   cu_user.email AS customer_email,
                   c.business_name AS contractor_business_name,
                   c_user.email AS contractor_email
            FROM quotes q
            JOIN customers cu ON cu.id = q.customer_id
            JOIN users cu_user ON cu_user.id = cu.user_id
            JOIN contractors c ON c.id = q.contractor_id
            JOIN users c_user ON c_user.id = c.user_id
            ORDER BY q.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(quotes)
    }

    async fn get_stats(&self) -> RepoResult<AdminStats> {
        let stats = sqlx::query_as::<_, AdminStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM customers) AS total_customers,
                (SELECT COUNT(*) FROM contractors) AS total_contractors,
                (SELECT COUNT(*) FROM contractors WHERE is_verified = true) AS verified_contractors,
                (SELECT COUNT(*) FROM quotes) AS total_quotes,
                (SELECT COUNT(*) FROM quotes WHERE status = 'PENDING') AS pending_quotes,
                (SELECT COUNT(*) FROM reviews) AS total_reviews
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn create_reset_token(&self, user_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> RepoResult<()> {
        sqlx::query("INSERT INTO password_reset_tokens (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reset_token_is_valid(&self, token: &str, now: DateTime<Utc>) -> RepoResult<bool> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM password_reset_tokens WHERE token = $1 AND used_at IS NULL AND expires_at > $2",
        )
        .bind(token)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(found > 0)
    }

    /// consume_reset_token
    ///
    /// The token row is locked for the whole transaction, so two concurrent resets
    /// with the same token cannot both succeed.
    async fn consume_reset_token(&self, token: &str, password_hash: &str, now: DateTime<Utc>) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM password_reset_tokens WHERE token = $1 AND used_at IS NULL AND expires_at > $2 FOR UPDATE",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            return Ok(false);
        };

        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        // Burn every outstanding token for the account, not just this one.
        sqlx::query("UPDATE password_reset_tokens SET used_at = $2 WHERE user_id = $1 AND used_at IS NULL")
            .bind(user_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn consume_email_verification(&self, token: &str, now: DateTime<Utc>) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM email_verification_tokens WHERE token = $1 AND expires_at > $2 RETURNING user_id",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user_id) = user_id else {
            return Ok(false);
        };

        sqlx::query("UPDATE users SET email_verified = true, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
