//! Runs against a real Postgres. Ignored by default; run with
//! `DATABASE_URL=... cargo test -- --ignored`.

use chrono::{Duration, Utc};
use remodel_market::{
    models::{CreateQuoteRequest, CreateReviewRequest, NewUser, QuoteStatus, Role, User},
    repository::{PostgresRepository, Repository, RepositoryError, ReviewOutcome},
};
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// Registers an account with a unique email so runs never collide.
async fn register(repo: &PostgresRepository, role: Role) -> User {
    repo.register_user(NewUser {
        email: format!("{}@test.example.com", Uuid::new_v4()),
        password_hash: "not-a-real-hash".to_string(),
        name: Some("Test".to_string()),
        user_type: role,
        business_name: (role == Role::Contractor).then(|| "Test Builds".to_string()),
        phone: None,
        verification_token: Uuid::new_v4().to_string(),
        verification_expires_at: Utc::now() + Duration::hours(24),
    })
    .await
    .expect("Failed to register test user")
}

/// A customer, a verified contractor and one PENDING quote between them.
async fn quote_fixture(repo: &PostgresRepository) -> (Uuid, Uuid, Uuid) {
    let customer_user = register(repo, Role::Customer).await;
    let contractor_user = register(repo, Role::Contractor).await;

    let customer = repo.get_customer_by_user(customer_user.id).await.unwrap().unwrap();
    let contractor = repo.get_contractor_by_user(contractor_user.id).await.unwrap().unwrap();
    repo.set_contractor_verified(contractor.id, true).await.unwrap();

    let quote = repo
        .create_quote(
            customer.id,
            CreateQuoteRequest {
                contractor_id: contractor.id,
                project_type: "Kitchen".to_string(),
                description: "New cabinets".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    (customer.id, contractor.id, quote.id)
}

// --- Tests ---

#[tokio::test]
#[ignore]
async fn test_register_creates_matching_profile() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let contractor_user = register(&repo, Role::Contractor).await;
    let profile = repo.get_contractor_by_user(contractor_user.id).await.unwrap();

    assert_eq!(profile.unwrap().business_name, "Test Builds");
    assert!(repo.get_customer_by_user(contractor_user.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore]
async fn test_duplicate_email_is_a_conflict() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = register(&repo, Role::Customer).await;
    let token = Uuid::new_v4().to_string();

    let err = repo
        .register_user(NewUser {
            email: user.email.clone(),
            password_hash: "x".to_string(),
            name: None,
            user_type: Role::Customer,
            business_name: None,
            phone: None,
            verification_token: token.clone(),
            verification_expires_at: Utc::now() + Duration::hours(24),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::Conflict(ref m) if m == "Email already registered"));
    // The failed registration rolled back its token along with the account.
    assert!(!repo.consume_email_verification(&token, Utc::now()).await.unwrap());
}

#[tokio::test]
#[ignore]
async fn test_register_token_verifies_new_account() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let token = Uuid::new_v4().to_string();

    let user = repo
        .register_user(NewUser {
            email: format!("{}@test.example.com", Uuid::new_v4()),
            password_hash: "not-a-real-hash".to_string(),
            name: None,
            user_type: Role::Customer,
            business_name: None,
            phone: None,
            verification_token: token.clone(),
            verification_expires_at: Utc::now() + Duration::hours(24),
        })
        .await
        .unwrap();

    assert!(!user.email_verified);
    assert!(repo.consume_email_verification(&token, Utc::now()).await.unwrap());
    assert!(repo.get_user(user.id).await.unwrap().unwrap().email_verified);
}

#[tokio::test]
#[ignore]
async fn test_transition_is_compare_and_set() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let (_, _, quote_id) = quote_fixture(&repo).await;

    let first = repo
        .transition_quote(quote_id, QuoteStatus::Pending, QuoteStatus::Responded, Some("Soon".into()), Some(900.0))
        .await
        .unwrap();
    let second = repo
        .transition_quote(quote_id, QuoteStatus::Pending, QuoteStatus::Declined, None, None)
        .await
        .unwrap();

    let updated = first.expect("first writer wins");
    assert_eq!(updated.status, QuoteStatus::Responded);
    assert_eq!(updated.estimated_cost, Some(900.0));
    assert!(second.is_none());
}

#[tokio::test]
#[ignore]
async fn test_review_requires_completed_quote_and_updates_rating() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let (customer_id, contractor_id, quote_id) = quote_fixture(&repo).await;
    let review = CreateReviewRequest {
        quote_id,
        rating: 4,
        comment: None,
    };

    let outcome = repo.create_review(customer_id, review.clone()).await.unwrap();
    assert_eq!(outcome, ReviewOutcome::QuoteNotCompleted);

    repo.set_quote_status(quote_id, QuoteStatus::Completed).await.unwrap();
    let outcome = repo.create_review(customer_id, review.clone()).await.unwrap();
    assert!(matches!(outcome, ReviewOutcome::Created(_)));

    let contractor = repo.get_contractor(contractor_id).await.unwrap().unwrap();
    assert_eq!(contractor.review_count, 1);
    assert!((contractor.rating - 4.0).abs() < f64::EPSILON);

    let err = repo.create_review(customer_id, review).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
#[ignore]
async fn test_reset_token_is_single_use() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let user = register(&repo, Role::Customer).await;
    let token = Uuid::new_v4().to_string();
    let now = Utc::now();

    repo.create_reset_token(user.id, &token, now + Duration::minutes(30))
        .await
        .unwrap();

    assert!(repo.reset_token_is_valid(&token, now).await.unwrap());
    assert!(repo.reset_token_is_valid(&token, now).await.unwrap());
    assert!(repo.consume_reset_token(&token, "new-hash", now).await.unwrap());
    assert!(!repo.consume_reset_token(&token, "newer-hash", now).await.unwrap());
    assert!(!repo.reset_token_is_valid(&token, now).await.unwrap());
}
