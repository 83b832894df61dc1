//! Shared fixtures: an in-memory `Repository`, mock providers and request helpers
//! that drive the real router through `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{DateTime, Utc};
use remodel_market::{
    AppConfig, AppState,
    auth::session,
    config::Env,
    create_router,
    models::{
        AdminQuoteView, AdminStats, AdminUserSummary, Contractor, ContractorSummary,
        CreateQuoteRequest, CreateReviewRequest, Customer, CustomerSummary, NewUser, Quote,
        QuoteStatus, Review, Role, UpdateContractorRequest, User, UserCredentials,
    },
    providers::{MockGrader, MockMessagingService},
    repository::{RepoResult, Repository, RepositoryError, ReviewOutcome},
    storage::MockMediaStore,
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

// --- In-memory store ---

#[derive(Clone)]
pub struct ResetTokenRow {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct Store {
    pub users: Vec<(User, String)>,
    pub customers: Vec<Customer>,
    pub contractors: Vec<Contractor>,
    pub quotes: Vec<Quote>,
    pub reviews: Vec<Review>,
    pub reset_tokens: Vec<ResetTokenRow>,
    pub email_tokens: Vec<(String, Uuid, DateTime<Utc>)>,
}

/// InMemoryRepository
///
/// Behaves like the Postgres repository for everything the handlers can observe,
/// including the compare-and-set on quote status and single-use tokens.
#[derive(Default)]
pub struct InMemoryRepository {
    pub store: Mutex<Store>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().unwrap()
    }

    pub fn insert_user(&self, email: &str, role: Role, password_hash: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: Some(email.split('@').next().unwrap_or_default().to_string()),
            user_type: role,
            email_verified: false,
            created_at: Utc::now(),
        };
        self.lock().users.push((user.clone(), password_hash.to_string()));
        user
    }

    pub fn seed_customer(&self, email: &str) -> (User, Customer) {
        let user = self.insert_user(email, Role::Customer, "");
        let customer = Customer {
            id: Uuid::new_v4(),
            user_id: user.id,
            phone: Some("+15550000001".to_string()),
            address: None,
            created_at: Utc::now(),
        };
        self.lock().customers.push(customer.clone());
        (user, customer)
    }

    pub fn seed_contractor(&self, email: &str, verified: bool) -> (User, Contractor) {
        let user = self.insert_user(email, Role::Contractor, "");
        let contractor = Contractor {
            id: Uuid::new_v4(),
            user_id: user.id,
            business_name: format!("{} Remodeling", user.name.clone().unwrap_or_default()),
            specialties: vec!["kitchen".to_string()],
            is_verified: verified,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        self.lock().contractors.push(contractor.clone());
        (user, contractor)
    }

    pub fn seed_admin(&self, email: &str) -> User {
        self.insert_user(email, Role::Admin, "")
    }

    pub fn seed_quote(&self, customer: &Customer, contractor: &Contractor, status: QuoteStatus) -> Quote {
        let quote = Quote {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            contractor_id: contractor.id,
            project_type: "Kitchen".to_string(),
            description: "Replace cabinets".to_string(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        self.lock().quotes.push(quote.clone());
        quote
    }

    pub fn seed_reset_token(&self, user_id: Uuid, token: &str, expires_at: DateTime<Utc>) {
        self.lock().reset_tokens.push(ResetTokenRow {
            token: token.to_string(),
            user_id,
            expires_at,
            used_at: None,
        });
    }

    pub fn password_hash(&self, user_id: Uuid) -> Option<String> {
        self.lock()
            .users
            .iter()
            .find(|(u, _)| u.id == user_id)
            .map(|(_, hash)| hash.clone())
    }

    pub fn quote(&self, id: Uuid) -> Option<Quote> {
        self.lock().quotes.iter().find(|q| q.id == id).cloned()
    }

    pub fn contractor(&self, id: Uuid) -> Option<Contractor> {
        self.lock().contractors.iter().find(|c| c.id == id).cloned()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.lock().users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone()))
    }

    async fn find_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|(u, _)| u.email.eq_ignore_ascii_case(email))
            .map(|(user, hash)| UserCredentials {
                user: user.clone(),
                password_hash: hash.clone(),
            }))
    }

    async fn register_user(&self, new_user: NewUser) -> RepoResult<User> {
        let mut store = self.lock();
        if store.users.iter().any(|(u, _)| u.email.eq_ignore_ascii_case(&new_user.email)) {
            return Err(RepositoryError::Conflict("Email already registered".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            name: new_user.name,
            user_type: new_user.user_type,
            email_verified: false,
            created_at: Utc::now(),
        };
        match user.user_type {
            Role::Contractor => store.contractors.push(Contractor {
                id: Uuid::new_v4(),
                user_id: user.id,
                business_name: new_user.business_name.unwrap_or_default(),
                phone: new_user.phone,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                ..Default::default()
            }),
            Role::Customer => store.customers.push(Customer {
                id: Uuid::new_v4(),
                user_id: user.id,
                phone: new_user.phone,
                address: None,
                created_at: Utc::now(),
            }),
            Role::Admin => {}
        }
        store
            .email_tokens
            .push((new_user.verification_token, user.id, new_user.verification_expires_at));
        store.users.push((user.clone(), new_user.password_hash));
        Ok(user)
    }

    async fn get_customer_by_user(&self, user_id: Uuid) -> RepoResult<Option<Customer>> {
        Ok(self.lock().customers.iter().find(|c| c.user_id == user_id).cloned())
    }

    async fn get_contractor_by_user(&self, user_id: Uuid) -> RepoResult<Option<Contractor>> {
        Ok(self.lock().contractors.iter().find(|c| c.user_id == user_id).cloned())
    }

    async fn get_contractor(&self, id: Uuid) -> RepoResult<Option<Contractor>> {
        Ok(self.contractor(id))
    }

    async fn list_verified_contractors(&self) -> RepoResult<Vec<Contractor>> {
        let mut list: Vec<Contractor> = self
            .lock()
            .contractors
            .iter()
            .filter(|c| c.is_verified)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        Ok(list)
    }

    async fn update_contractor_profile(
        &self,
        user_id: Uuid,
        req: UpdateContractorRequest,
    ) -> RepoResult<Option<Contractor>> {
        let mut store = self.lock();
        let Some(c) = store.contractors.iter_mut().find(|c| c.user_id == user_id) else {
            return Ok(None);
        };
        if let Some(v) = req.business_name {
            c.business_name = v;
        }
        if req.phone.is_some() {
            c.phone = req.phone;
        }
        if req.description.is_some() {
            c.description = req.description;
        }
        if let Some(v) = req.specialties {
            c.specialties = v;
        }
        if req.service_area.is_some() {
            c.service_area = req.service_area;
        }
        c.updated_at = Utc::now();
        Ok(Some(c.clone()))
    }

    async fn set_contractor_verified(&self, id: Uuid, verified: bool) -> RepoResult<Option<Contractor>> {
        let mut store = self.lock();
        Ok(store.contractors.iter_mut().find(|c| c.id == id).map(|c| {
            c.is_verified = verified;
            c.clone()
        }))
    }

    async fn create_quote(&self, customer_id: Uuid, req: CreateQuoteRequest) -> RepoResult<Quote> {
        let quote = Quote {
            id: Uuid::new_v4(),
            customer_id,
            contractor_id: req.contractor_id,
            project_type: req.project_type,
            description: req.description,
            budget: req.budget,
            timeline: req.timeline,
            address: req.address,
            status: QuoteStatus::Pending,
            contractor_notes: None,
            estimated_cost: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.lock().quotes.push(quote.clone());
        Ok(quote)
    }

    async fn get_quote(&self, id: Uuid) -> RepoResult<Option<Quote>> {
        Ok(self.quote(id))
    }

    async fn list_customer_quotes(&self, customer_id: Uuid) -> RepoResult<Vec<Quote>> {
        Ok(self.lock().quotes.iter().filter(|q| q.customer_id == customer_id).cloned().collect())
    }

    async fn list_contractor_quotes(&self, contractor_id: Uuid) -> RepoResult<Vec<Quote>> {
        Ok(self.lock().quotes.iter().filter(|q| q.contractor_id == contractor_id).cloned().collect())
    }

    async fn transition_quote(
        &self,
        id: Uuid,
        expected: QuoteStatus,
        next: QuoteStatus,
        contractor_notes: Option<String>,
        estimated_cost: Option<f64>,
    ) -> RepoResult<Option<Quote>> {
        let mut store = self.lock();
        let Some(q) = store.quotes.iter_mut().find(|q| q.id == id && q.status == expected) else {
            return Ok(None);
        };
        q.status = next;
        if contractor_notes.is_some() {
            q.contractor_notes = contractor_notes;
        }
        if estimated_cost.is_some() {
            q.estimated_cost = estimated_cost;
        }
        q.updated_at = Utc::now();
        Ok(Some(q.clone()))
    }

    async fn set_quote_status(&self, id: Uuid, status: QuoteStatus) -> RepoResult<Option<Quote>> {
        let mut store = self.lock();
        Ok(store.quotes.iter_mut().find(|q| q.id == id).map(|q| {
            q.status = status;
            q.clone()
        }))
    }

    async fn create_review(&self, customer_id: Uuid, req: CreateReviewRequest) -> RepoResult<ReviewOutcome> {
        let mut store = self.lock();
        let Some(quote) = store
            .quotes
            .iter()
            .find(|q| q.id == req.quote_id && q.customer_id == customer_id)
            .cloned()
        else {
            return Ok(ReviewOutcome::QuoteNotFound);
        };
        if quote.status != QuoteStatus::Completed {
            return Ok(ReviewOutcome::QuoteNotCompleted);
        }
        if store.reviews.iter().any(|r| r.quote_id == quote.id) {
            return Err(RepositoryError::Conflict("Quote has already been reviewed".to_string()));
        }
        let review = Review {
            id: Uuid::new_v4(),
            contractor_id: quote.contractor_id,
            customer_id,
            quote_id: quote.id,
            rating: req.rating,
            comment: req.comment,
            created_at: Utc::now(),
        };
        store.reviews.push(review.clone());

        let ratings: Vec<f64> = store
            .reviews
            .iter()
            .filter(|r| r.contractor_id == quote.contractor_id)
            .map(|r| f64::from(r.rating))
            .collect();
        if let Some(c) = store.contractors.iter_mut().find(|c| c.id == quote.contractor_id) {
            c.review_count = ratings.len() as i32;
            c.rating = ratings.iter().sum::<f64>() / ratings.len() as f64;
        }
        Ok(ReviewOutcome::Created(review))
    }

    async fn list_users_admin(&self) -> RepoResult<Vec<AdminUserSummary>> {
        let store = self.lock();
        Ok(store
            .users
            .iter()
            .map(|(user, _)| AdminUserSummary {
                user: user.clone(),
                contractor: store.contractors.iter().find(|c| c.user_id == user.id).map(|c| {
                    ContractorSummary {
                        id: c.id,
                        business_name: c.business_name.clone(),
                        is_verified: c.is_verified,
                        rating: c.rating,
                        review_count: c.review_count,
                    }
                }),
                customer: store
                    .customers
                    .iter()
                    .find(|c| c.user_id == user.id)
                    .map(|c| CustomerSummary {
                        id: c.id,
                        phone: c.phone.clone(),
                    }),
            })
            .collect())
    }

    async fn list_quotes_admin(&self) -> RepoResult<Vec<AdminQuoteView>> {
        let store = self.lock();
        let user = |id: Uuid| store.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone());
        Ok(store
            .quotes
            .iter()
            .filter_map(|q| {
                let customer = store.customers.iter().find(|c| c.id == q.customer_id)?;
                let contractor = store.contractors.iter().find(|c| c.id == q.contractor_id)?;
                let customer_user = user(customer.user_id)?;
                let contractor_user = user(contractor.user_id)?;
                Some(AdminQuoteView {
                    quote: q.clone(),
                    customer_name: customer_user.name,
                    customer_email: customer_user.email,
                    contractor_business_name: contractor.business_name.clone(),
                    contractor_email: contractor_user.email,
                })
            })
            .collect())
    }

    async fn get_stats(&self) -> RepoResult<AdminStats> {
        let store = self.lock();
        Ok(AdminStats {
            total_users: store.users.len() as i64,
            total_customers: store.customers.len() as i64,
            total_contractors: store.contractors.len() as i64,
            verified_contractors: store.contractors.iter().filter(|c| c.is_verified).count() as i64,
            total_quotes: store.quotes.len() as i64,
            pending_quotes: store
                .quotes
                .iter()
                .filter(|q| q.status == QuoteStatus::Pending)
                .count() as i64,
            total_reviews: store.reviews.len() as i64,
        })
    }

    async fn create_reset_token(&self, user_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> RepoResult<()> {
        self.seed_reset_token(user_id, token, expires_at);
        Ok(())
    }

    async fn reset_token_is_valid(&self, token: &str, now: DateTime<Utc>) -> RepoResult<bool> {
        Ok(self
            .lock()
            .reset_tokens
            .iter()
            .any(|t| t.token == token && t.used_at.is_none() && t.expires_at > now))
    }

    async fn consume_reset_token(&self, token: &str, password_hash: &str, now: DateTime<Utc>) -> RepoResult<bool> {
        let mut store = self.lock();
        let Some(user_id) = store
            .reset_tokens
            .iter()
            .find(|t| t.token == token && t.used_at.is_none() && t.expires_at > now)
            .map(|t| t.user_id)
        else {
            return Ok(false);
        };
        if let Some((_, hash)) = store.users.iter_mut().find(|(u, _)| u.id == user_id) {
            *hash = password_hash.to_string();
        }
        for t in store.reset_tokens.iter_mut().filter(|t| t.user_id == user_id) {
            t.used_at.get_or_insert(now);
        }
        Ok(true)
    }

    async fn consume_email_verification(&self, token: &str, now: DateTime<Utc>) -> RepoResult<bool> {
        let mut store = self.lock();
        let Some(pos) = store
            .email_tokens
            .iter()
            .position(|(t, _, expires)| t == token && *expires > now)
        else {
            return Ok(false);
        };
        let (_, user_id, _) = store.email_tokens.remove(pos);
        if let Some((user, _)) = store.users.iter_mut().find(|(u, _)| u.id == user_id) {
            user.email_verified = true;
        }
        Ok(true)
    }
}

// --- Application fixture ---

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

pub fn test_config(env: Env) -> AppConfig {
    let mut config = AppConfig::default();
    config.env = env;
    config.jwt_secret = TEST_JWT_SECRET.to_string();
    config
}

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryRepository>,
    pub messaging: MockMessagingService,
    pub config: AppConfig,
}

pub struct Providers {
    pub messaging: MockMessagingService,
    pub grader: MockGrader,
    pub storage: MockMediaStore,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            messaging: MockMessagingService::new(),
            grader: MockGrader::new(json!({ "score": 0.87, "feedback": "solid" })),
            storage: MockMediaStore::new(),
        }
    }
}

pub fn spawn_app(env: Env) -> TestApp {
    spawn_app_with(env, Providers::default())
}

pub fn spawn_app_with(env: Env, providers: Providers) -> TestApp {
    let repo = Arc::new(InMemoryRepository::new());
    let config = test_config(env);
    let state = AppState {
        repo: repo.clone(),
        messaging: Arc::new(providers.messaging.clone()),
        grader: Arc::new(providers.grader),
        storage: Arc::new(providers.storage),
        config: config.clone(),
    };
    TestApp {
        router: create_router(state),
        repo,
        messaging: providers.messaging,
        config,
    }
}

impl TestApp {
    /// A valid session token for `user`.
    pub fn token_for(&self, user: &User) -> String {
        session::issue_token(user, &self.config).unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }
}
