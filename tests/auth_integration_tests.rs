mod common;

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, header, request::Parts},
};
use chrono::Utc;
use common::{TEST_JWT_SECRET, spawn_app, test_config};
use jsonwebtoken::{EncodingKey, Header, encode};
use remodel_market::{
    AppState,
    auth::{AuthUser, Claims},
    config::Env,
    models::Role,
    providers::{MockGrader, MockMessagingService},
    storage::MockMediaStore,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

// --- Helper Functions ---

fn token_with_offset(user_id: Uuid, role: Role, exp_offset_secs: i64, secret: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        email: "someone@example.com".to_string(),
        user_type: role,
        iat: now as usize,
        exp: (now + exp_offset_secs) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

fn request_parts(headers: &[(&str, String)]) -> Parts {
    let mut builder = Request::builder().method(Method::GET).uri("/");
    for (name, value) in headers {
        builder = builder.header(*name, value);
    }
    builder.body(Body::empty()).unwrap().into_parts().0
}

// --- Gate: 401 ---

#[tokio::test]
async fn protected_routes_reject_missing_credentials() {
    let app = spawn_app(Env::Production);

    for uri in ["/api/me", "/api/customer/quotes", "/api/contractor/leads"] {
        let (status, body) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "Unauthorized", "{uri}");
    }
}

#[tokio::test]
async fn admin_routes_use_admin_message_for_401() {
    let app = spawn_app(Env::Production);

    let (status, body) = app.get("/api/admin/stats", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Admin access required");
}

#[tokio::test]
async fn malformed_token_is_treated_as_absent() {
    let app = spawn_app(Env::Production);

    let (status, body) = app.get("/api/me", Some("not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn expired_token_is_treated_as_absent() {
    let app = spawn_app(Env::Production);
    let admin = app.repo.seed_admin("admin@example.com");
    let token = token_with_offset(admin.id, Role::Admin, -3600, TEST_JWT_SECRET);

    let (status, _) = app.get("/api/admin/users", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let app = spawn_app(Env::Production);
    let admin = app.repo.seed_admin("admin@example.com");
    let token = token_with_offset(admin.id, Role::Admin, 3600, "some-other-secret");

    let (status, _) = app.get("/api/admin/users", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// --- Gate: 403 ---

#[tokio::test]
async fn wrong_role_is_forbidden() {
    let app = spawn_app(Env::Production);
    let (customer, _) = app.repo.seed_customer("cust@example.com");
    let (contractor, _) = app.repo.seed_contractor("pro@example.com", true);
    let customer_token = app.token_for(&customer);
    let contractor_token = app.token_for(&contractor);

    let (status, body) = app.get("/api/admin/stats", Some(&customer_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");

    let (status, body) = app.get("/api/contractor/leads", Some(&customer_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Contractor access required");

    let (status, body) = app.get("/api/customer/quotes", Some(&contractor_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Customer access required");
}

#[tokio::test]
async fn admin_is_not_implicitly_a_contractor() {
    let app = spawn_app(Env::Production);
    let admin = app.repo.seed_admin("admin@example.com");
    let token = app.token_for(&admin);

    let (status, _) = app.get("/api/contractor/profile", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn denied_requests_never_reach_the_handler() {
    let app = spawn_app(Env::Production);
    let (customer, _) = app.repo.seed_customer("cust@example.com");
    let (_, contractor) = app.repo.seed_contractor("pro@example.com", false);
    let token = app.token_for(&customer);

    let uri = format!("/api/admin/contractors/{}/verify", contractor.id);
    let (status, _) = app
        .patch(&uri, Some(&token), serde_json::json!({ "isVerified": true }))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!app.repo.contractor(contractor.id).unwrap().is_verified);
}

// --- Gate: allow ---

#[tokio::test]
async fn admin_token_reaches_admin_routes() {
    let app = spawn_app(Env::Production);
    let admin = app.repo.seed_admin("admin@example.com");
    app.repo.seed_customer("cust@example.com");
    let token = app.token_for(&admin);

    let (status, body) = app.get("/api/admin/stats", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalUsers"], 2);
    assert_eq!(body["totalCustomers"], 1);

    let (status, body) = app.get("/api/admin/users", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u["email"].is_string() && u["userType"].is_string()));
}

#[tokio::test]
async fn session_cookie_is_accepted() {
    let app = spawn_app(Env::Production);
    let (customer, _) = app.repo.seed_customer("cust@example.com");
    let token = app.token_for(&customer);

    let request = Request::builder()
        .uri("/api/me")
        .header(header::COOKIE, format!("theme=dark; session_token={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "cust@example.com");
    assert!(body["customer"].is_object());
}

#[tokio::test]
async fn public_routes_ignore_bad_credentials() {
    let app = spawn_app(Env::Production);

    let (status, body) = app.get("/api/health", Some("garbage")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

// --- Development bypass ---

#[tokio::test]
async fn local_bypass_resolves_role_from_store() {
    let app = spawn_app(Env::Local);
    let admin = app.repo.seed_admin("admin@example.com");

    let request = Request::builder()
        .uri("/api/admin/stats")
        .header("x-user-id", admin.id.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn local_bypass_disabled_in_prod() {
    let app = spawn_app(Env::Production);
    let admin = app.repo.seed_admin("admin@example.com");

    let request = Request::builder()
        .uri("/api/admin/stats")
        .header("x-user-id", admin.id.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, body): (StatusCode, Value) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Admin access required");
}

// --- Extractor used without a gate ---

#[tokio::test]
async fn extractor_resolves_bearer_token() {
    let app = spawn_app(Env::Production);
    let (contractor, _) = app.repo.seed_contractor("pro@example.com", true);
    let state = AppState {
        repo: app.repo.clone(),
        messaging: Arc::new(MockMessagingService::new()),
        grader: Arc::new(MockGrader::new(Value::Null)),
        storage: Arc::new(MockMediaStore::new()),
        config: test_config(Env::Production),
    };

    let mut parts = request_parts(&[("authorization", format!("Bearer {}", app.token_for(&contractor)))]);
    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(user.id, contractor.id);
    assert_eq!(user.role, Role::Contractor);
}

#[tokio::test]
async fn extractor_rejects_missing_credentials_with_401() {
    let app = spawn_app(Env::Production);
    let state = AppState {
        repo: app.repo.clone(),
        messaging: Arc::new(MockMessagingService::new()),
        grader: Arc::new(MockGrader::new(Value::Null)),
        storage: Arc::new(MockMediaStore::new()),
        config: test_config(Env::Production),
    };

    let mut parts = request_parts(&[]);
    let err = AuthUser::from_request_parts(&mut parts, &state).await.unwrap_err();

    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
}
