//! End-to-end tests for the QuoteBuilder API.
//!
//! Each test builds the full app over a fresh in-memory SQLite database,
//! seeds the default administrator the same way `serve` does, and obtains
//! bearer tokens through `/oauth/token`.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use base64::prelude::{BASE64_STANDARD, Engine};
use migration::{Migrator, MigratorTrait};
use quotebuilder::api::{ApiState, App, app};
use quotebuilder::auth::Auth;
use quotebuilder::service::Services;
use sea_orm::Database;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const CLIENT_ID: &str = "qbClientId";
const CLIENT_SECRET: &str = "123456";

async fn test_app() -> App {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let services = Services::new(db);
    services
        .accounts
        .seed_admin("qbAdmin", "QuoteBuilder@1")
        .await
        .unwrap();

    let state = ApiState {
        auth: Arc::new(Auth::new(services.accounts.clone())),
        services,
        jwt_secret: "integration-secret".to_string(),
        token_expiry_secs: 43_200,
        client_id: CLIENT_ID.to_string(),
        client_secret: CLIENT_SECRET.to_string(),
    };
    app(state, &[])
}

async fn call(app: &App, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn login(app: &App, username: &str, password: &str) -> (StatusCode, Value) {
    let basic = BASE64_STANDARD.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}"));
    let form = format!(
        "grant_type=password&username={}&password={}",
        username,
        password.replace('@', "%40")
    );
    let req = Request::builder()
        .method("POST")
        .uri("/oauth/token")
        .header("Authorization", format!("Basic {basic}"))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let (status, body) = call(app, req).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn token(app: &App, username: &str, password: &str) -> String {
    let (status, body) = login(app, username, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}

async fn api(
    app: &App,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"));
    let req = match body {
        Some(v) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    call(app, req).await
}

fn parse(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_seeded_admin_can_log_in() {
    let app = test_app().await;
    let (status, body) = login(&app, "qbAdmin", "QuoteBuilder@1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 43_200);
    assert_eq!(body["scope"], "read write");

    let (status, body) = login(&app, "qbAdmin", "wrong").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn test_account_lifecycle() {
    let app = test_app().await;
    let admin = token(&app, "qbAdmin", "QuoteBuilder@1").await;

    // create a plain user with a profile
    let (status, body) = api(
        &app,
        "POST",
        "/api/accounts/createUser",
        &admin,
        Some(json!({
            "account": { "username": "qbUser", "password": "qb@123" },
            "roles": [{ "code": "ROLE_USER" }],
            "profile": { "name": "Quote User", "mobile": "555-0199" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = parse(&body);
    let user_id = created["id"].as_i64().unwrap();
    let profile_id = created["profile"]["id"].as_i64().unwrap();
    assert!(created.get("password").is_none());

    // the new user can log in but is kept out of admin routes
    let user = token(&app, "qbUser", "qb@123").await;
    let (status, body) = api(&app, "GET", "/api/profiles", &user, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(parse(&body)["error"], "access_denied");
    let (status, _) = api(&app, "GET", "/api/roles", &user, None).await;
    assert_eq!(status, StatusCode::OK);

    // lock the account; further logins are refused
    let (status, body) = api(
        &app,
        "PUT",
        "/api/accounts",
        &admin,
        Some(json!({ "id": user_id, "version": 0, "username": "qbUser", "locked": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["version"], 1);
    let (status, _) = login(&app, "qbUser", "qb@123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // a stale version is refused
    let (status, body) = api(
        &app,
        "PUT",
        "/api/accounts",
        &admin,
        Some(json!({ "id": user_id, "version": 0, "username": "qbUser" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(parse(&body)["path"], "/api/accounts");

    // delete removes the account and its profile
    let (status, _) = api(&app, "DELETE", &format!("/api/accounts/{user_id}"), &admin, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = api(&app, "GET", &format!("/api/accounts/{user_id}"), &admin, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());

    let (status, body) =
        api(&app, "GET", &format!("/api/profiles/{profile_id}"), &admin, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let app = test_app().await;
    let admin = token(&app, "qbAdmin", "QuoteBuilder@1").await;

    let (status, body) = api(&app, "GET", "/api/accounts/username/qbAdmin", &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    let id = parse(&body)["id"].as_i64().unwrap();

    let (status, body) = api(&app, "DELETE", &format!("/api/accounts/{id}"), &admin, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse(&body);
    assert_eq!(body["status"], 500);
    assert_eq!(body["path"], format!("/api/accounts/{id}"));

    let (status, _) = api(&app, "GET", &format!("/api/accounts/{id}"), &admin, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = test_app().await;
    let req = Request::builder()
        .uri("/api/accounts")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(parse(&body)["error"], "unauthorized");
}

#[tokio::test]
async fn test_trailing_slash_routes_like_bare_path() {
    let app = test_app().await;
    let admin = token(&app, "qbAdmin", "QuoteBuilder@1").await;

    let (status, body) = api(&app, "GET", "/api/roles/", &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body).as_array().unwrap().len(), 2);

    let (status, body) = api(&app, "GET", "/api/accounts/", &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)[0]["username"], "qbAdmin");
}

#[tokio::test]
async fn test_renamed_admin_still_cannot_delete_self() {
    let app = test_app().await;
    let admin = token(&app, "qbAdmin", "QuoteBuilder@1").await;

    let (status, body) = api(&app, "GET", "/api/accounts/username/qbAdmin", &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    let id = parse(&body)["id"].as_i64().unwrap();

    let (status, _) = api(
        &app,
        "PUT",
        "/api/accounts",
        &admin,
        Some(json!({ "id": id, "username": "qbAdminRenamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = api(&app, "DELETE", &format!("/api/accounts/{id}"), &admin, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let (status, body) = api(&app, "GET", &format!("/api/accounts/{id}"), &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["username"], "qbAdminRenamed");
}
