use axum::{
    Router,
    extract::{
        FromRequest, FromRequestParts, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::NormalizePath;
use tower_http::set_header::response::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::Auth;
use crate::error::ServiceError;
use crate::service::Services;

pub mod account_handlers;
pub mod dto;
pub mod jwt;
pub mod profile_handlers;
pub mod role_handlers;
pub mod token_handlers;

// ---------- shared state ----------

#[derive(Clone)]
pub struct ApiState {
    pub services: Services,
    pub auth: Arc<Auth>,
    pub jwt_secret: String,
    pub token_expiry_secs: u64,
    /// OAuth client allowed to call the token endpoint.
    pub client_id: String,
    pub client_secret: String,
}

// ---------- error types ----------

/// Error-attributes body shared by every failed API call. `path` is filled
/// in by [`attach_error_path`] once the response leaves the handler.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorAttributes {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// A handler or service failure. Only two buckets exist: not found (404) and
/// everything else (500).
#[derive(Debug)]
pub struct ApiErr(StatusCode, String);

impl ApiErr {
    pub fn internal(e: impl std::fmt::Display) -> Self {
        Self(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(StatusCode::NOT_FOUND, msg.into())
    }

    pub fn status(&self) -> StatusCode {
        self.0
    }
}

impl From<ServiceError> for ApiErr {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound { .. } => {
                tracing::warn!(error = %e, "entity not found");
                Self::not_found(e.to_string())
            }
            other => {
                tracing::error!(error = %other, "request failed");
                Self::internal(other)
            }
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let attrs = ErrorAttributes {
            timestamp: Utc::now(),
            status: self.0.as_u16(),
            error: self.0.canonical_reason().unwrap_or("Error").to_string(),
            message: self.1,
            path: None,
        };
        let mut res = (self.0, Json(attrs.clone())).into_response();
        res.extensions_mut().insert(attrs);
        res
    }
}

impl From<JsonRejection> for ApiErr {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(status = %rejection.status(), "unreadable request body");
        Self::internal(rejection.body_text())
    }
}

impl From<PathRejection> for ApiErr {
    fn from(rejection: PathRejection) -> Self {
        tracing::warn!(status = %rejection.status(), "unreadable path parameter");
        Self::internal(rejection.body_text())
    }
}

/// JSON body extractor whose failures use the error-attributes body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiErr))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose failures use the error-attributes body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiErr))]
pub struct ApiPath<T>(pub T);

/// OAuth2-style rejection: `{"error": code, "error_description": text}`.
/// Used by the token endpoint and the bearer-token extractors.
#[derive(Debug)]
pub struct OAuthErr {
    status: StatusCode,
    error: &'static str,
    description: String,
}

impl OAuthErr {
    pub fn new(status: StatusCode, error: &'static str, description: impl Into<String>) -> Self {
        Self {
            status,
            error,
            description: description.into(),
        }
    }

    pub fn unauthorized(description: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", description)
    }

    pub fn access_denied() -> Self {
        Self::new(StatusCode::FORBIDDEN, "access_denied", "Access is denied")
    }

    pub fn server_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "server_error",
            "Internal server error",
        )
    }
}

impl IntoResponse for OAuthErr {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.error,
            "error_description": self.description,
        });
        (self.status, Json(body)).into_response()
    }
}

/// 200 with the value, or 404 with an empty body.
pub(crate) fn found_or_404<T: Serialize>(value: Option<T>) -> Response {
    match value {
        Some(v) => Json(v).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Rewrite error-attribute bodies so they carry the request path.
async fn attach_error_path(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    let mut res = next.run(req).await;
    match res.extensions_mut().remove::<ErrorAttributes>() {
        Some(mut attrs) => {
            attrs.path = Some(path);
            (res.status(), Json(attrs)).into_response()
        }
        None => res,
    }
}

// ---------- router ----------

/// The served application: the API router behind trailing-slash trimming.
/// Trimming has to wrap the router so it runs before routing.
pub type App = NormalizePath<Router>;

pub fn app(state: ApiState, cors_allowed_origins: &[String]) -> App {
    NormalizePath::trim_trailing_slash(api_router(state, cors_allowed_origins))
}

fn api_router(state: ApiState, cors_allowed_origins: &[String]) -> Router {
    let allowed_origins: Vec<HeaderValue> = cors_allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let cors = if allowed_origins.is_empty() {
        CorsLayer::new() // no origins allowed = same-origin only
    } else {
        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/oauth/token", post(token_handlers::issue_token))
        .nest("/api", api_routes())
        .layer(middleware::from_fn(attach_error_path))
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<ApiState> {
    Router::new()
        // accounts
        .route(
            "/accounts",
            get(account_handlers::list_accounts)
                .post(account_handlers::create_account)
                .put(account_handlers::update_account),
        )
        .route(
            "/accounts/{id}",
            get(account_handlers::get_account).delete(account_handlers::delete_account),
        )
        .route(
            "/accounts/username/{username}",
            get(account_handlers::get_account_by_username),
        )
        .route("/accounts/createUser", post(account_handlers::create_user))
        .route("/accounts/updateUser", put(account_handlers::update_user))
        // profiles
        .route(
            "/profiles",
            get(profile_handlers::list_profiles).post(profile_handlers::create_profile),
        )
        .route(
            "/profiles/{id}",
            get(profile_handlers::get_profile)
                .put(profile_handlers::update_profile)
                .delete(profile_handlers::delete_profile),
        )
        // roles
        .route("/roles", get(role_handlers::list_roles))
        .route("/roles/{code}", get(role_handlers::get_role))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::Utc;
    use tower::ServiceExt;

    use super::*;
    use crate::api::jwt::{Claims, encode_jwt};
    use crate::context::RequestContext;
    use crate::service::test_support::{draft, services};
    use crate::service::UserDraft;

    pub const SECRET: &str = "test-secret";
    pub const CLIENT_ID: &str = "qbClientId";
    pub const CLIENT_SECRET: &str = "123456";

    pub async fn state() -> ApiState {
        let services = services().await;
        let ctx = RequestContext::system();
        for (username, password, roles) in [
            ("qbAdmin", "QuoteBuilder@1", vec!["ROLE_USER", "ROLE_SYSADMIN"]),
            ("qbUser", "qb@123", vec!["ROLE_USER"]),
        ] {
            services
                .accounts
                .create_user(
                    &ctx,
                    UserDraft {
                        account: draft(username, password),
                        roles: Some(roles.into_iter().map(String::from).collect()),
                        profile: None,
                    },
                )
                .await
                .unwrap();
        }
        ApiState {
            auth: Arc::new(Auth::new(services.accounts.clone())),
            services,
            jwt_secret: SECRET.to_string(),
            token_expiry_secs: 3600,
            client_id: CLIENT_ID.to_string(),
            client_secret: CLIENT_SECRET.to_string(),
        }
    }

    pub const ADMIN_ID: i32 = 1;
    pub const USER_ID: i32 = 2;

    pub fn token(account_id: i32, username: &str, authorities: &[&str]) -> String {
        let claims = Claims {
            sub: account_id,
            username: username.to_string(),
            authorities: authorities.iter().map(|a| a.to_string()).collect(),
            exp: Utc::now().timestamp() as u64 + 3600,
        };
        encode_jwt(&claims, SECRET).unwrap()
    }

    pub fn admin_token() -> String {
        token(ADMIN_ID, "qbAdmin", &["ROLE_USER", "ROLE_SYSADMIN"])
    }

    pub fn user_token() -> String {
        token(USER_ID, "qbUser", &["ROLE_USER"])
    }

    /// Send one request through a fresh app; returns status and raw body.
    pub async fn send(
        state: &ApiState,
        method: &str,
        uri: &str,
        bearer: Option<&str>,
        json: Option<serde_json::Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = bearer {
            builder = builder.header("Authorization", format!("Bearer {t}"));
        }
        let body = match json {
            Some(v) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = app(state.clone(), &[])
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub fn json(body: &[u8]) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }
}
