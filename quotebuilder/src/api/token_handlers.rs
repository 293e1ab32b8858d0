use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::Json,
};
use base64::prelude::{BASE64_STANDARD, Engine};
use chrono::Utc;

use crate::auth::AuthError;

use super::{
    ApiState, OAuthErr,
    dto::{TokenRequest, TokenResponse},
    jwt::{ADMIN_AUTHORITY, Claims, encode_jwt},
};

const PASSWORD_GRANT: &str = "password";
const GRANTED_SCOPE: &str = "read write";

/// `POST /oauth/token`: resource-owner password grant for a known client.
pub async fn issue_token(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Form(body): Form<TokenRequest>,
) -> Result<Json<TokenResponse>, OAuthErr> {
    match client_credentials(&headers) {
        Some((id, secret)) if id == state.client_id && secret == state.client_secret => {}
        _ => {
            tracing::warn!("token request with bad client credentials");
            return Err(OAuthErr::new(
                StatusCode::UNAUTHORIZED,
                "invalid_client",
                "Bad client credentials",
            ));
        }
    }

    tracing::debug!(grant_type = %body.grant_type, scope = ?body.scope, "token requested");
    if body.grant_type != PASSWORD_GRANT {
        return Err(OAuthErr::new(
            StatusCode::BAD_REQUEST,
            "unsupported_grant_type",
            format!("Unsupported grant type: {}", body.grant_type),
        ));
    }

    let (Some(username), Some(password)) = (body.username.as_deref(), body.password.as_deref())
    else {
        return Err(OAuthErr::new(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "Missing username or password",
        ));
    };

    let principal = state
        .auth
        .authenticate(username, password)
        .await
        .map_err(|e| match e {
            AuthError::Internal(err) => {
                tracing::error!(error = %err, "authentication failed");
                OAuthErr::server_error()
            }
            rejected => {
                tracing::warn!(username, reason = %rejected, "credentials rejected");
                OAuthErr::new(StatusCode::BAD_REQUEST, "invalid_grant", "Bad credentials")
            }
        })?;

    let exp = expiry_at(Utc::now().timestamp(), state.token_expiry_secs).ok_or_else(|| {
        tracing::error!(lifetime = state.token_expiry_secs, "token expiry out of range");
        OAuthErr::server_error()
    })?;
    let admin = principal.has_authority(ADMIN_AUTHORITY);
    let claims = Claims {
        sub: principal.account_id,
        username: principal.username,
        authorities: principal.authorities,
        exp,
    };
    let token = encode_jwt(&claims, &state.jwt_secret).map_err(|e| {
        tracing::error!(error = %e, "token encoding failed");
        OAuthErr::server_error()
    })?;

    tracing::info!(username = %claims.username, admin, "access token issued");
    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer",
        expires_in: state.token_expiry_secs,
        scope: GRANTED_SCOPE.to_string(),
    }))
}

/// Unix expiry of a token issued at `now` that lives `lifetime` seconds.
fn expiry_at(now: i64, lifetime: u64) -> Option<u64> {
    u64::try_from(now).ok()?.checked_add(lifetime)
}

/// Decode `Authorization: Basic base64(id:secret)`.
fn client_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(BASE64_STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (id, secret) = decoded.split_once(':')?;
    Some((id.to_owned(), secret.to_owned()))
}
