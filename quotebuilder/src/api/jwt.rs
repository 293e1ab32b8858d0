use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;

use super::{ApiState, OAuthErr};

/// Authority required by the account and profile endpoints.
pub const ADMIN_AUTHORITY: &str = "ROLE_SYSADMIN";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account id
    pub sub: i32,
    pub username: String,
    /// Role codes effective when the token was issued
    pub authorities: Vec<String>,
    /// Unix timestamp expiry
    pub exp: u64,
}

impl Claims {
    pub fn has_authority(&self, code: &str) -> bool {
        self.authorities.iter().any(|a| a == code)
    }
}

pub fn encode_jwt(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

fn extract_bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn bearer_claims(parts: &Parts, state: &ApiState) -> Result<Claims, OAuthErr> {
    let token = extract_bearer(parts).ok_or_else(|| {
        OAuthErr::unauthorized("Full authentication is required to access this resource")
    })?;

    decode_jwt(token, &state.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        OAuthErr::unauthorized("Invalid access token")
    })
}

/// Extractor: validates the bearer token and requires [`ADMIN_AUTHORITY`].
pub struct AdminContext(pub RequestContext);

impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
    ApiState: FromRef<S>,
{
    type Rejection = OAuthErr;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = ApiState::from_ref(state);
        let claims = bearer_claims(parts, &state)?;

        if !claims.has_authority(ADMIN_AUTHORITY) {
            tracing::warn!(username = %claims.username, path = %parts.uri.path(), "access denied");
            return Err(OAuthErr::access_denied());
        }

        Ok(AdminContext(RequestContext::for_account(claims.sub, claims.username)))
    }
}

/// Extractor: validates the bearer token (any authenticated account).
pub struct AuthContext(pub RequestContext);

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
    ApiState: FromRef<S>,
{
    type Rejection = OAuthErr;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = ApiState::from_ref(state);
        let claims = bearer_claims(parts, &state)?;
        Ok(AuthContext(RequestContext::for_account(claims.sub, claims.username)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn claims(exp: u64) -> Claims {
        Claims {
            sub: 7,
            username: "qbAdmin".into(),
            authorities: vec!["ROLE_USER".into(), ADMIN_AUTHORITY.into()],
            exp,
        }
    }

    #[test]
    fn test_encode_decode() {
        let exp = Utc::now().timestamp() as u64 + 60;
        let token = encode_jwt(&claims(exp), "s3cret").unwrap();
        let decoded = decode_jwt(&token, "s3cret").unwrap();
        assert_eq!(decoded.sub, 7);
        assert_eq!(decoded.username, "qbAdmin");
        assert!(decoded.has_authority(ADMIN_AUTHORITY));
        assert!(!decoded.has_authority("ROLE_OTHER"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let exp = Utc::now().timestamp() as u64 + 60;
        let token = encode_jwt(&claims(exp), "s3cret").unwrap();
        assert!(decode_jwt(&token, "other").is_err());
    }

    #[test]
    fn test_expired_rejected() {
        // beyond the default 60s leeway
        let exp = Utc::now().timestamp() as u64 - 600;
        let token = encode_jwt(&claims(exp), "s3cret").unwrap();
        assert!(decode_jwt(&token, "s3cret").is_err());
    }
}
