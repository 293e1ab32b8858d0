use axum::{
    extract::State,
    response::{Json, Response},
};
use chrono::Utc;

use super::{ApiErr, ApiPath, ApiState, dto::RoleResponse, found_or_404, jwt::AuthContext};

/// Roles effective right now, by ordinal.
pub async fn list_roles(
    AuthContext(_): AuthContext,
    State(state): State<ApiState>,
) -> Result<Json<Vec<RoleResponse>>, ApiErr> {
    let roles = state
        .services
        .roles
        .find_all_effective(Utc::now().naive_utc())
        .await?;
    Ok(Json(roles.into_iter().map(RoleResponse::from).collect()))
}

/// One role by code, or 404 when no such role is effective right now.
pub async fn get_role(
    AuthContext(_): AuthContext,
    State(state): State<ApiState>,
    ApiPath(code): ApiPath<String>,
) -> Result<Response, ApiErr> {
    let role = state
        .services
        .roles
        .find_by_code_and_effective(&code, Utc::now().naive_utc())
        .await?;
    Ok(found_or_404(role.map(RoleResponse::from)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::api::test_support::*;

    #[tokio::test]
    async fn test_any_authenticated_user_can_list() {
        let state = state().await;
        let (status, body) = send(&state, "GET", "/api/roles", Some(&user_token()), None).await;
        assert_eq!(status, StatusCode::OK);

        let roles = json(&body);
        let codes: Vec<_> = roles
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["code"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(codes, vec!["ROLE_USER", "ROLE_SYSADMIN"]);
    }

    #[tokio::test]
    async fn test_requires_token() {
        let state = state().await;
        let (status, _) = send(&state, "GET", "/api/roles", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&state, "GET", "/api/roles/ROLE_USER", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_get_by_code() {
        let state = state().await;
        let token = user_token();

        let (status, body) = send(&state, "GET", "/api/roles/ROLE_SYSADMIN", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let role = json(&body);
        assert_eq!(role["code"], "ROLE_SYSADMIN");
        assert_eq!(role["ordinal"], 1);

        let (status, body) = send(&state, "GET", "/api/roles/ROLE_MISSING", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }
}
