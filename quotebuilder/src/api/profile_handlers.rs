use axum::{
    extract::State,
    http::StatusCode,
    response::{Json, Response},
};

use crate::service::ProfileDraft;

use super::{
    ApiErr, ApiJson, ApiPath, ApiState,
    dto::{ProfileRequest, ProfileResponse},
    found_or_404,
    jwt::AdminContext,
};

pub async fn list_profiles(
    AdminContext(_): AdminContext,
    State(state): State<ApiState>,
) -> Result<Json<Vec<ProfileResponse>>, ApiErr> {
    let profiles = state.services.profiles.find_all().await?;
    Ok(Json(
        profiles.into_iter().map(ProfileResponse::from).collect(),
    ))
}

pub async fn get_profile(
    AdminContext(_): AdminContext,
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, ApiErr> {
    let profile = state.services.profiles.find_one(id).await?;
    Ok(found_or_404(profile.map(ProfileResponse::from)))
}

pub async fn create_profile(
    AdminContext(ctx): AdminContext,
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<ProfileRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiErr> {
    let created = state.services.profiles.create(&ctx, body.into()).await?;
    Ok((StatusCode::CREATED, Json(ProfileResponse::from(created))))
}

/// The id in the path wins over any id in the body.
pub async fn update_profile(
    AdminContext(ctx): AdminContext,
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(body): ApiJson<ProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiErr> {
    let draft = ProfileDraft {
        id: Some(id),
        ..body.into()
    };
    let updated = state.services.profiles.update(&ctx, draft).await?;
    Ok(Json(ProfileResponse::from(updated)))
}

pub async fn delete_profile(
    AdminContext(ctx): AdminContext,
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiErr> {
    state.services.profiles.delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
