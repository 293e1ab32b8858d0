use axum::{
    extract::State,
    http::StatusCode,
    response::{Json, Response},
};

use super::{
    ApiErr, ApiJson, ApiPath, ApiState,
    dto::{AccountRequest, AccountResponse, UserRequest},
    found_or_404,
    jwt::AdminContext,
};

pub async fn list_accounts(
    AdminContext(_): AdminContext,
    State(state): State<ApiState>,
) -> Result<Json<Vec<AccountResponse>>, ApiErr> {
    let accounts = state.services.accounts.find_all().await?;
    Ok(Json(
        accounts.into_iter().map(AccountResponse::from).collect(),
    ))
}

pub async fn get_account(
    AdminContext(_): AdminContext,
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Response, ApiErr> {
    let account = state.services.accounts.find_one(id).await?;
    Ok(found_or_404(account.map(AccountResponse::from)))
}

pub async fn get_account_by_username(
    AdminContext(_): AdminContext,
    State(state): State<ApiState>,
    ApiPath(username): ApiPath<String>,
) -> Result<Response, ApiErr> {
    let account = state.services.accounts.find_by_username(&username).await?;
    Ok(found_or_404(account.map(AccountResponse::from)))
}

pub async fn create_account(
    AdminContext(ctx): AdminContext,
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<AccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiErr> {
    let created = state.services.accounts.create(&ctx, body.into()).await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(created))))
}

pub async fn update_account(
    AdminContext(ctx): AdminContext,
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<AccountRequest>,
) -> Result<Json<AccountResponse>, ApiErr> {
    let updated = state.services.accounts.update(&ctx, body.into()).await?;
    Ok(Json(AccountResponse::from(updated)))
}

pub async fn delete_account(
    AdminContext(ctx): AdminContext,
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiErr> {
    state.services.accounts.delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_user(
    AdminContext(ctx): AdminContext,
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<UserRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiErr> {
    let created = state
        .services
        .accounts
        .create_user(&ctx, body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(created))))
}

pub async fn update_user(
    AdminContext(ctx): AdminContext,
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<UserRequest>,
) -> Result<Json<AccountResponse>, ApiErr> {
    let updated = state
        .services
        .accounts
        .update_user(&ctx, body.into())
        .await?;
    Ok(Json(AccountResponse::from(updated)))
}
