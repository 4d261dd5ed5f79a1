//! 계정 관리 핸들러
//!
//! 모든 엔드포인트는 `Authorization: Bearer <access_token>`이 필요합니다.
//!
//! - `PATCH  /api/users/me`
//! - `PUT    /api/users/me/password`
//! - `DELETE /api/users/me`
//! - `POST   /api/users/me/logout-all`
//! - `GET    /api/users/me/oauth-accounts`
//! - `DELETE /api/users/me/oauth-accounts/{provider}`

use actix_web::{delete, get, patch, post, put, web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use super::{authenticated_user, AppState};
use crate::domain::dto::{
    ChangePasswordRequest, OAuthAccountResponse, UpdateProfileRequest, UserResponse,
};
use crate::errors::AppError;

#[patch("/me")]
pub async fn update_profile(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;
    let user = authenticated_user(&req, &state).await?;

    let updated = state.users.update_profile(user.id, &payload.full_name).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(updated)))
}

#[put("/me/password")]
pub async fn change_password(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;
    let user = authenticated_user(&req, &state).await?;

    state
        .users
        .change_password(user.id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

#[delete("/me")]
pub async fn delete_account(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authenticated_user(&req, &state).await?;

    state.users.delete_account(user.id).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[post("/me/logout-all")]
pub async fn logout_all(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authenticated_user(&req, &state).await?;

    let revoked = state.sessions.logout_all(user.id).await?;

    Ok(HttpResponse::Ok().json(json!({ "revoked": revoked })))
}

#[get("/me/oauth-accounts")]
pub async fn linked_accounts(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authenticated_user(&req, &state).await?;
    let now = Utc::now();

    let accounts: Vec<OAuthAccountResponse> = state
        .oauth_links
        .linked_accounts(user.id)
        .await?
        .into_iter()
        .map(|account| OAuthAccountResponse::from_account(account, now))
        .collect();

    Ok(HttpResponse::Ok().json(accounts))
}

#[delete("/me/oauth-accounts/{provider}")]
pub async fn unlink_account(
    req: HttpRequest,
    state: web::Data<AppState>,
    provider: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = authenticated_user(&req, &state).await?;

    state.oauth_links.unlink_account(user.id, &provider).await?;

    Ok(HttpResponse::NoContent().finish())
}
