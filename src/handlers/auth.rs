//! 인증 핸들러
//!
//! - `POST /api/auth/register`
//! - `POST /api/auth/login`
//! - `POST /api/auth/refresh`
//! - `POST /api/auth/logout`
//! - `GET  /api/auth/me`

use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde_json::json;
use validator::Validate;

use super::{authenticated_user, AppState};
use crate::domain::dto::{
    LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest, SessionResponse,
    UserResponse,
};
use crate::errors::AppError;

#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    let user = state
        .users
        .register(&payload.email, &payload.password, &payload.full_name)
        .await?;

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    let (user, session) = state.users.login(&payload.email, &payload.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: UserResponse::from(user),
        session: SessionResponse::from(session),
    }))
}

#[post("/refresh")]
pub async fn refresh(
    state: web::Data<AppState>,
    payload: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    let session = state.users.refresh(&payload.refresh_token).await?;

    Ok(HttpResponse::Ok().json(SessionResponse::from(session)))
}

#[post("/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    payload: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    state.users.logout(&payload.refresh_token).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "로그아웃되었습니다" })))
}

#[get("/me")]
pub async fn me(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = authenticated_user(&req, &state).await?;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
