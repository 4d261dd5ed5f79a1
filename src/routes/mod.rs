//! API 라우트 설정 모듈
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/health` | 프로세스 헬스 체크 |
//! | GET | `/health/db` | 저장소 연결 확인 |
//! | POST | `/api/auth/register` | 회원가입 |
//! | POST | `/api/auth/login` | 로그인 |
//! | POST | `/api/auth/refresh` | 세션 갱신 (리프레시 토큰 교체) |
//! | POST | `/api/auth/logout` | 리프레시 토큰 폐기 |
//! | GET | `/api/auth/me` | 현재 사용자 |
//! | * | `/api/users/me/...` | 계정 관리 ([`handlers::users`]) |

use crate::handlers::{self, AppState};
use actix_web::{get, web, HttpResponse};
use serde_json::json;

pub fn configure_all_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check);
    cfg.service(database_health_check);

    configure_auth_routes(cfg);
    configure_user_routes(cfg);
}

fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .service(handlers::auth::register)
            .service(handlers::auth::login)
            .service(handlers::auth::refresh)
            .service(handlers::auth::logout)
            .service(handlers::auth::me),
    );
}

fn configure_user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/users")
            .service(handlers::users::update_profile)
            .service(handlers::users::change_password)
            .service(handlers::users::delete_account)
            .service(handlers::users::logout_all)
            .service(handlers::users::linked_accounts)
            .service(handlers::users::unlink_account),
    );
}

#[get("/health")]
async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "auth_service_core",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[get("/health/db")]
async fn database_health_check(state: web::Data<AppState>) -> HttpResponse {
    let Some(database) = &state.database else {
        return HttpResponse::Ok().json(json!({ "status": "healthy", "database": "memory" }));
    };

    match database.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "healthy",
            "database": database.database_name(),
        })),
        Err(e) => {
            log::error!("❌ 데이터베이스 헬스 체크 실패: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "unhealthy",
                "database": database.database_name(),
            }))
        }
    }
}
