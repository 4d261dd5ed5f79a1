//! 인증 서비스 코어 HTTP 서버
//!
//! 환경 설정을 읽어 Identity store와 서비스를 구성하고 actix-web 서버를 구동합니다.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info, warn};

use auth_service_core::config::{Environment, ServerConfig, StoreBackend};
use auth_service_core::db::Database;
use auth_service_core::handlers::AppState;
use auth_service_core::repositories::{IdentityStore, MemoryIdentityStore, MongoIdentityStore};
use auth_service_core::routes::configure_all_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    load_env_file();
    init_logging();

    info!("🚀 인증 서비스 시작중... (environment: {})", Environment::current().as_str());

    let state = match initialize_state().await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            error!("❌ 서비스 초기화 실패: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    info!("✅ 모든 서비스가 성공적으로 초기화되었습니다!");

    start_http_server(state).await
}

/// 저장소를 선택하고 서비스 묶음을 구성합니다.
///
/// * `IDENTITY_STORE=memory` - 인메모리 저장소 (로컬 개발용)
/// * 그 외 - MongoDB 연결 후 인덱스 생성
async fn initialize_state() -> auth_service_core::errors::AppResult<AppState> {
    match StoreBackend::current() {
        StoreBackend::Memory => {
            warn!("⚠️ 인메모리 저장소 사용 - 재시작 시 모든 데이터가 사라집니다");
            let store: Arc<dyn IdentityStore> = Arc::new(MemoryIdentityStore::new());
            Ok(AppState::from_env(store, None))
        }
        StoreBackend::Mongo => {
            info!("📡 데이터베이스 연결 중...");
            let database = Arc::new(Database::from_env().await?);

            let mongo_store = MongoIdentityStore::new(database.clone());
            mongo_store.ensure_indexes().await?;

            let store: Arc<dyn IdentityStore> = Arc::new(mongo_store);
            Ok(AppState::from_env(store, Some(database)))
        }
    }
}

async fn start_http_server(state: web::Data<AppState>) -> std::io::Result<()> {
    let bind_address = ServerConfig::bind_address();

    info!("🌐 서버가 http://{} 에서 실행중입니다", bind_address);
    info!("📍 Health check: http://{}/health", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(configure_cors())
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .configure(configure_all_routes)
    })
    .bind(bind_address)?
    .run()
    .await
}

/// PROFILE 환경변수에 따라 `.env.dev` / `.env.prod` / `.env` 파일을 로드합니다.
fn load_env_file() {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    match profile.as_str() {
        "prod" => {
            if let Err(e) = dotenv::from_filename(".env.prod") {
                eprintln!(".env.prod 파일 로드 실패: {}", e);
            }
        }
        "dev" => {
            if let Err(e) = dotenv::from_filename(".env.dev") {
                eprintln!(".env.dev 파일 로드 실패: {}", e);
            }
        }
        _ => {
            dotenv().ok();
        }
    }
}

/// `RUST_LOG` 기반 로깅 초기화 (기본값: "info,actix_web=info")
fn init_logging() {
    env_logger::init_from_env(Env::default().default_filter_or("info,actix_web=info"));
}

fn configure_cors() -> Cors {
    Cors::default()
        .allowed_origin("http://localhost:3000")
        .allowed_origin("http://127.0.0.1:3000")
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600)
}
