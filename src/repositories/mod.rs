//! 데이터 액세스 계층
//!
//! [`IdentityStore`] trait과 두 가지 구현체를 제공합니다.
//!
//! - [`MongoIdentityStore`] - 운영 환경용 MongoDB 저장소
//! - [`MemoryIdentityStore`] - 테스트/로컬 개발용 인메모리 저장소
//!
//! # Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use auth_service_core::repositories::{IdentityStore, MongoIdentityStore};
//!
//! let store = MongoIdentityStore::new(database.clone());
//! store.ensure_indexes().await?;
//! let store: Arc<dyn IdentityStore> = Arc::new(store);
//! ```

pub mod identity_store;
pub mod memory_store;
pub mod mongo_store;

pub use identity_store::IdentityStore;
pub use memory_store::MemoryIdentityStore;
pub use mongo_store::MongoIdentityStore;
