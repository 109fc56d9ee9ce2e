pub mod accounts;
pub mod books;
pub mod manager;
pub mod models;
pub mod repository;
pub mod transaction;

use async_trait::async_trait;
use sqlx::PgPool;

pub use manager::{DatabaseError, DatabaseManager};
pub use repository::{AccountStore, BookStore, Store};
pub use transaction::{with_transaction, PgTransaction};

/// PostgreSQL-backed store shared by every request
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
