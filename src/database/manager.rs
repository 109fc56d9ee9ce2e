use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors from the persistence gateway
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    /// Unique constraint violation, carrying the constraint name
    #[error("Duplicate entry violates {constraint}")]
    Duplicate { constraint: String },

    /// A lookup that must resolve to exactly one row matched several
    #[error("{what} matched {count} rows")]
    Ambiguous { what: String, count: i64 },

    #[error("rating_{bucket} is {current}; applying {delta} would make it negative")]
    NegativeRating { bucket: u8, current: i32, delta: i32 },

    #[error("rating_{bucket} would exceed the maximum count")]
    RatingOverflow { bucket: u8 },

    #[error("rating total {total} would exceed the maximum count")]
    RatingTotalOverflow { total: i64 },

    #[error("Expected {expected} affected row(s), got {actual}")]
    RowCountMismatch { expected: u64, actual: u64 },

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Classify a raw sqlx error, lifting unique violations into `Duplicate`
    pub fn classify(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return DatabaseError::Duplicate { constraint };
            }
        }
        DatabaseError::Sqlx(err)
    }

    /// Require a statement to have touched exactly `expected` rows
    pub fn expect_rows(expected: u64, actual: u64) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(DatabaseError::RowCountMismatch { expected, actual })
        }
    }
}

/// Builds and checks the shared PostgreSQL pool
pub struct DatabaseManager;

impl DatabaseManager {
    /// Create the pool described by `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        let target = Self::describe_url(&config.url)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.url)
            .await?;

        info!("Created database pool for: {}", target);
        Ok(pool)
    }

    /// Apply the SQL migrations compiled in from `migrations/`
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        MIGRATOR.run(pool).await?;
        info!("Database migrations applied ({} embedded)", MIGRATOR.iter().count());
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// `host:port/database` of a connection URL, without credentials
    pub fn describe_url(database_url: &str) -> Result<String, DatabaseError> {
        let url = url::Url::parse(database_url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        let host = url.host_str().ok_or(DatabaseError::InvalidDatabaseUrl)?;
        let database = url.path().trim_start_matches('/');
        Ok(match url.port() {
            Some(port) => format!("{}:{}/{}", host, port, database),
            None => format!("{}/{}", host, database),
        })
    }
}
