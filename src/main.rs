use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use book_catalog_api::auth::TokenService;
use book_catalog_api::config::AppConfig;
use book_catalog_api::database::{DatabaseManager, PgStore};
use book_catalog_api::{app, AppState};

#[derive(Parser, Debug)]
#[command(name = "book-catalog-api", version, about = "Book catalog REST API server")]
struct Args {
    /// Port to listen on (overrides API_PORT / PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Apply migrations at startup even when configuration disables it
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("book_catalog_api=debug,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = args.port {
        config.api.port = port;
    }
    tracing::info!("Starting Book Catalog API in {:?} mode", config.environment);
    if config.uses_development_secret() {
        tracing::warn!("JWT_SECRET not set; signing tokens with the development secret");
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    if args.migrate || config.database.run_migrations {
        DatabaseManager::migrate(&pool)
            .await
            .context("failed to apply migrations")?;
    }

    let tokens = TokenService::from_config(&config.security).context("invalid JWT configuration")?;
    let addr: SocketAddr = format!("{}:{}", args.bind, config.api.port)
        .parse()
        .with_context(|| format!("invalid bind address {}", args.bind))?;

    let state = AppState::new(config, tokens, Arc::new(PgStore::new(pool)));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Book Catalog API listening on http://{}", addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
