//! Journal API Server
//!
//! Loads configuration, refuses to start without a usable signing secret,
//! then serves the REST API.

use anyhow::Context;
use clap::Parser;
use journal_api::{create_router, state::AppState};
use journal_core::{AppConfig, CredentialStore, JournalStore, MemoryStore, PgStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "journal-api")]
#[command(author, version, about = "Multi-tenant journal REST API", long_about = None)]
struct Args {
    /// TOML configuration file; environment variables override its values
    #[arg(short, long, env = "JOURNAL_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address (overrides configuration)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides configuration)
    #[arg(short, long)]
    port: Option<u16>,
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "journal_api={level},journal_core={level},tower_http=info,audit=info",
            level = config.logging.level
        )
        .into()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_stores(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn CredentialStore>, Arc<dyn JournalStore>)> {
    match &config.database.postgres_url {
        Some(url) => {
            let store = PgStore::connect(url, config.database.postgres_pool_size)
                .await
                .context("connecting to PostgreSQL")?;
            store.bootstrap_schema().await?;

            let store = Arc::new(store);
            let credentials: Arc<dyn CredentialStore> = store.clone();
            let journals: Arc<dyn JournalStore> = store;
            Ok((credentials, journals))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store");
            let store = Arc::new(MemoryStore::new());
            let credentials: Arc<dyn CredentialStore> = store.clone();
            let journals: Arc<dyn JournalStore> = store;
            Ok((credentials, journals))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config);

    // Fail fast before touching the database
    config
        .auth
        .require_secret()
        .context("a signing secret of at least 32 bytes is required")?;

    let (credentials, journals) = open_stores(&config).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, credentials, journals)?);

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Journal API Server starting on http://{}", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
