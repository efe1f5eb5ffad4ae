//! # Todolist API Server
//!
//! Collaborative to-do lists over HTTP: email-verified accounts, shared
//! lists with an owner and members, and tasks within each list.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p todolist-api
//! ```
//!
//! Without `DATABASE_URL` the server keeps everything in memory, and without
//! `EMAIL_API_URL` verification codes are written to the log.

use std::sync::Arc;

use anyhow::Context;
use todolist_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use todolist_shared::{
    auth::password::Argon2Hasher,
    clock::SystemClock,
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
    },
    notify::{http::HttpNotifier, log::LogNotifier, Notifier},
    store::{memory::MemoryStore, postgres::PgStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "todolist_api=debug,todolist_shared=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match &config.database {
        Some(settings) => {
            let pool = create_pool(DatabaseConfig {
                max_connections: settings.max_connections,
                ..DatabaseConfig::from_url(settings.url.clone())
            })
            .await
            .context("Failed to connect to PostgreSQL")?;

            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn build_notifier(config: &Config) -> anyhow::Result<Arc<dyn Notifier>> {
    match &config.email.api_url {
        Some(url) => {
            let token = config
                .email
                .api_token
                .clone()
                .context("EMAIL_API_TOKEN is required when EMAIL_API_URL is set")?;
            let notifier = HttpNotifier::new(url, config.email.sender.clone(), token)?;
            Ok(Arc::new(notifier))
        }
        None => {
            tracing::warn!("EMAIL_API_URL not set, verification codes will only be logged");
            Ok(Arc::new(LogNotifier::new()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received, exiting...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(
        "Todolist API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let store = build_store(&config).await?;
    let notifier = build_notifier(&config)?;
    let bind_address = config.bind_address();

    let state = AppState::new(
        config,
        store,
        notifier,
        Arc::new(Argon2Hasher::default()),
        Arc::new(SystemClock),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
