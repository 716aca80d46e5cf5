//! Tours API server.
//!
//! Reads `.env` and the process environment, picks the PostgreSQL store when `DATABASE_URL` is
//! set (in-memory otherwise), seeds users, and serves until Ctrl-C.

use std::sync::Arc;
use tokio::net::TcpListener;
use tours_api::{
    app, ensure_database_exists, load_seed_file, AppConfig, AppState, DocumentStore, InMemoryDocumentStore,
    PgDocumentStore, UserService, TOURS, USERS,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tours_api=info,tours_server=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(environment = ?config.environment, "starting");

    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(database_url) => {
            ensure_database_exists(database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let store = PgDocumentStore::new(pool);
            store.ensure_collections(&[TOURS, USERS]).await?;
            tracing::info!("DB connection successful!");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    if let Some(path) = &config.users_seed_path {
        let users = load_seed_file(path)?;
        UserService::seed(store.as_ref(), users).await?;
    }

    let state = AppState::new(store, &config);
    let listener = TcpListener::bind(config.bind_addr()).await?;
    let addr = listener.local_addr()?;
    tracing::info!("App running on http://{}", addr);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
