use std::sync::Arc;

use server::auth::jwt::JwtVerifier;
use server::auth::SharedVerifier;
use server::config;
use server::hub::GameHub;
use server::routes;
use server::store::{GameStore, MemoryGameStore};

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();

    let store: Arc<dyn GameStore> = Arc::new(MemoryGameStore::new());
    let hub = Arc::new(GameHub::new(store));
    let verifier: SharedVerifier = Arc::new(JwtVerifier::new(config.jwt_secret.clone()));

    let app = routes::app(hub, verifier);

    let addr = config.addr();
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
