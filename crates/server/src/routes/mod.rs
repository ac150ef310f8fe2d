pub mod games;
pub mod health;
pub mod ws;

use std::sync::Arc;

use axum::{
    routing::{get, put},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::SharedVerifier;
use crate::hub::GameHub;

/// Build the full router with shared state attached as extensions.
pub fn app(hub: Arc<GameHub>, verifier: SharedVerifier) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let store = hub.store().clone();

    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Games
        .route("/api/games", get(games::list_games).post(games::create_game))
        .route("/api/games/{game_id}/seat", put(games::claim_seat))
        // Live play
        .route("/ws", get(ws::ws_handler))
        // Shared state
        .layer(Extension(hub))
        .layer(Extension(store))
        .layer(Extension(verifier))
        .layer(cors)
}
