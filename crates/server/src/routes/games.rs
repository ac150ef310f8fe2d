use std::sync::Arc;

use axum::{extract::Path, Extension, Json};
use chess_core::TeamColor;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::info;

use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::hub::GameHub;
use crate::store::{GameId, GameRecord, GameStore};

#[derive(Deserialize)]
pub struct CreateGameRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct ClaimSeatRequest {
    pub color: TeamColor,
}

#[derive(Serialize)]
pub struct GameSummary {
    pub game_id: GameId,
    pub name: String,
    pub white: Option<String>,
    pub black: Option<String>,
    pub finished: bool,
}

impl From<GameRecord> for GameSummary {
    fn from(record: GameRecord) -> Self {
        Self {
            game_id: record.game_id,
            name: record.name,
            white: record.white,
            black: record.black,
            finished: record.finished,
        }
    }
}

/// POST /api/games
pub async fn create_game(
    Extension(store): Extension<Arc<dyn GameStore>>,
    user: AuthUser,
    Json(req): Json<CreateGameRequest>,
) -> Result<Json<JsonValue>, AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Game name is required".into()));
    }

    let game_id = store.create(name)?;
    info!(game_id, creator = %user.username, "Created game");

    Ok(Json(json!({ "game_id": game_id })))
}

/// GET /api/games
pub async fn list_games(
    Extension(store): Extension<Arc<dyn GameStore>>,
    _user: AuthUser,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    let games = store.list()?.into_iter().map(GameSummary::from).collect();
    Ok(Json(games))
}

/// PUT /api/games/{game_id}/seat
pub async fn claim_seat(
    Extension(hub): Extension<Arc<GameHub>>,
    Path(game_id): Path<GameId>,
    user: AuthUser,
    Json(req): Json<ClaimSeatRequest>,
) -> Result<Json<GameSummary>, AppError> {
    let record = hub.claim_seat(game_id, &user.username, req.color).await?;
    Ok(Json(record.into()))
}
