//! Game action endpoints

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use chess::DisplayBoard;
use serde_json::{json, Value};

use crate::service::parsers::MoveQuery;
use crate::service::{ApiError, AppState};
use crate::session::{ExchangeView, GameView};

/// `GET /move?uci=…` or `GET /move?san=…`
pub async fn make_move(
    State(state): State<AppState>,
    query: Result<Query<MoveQuery>, QueryRejection>,
) -> Result<Json<ExchangeView>, ApiError> {
    let Query(query) = query?;
    tracing::info!(uci = ?query.uci, san = ?query.san, "HTTP make_move");
    let input = query.into_input()?;
    let view = state.session.apply_move_exchange(input).await?;
    Ok(Json(view))
}

/// `GET /show`: the current position as a text diagram.
pub async fn show(State(state): State<AppState>) -> Result<String, ApiError> {
    let view = state.session.current_view();
    let board =
        DisplayBoard::from_fen(&view.fen).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(format!("Current position: {}", board.draw()))
}

/// `GET /fen`
pub async fn fen(State(state): State<AppState>) -> Json<GameView> {
    Json(state.session.current_view())
}

/// `GET /new`
pub async fn new_game(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    tracing::info!("HTTP new_game");
    let view = state.session.reset().await?;
    Ok(Json(json!({
        "message": "New game started",
        "game_id": view.game_id,
    })))
}
