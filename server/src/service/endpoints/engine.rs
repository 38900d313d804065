//! Opponent information endpoint

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::service::AppState;

/// `GET /info`: identity and options reported by the engine at startup.
pub async fn info(State(state): State<AppState>) -> Json<Value> {
    let descriptor = state.session.opponent_descriptor();
    Json(json!({
        "info": {
            "name": descriptor.name,
            "author": descriptor.author,
        },
        "options": descriptor.options,
    }))
}
