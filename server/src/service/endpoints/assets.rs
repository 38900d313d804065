//! Static files: the play page and piece images.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::service::parsers::{parse_asset_name, AssetQuery};
use crate::service::{ApiError, AppState};

const PLAY_PAGE: &str = "play.html";
const IMAGE_DIR: &str = "img";

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Result<Response, ApiError> {
    let bytes = read_asset(&state, &[PLAY_PAGE]).await?;
    Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], bytes).into_response())
}

/// `GET /img?piece=NAME`
pub async fn image(
    State(state): State<AppState>,
    query: Result<Query<AssetQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::InvalidAsset(e.body_text()))?;
    let name = parse_asset_name(query.piece.as_deref())?;
    let bytes = read_asset(&state, &[IMAGE_DIR, name]).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}

async fn read_asset(state: &AppState, parts: &[&str]) -> Result<Vec<u8>, ApiError> {
    let path = parts
        .iter()
        .fold(state.assets_dir.to_path_buf(), |path, part| path.join(part));
    tracing::debug!(path = %path.display(), "Serving asset");
    tokio::fs::read(&path)
        .await
        .map_err(|source| ApiError::AssetUnreadable {
            name: parts.join("/"),
            source,
        })
}
