//! Parsing functions from query strings to domain types

use serde::Deserialize;

use crate::service::ApiError;
use crate::session::MoveInput;

/// `?uci=e2e4` or `?san=e4`
#[derive(Debug, Default, Deserialize)]
pub struct MoveQuery {
    pub uci: Option<String>,
    pub san: Option<String>,
}

impl MoveQuery {
    pub fn into_input(self) -> Result<MoveInput, ApiError> {
        Ok(MoveInput::from_parts(self.uci, self.san)?)
    }
}

/// `?piece=wK.png`
#[derive(Debug, Default, Deserialize)]
pub struct AssetQuery {
    pub piece: Option<String>,
}

/// Accept a bare file name only: no separators, no parent references.
pub fn parse_asset_name(name: Option<&str>) -> Result<&str, ApiError> {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let name = name.ok_or(ApiError::MissingAsset)?;
    if name.contains(['/', '\\']) || name.contains("..") || name.starts_with('.') {
        return Err(ApiError::InvalidAsset(name.to_string()));
    }
    Ok(name)
}
