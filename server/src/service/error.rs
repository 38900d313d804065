//! HTTP mapping of every failure a request can end in.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::session::{Committed, ExchangeError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error("Asset not specified")]
    MissingAsset,
    #[error("Invalid asset name: {0}")]
    InvalidAsset(String),
    #[error("Failed to read asset {name}: {source}")]
    AssetUnreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Exchange(e) => match e {
                ExchangeError::Input(_)
                | ExchangeError::InvalidNotation(_)
                | ExchangeError::IllegalMove(_)
                | ExchangeError::GameOver(_) => StatusCode::BAD_REQUEST,
                ExchangeError::OpponentFault { .. } | ExchangeError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::MissingAsset | Self::InvalidAsset(_) => StatusCode::BAD_REQUEST,
            Self::AssetUnreadable { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Exchange(e) => e.kind(),
            Self::MissingAsset | Self::InvalidAsset(_) | Self::AssetUnreadable { .. } => {
                "resource_fault"
            }
            Self::Internal(_) => "internal",
        }
    }

    pub fn committed(&self) -> Committed {
        match self {
            Self::Exchange(e) => e.committed(),
            _ => Committed::Nothing,
        }
    }
}

/// A query string that does not decode is the client's input fault.
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Exchange(ExchangeError::Input(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "Request failed: {}", self);
        } else {
            tracing::debug!(kind = self.kind(), "Request rejected: {}", self);
        }

        let body = json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "committed": self.committed(),
        });
        (status, Json(body)).into_response()
    }
}
