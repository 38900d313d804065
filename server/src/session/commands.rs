use chess::Notation;
use serde::Serialize;
use tokio::sync::oneshot;

use super::snapshot::{ExchangeView, GameView};

/// How much of an exchange was committed when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Committed {
    Nothing,
    /// The client's move is in the history; the opponent's reply is not.
    ClientMove,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("{0}")]
    Input(String),
    #[error("Invalid move notation: {0}")]
    InvalidNotation(String),
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Game is over: {0}")]
    GameOver(String),
    #[error("Opponent protocol fault: {reason}")]
    OpponentFault { reason: String, committed: Committed },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExchangeError {
    pub fn committed(&self) -> Committed {
        match self {
            Self::OpponentFault { committed, .. } => *committed,
            _ => Committed::Nothing,
        }
    }

    /// Stable machine-readable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input_error",
            Self::InvalidNotation(_) => "invalid_move_notation",
            Self::IllegalMove(_) => "illegal_move",
            Self::GameOver(_) => "game_over",
            Self::OpponentFault { .. } => "opponent_protocol_fault",
            Self::Internal(_) => "internal",
        }
    }
}

/// A client move in exactly one notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveInput {
    Uci(String),
    San(String),
}

impl MoveInput {
    /// Pick the single supplied notation. Empty strings count as absent.
    pub fn from_parts(uci: Option<String>, san: Option<String>) -> Result<Self, ExchangeError> {
        let uci = uci.filter(|s| !s.trim().is_empty());
        let san = san.filter(|s| !s.trim().is_empty());
        match (uci, san) {
            (Some(uci), None) => Ok(Self::Uci(uci.trim().to_string())),
            (None, Some(san)) => Ok(Self::San(san.trim().to_string())),
            (Some(_), Some(_)) => Err(ExchangeError::Input(
                "Specify either uci or san, not both".to_string(),
            )),
            (None, None) => Err(ExchangeError::Input("Move not specified".to_string())),
        }
    }

    pub fn notation(&self) -> Notation {
        match self {
            Self::Uci(_) => Notation::Uci,
            Self::San(_) => Notation::San,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Uci(text) | Self::San(text) => text,
        }
    }
}

/// Commands sent to the session actor. Each embeds a oneshot for the reply.
pub enum SessionCommand {
    Exchange {
        input: MoveInput,
        reply: oneshot::Sender<Result<ExchangeView, ExchangeError>>,
    },
    Reset {
        reply: oneshot::Sender<GameView>,
    },
    /// Processed in queue order, so earlier exchanges finish first.
    Shutdown {
        done: oneshot::Sender<()>,
    },
}
