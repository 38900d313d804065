use chess::{Game, Outcome, PieceColor};
use engine::EngineInfo;
use serde::Serialize;

/// Immutable view of the session, published after every exchange or reset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameView {
    pub game_id: String,
    pub fen: String,
    /// Standard UCI notation, castling as the king's two-square move.
    pub legal_moves: Vec<String>,
    /// SAN of every half-move played so far.
    pub pgn: Vec<String>,
    pub side_to_move: PieceColor,
    pub status: GameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<PieceColor>,
    pub move_count: usize,
    /// Reason the last exchange got no reply from the opponent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_fault: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
}

impl From<Option<Outcome>> for GameStatus {
    fn from(outcome: Option<Outcome>) -> Self {
        match outcome {
            None => Self::Ongoing,
            Some(Outcome::Checkmate { .. }) => Self::Checkmate,
            Some(Outcome::Stalemate) => Self::Stalemate,
            Some(Outcome::InsufficientMaterial) => Self::InsufficientMaterial,
        }
    }
}

impl GameView {
    pub fn of(game_id: &str, game: &Game) -> Self {
        let outcome = game.outcome();
        let winner = match outcome {
            Some(Outcome::Checkmate { winner }) => Some(winner),
            _ => None,
        };
        Self {
            game_id: game_id.to_string(),
            fen: game.to_fen(),
            legal_moves: game.legal_moves_uci(),
            pgn: game.san_history(),
            side_to_move: game.side_to_move().into(),
            status: outcome.into(),
            winner,
            move_count: game.history().len(),
            opponent_fault: None,
        }
    }
}

/// Result of a successful move exchange.
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeView {
    /// `None` when the client's move ended the game.
    pub best_move: Option<String>,
    /// The reply the opponent expects to our next move, if it reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ponder: Option<String>,
    #[serde(flatten)]
    pub game: GameView,
    pub info: EngineInfo,
}
