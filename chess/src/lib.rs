//! Rules adapter over cozy-chess: game state with validated history, the
//! UCI and SAN move grammars, FEN helpers and a text board diagram.

pub mod board_display;
pub mod converters;
pub mod fen;
pub mod game;
pub mod pgn;
pub mod types;
pub mod uci;

pub use board_display::{DisplayBoard, DisplayBoardError};
pub use converters::*;
pub use fen::{FenError, STARTING_FEN};
pub use game::{Game, GameError, HistoryEntry, Notation, NotationError, Outcome, StartPosition};
pub use types::{PieceColor, PieceKind};
pub use uci::{format_uci_move, to_standard_uci};
