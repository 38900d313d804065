use cozy_chess::{Board, Color, Move, Piece};
use serde::Serialize;

use crate::fen::{format_fen, parse_fen, STARTING_FEN};
use crate::pgn::{format_san, parse_san, SanError};
use crate::types::PieceColor;
use crate::uci::{decode_uci, to_standard_uci, UciNotationError};

/// Main game state wrapper around cozy-chess Board
///
/// The board is only ever advanced through [`Game::make_move`], so the
/// current position is always the start position plus every entry of the
/// history, each validated before it was applied.
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
    start_position: StartPosition,
}

/// One applied half-move.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub mv: Move,
    /// Standard UCI notation (castling as e1g1)
    pub uci: String,
    /// Standard Algebraic Notation, computed against the position before the move
    pub san: String,
    /// FEN after this move
    pub fen: String,
}

/// Starting position of the game
#[derive(Debug, Clone)]
pub enum StartPosition {
    Standard,
    Fen(String),
}

impl StartPosition {
    pub fn fen(&self) -> &str {
        match self {
            Self::Standard => STARTING_FEN,
            Self::Fen(fen) => fen,
        }
    }
}

/// The two move grammars a client may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    /// Coordinate notation, e.g. `e2e4`, `e7e8q`
    Uci,
    /// Standard Algebraic Notation, e.g. `Nf3`, `O-O`
    San,
}

impl std::fmt::Display for Notation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uci => f.write_str("UCI"),
            Self::San => f.write_str("SAN"),
        }
    }
}

/// Why the game can no longer continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Checkmate { winner: PieceColor },
    Stalemate,
    InsufficientMaterial,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checkmate { winner } => write!(f, "checkmate, {} wins", winner),
            Self::Stalemate => f.write_str("stalemate"),
            Self::InsufficientMaterial => f.write_str("draw by insufficient material"),
        }
    }
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self {
            position: Board::default(),
            history: Vec::new(),
            start_position: StartPosition::Standard,
        }
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let position = parse_fen(fen)?;
        Ok(Self {
            position,
            history: Vec::new(),
            start_position: StartPosition::Fen(fen.trim().to_string()),
        })
    }

    /// Get the current board position
    pub fn position(&self) -> &Board {
        &self.position
    }

    pub fn start_position(&self) -> &StartPosition {
        &self.start_position
    }

    /// Get the move history
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Make a move on the board
    pub fn make_move(&mut self, mv: Move) -> Result<HistoryEntry, GameError> {
        if !self.legal_moves().contains(&mv) {
            return Err(GameError::IllegalMove(crate::uci::format_uci_move(mv)));
        }

        // Notation is relative to the position before the move
        let san = format_san(&self.position, mv);
        let uci = to_standard_uci(&self.position, mv);

        self.position.play_unchecked(mv);

        let entry = HistoryEntry {
            mv,
            uci,
            san,
            fen: self.to_fen(),
        };
        self.history.push(entry.clone());

        Ok(entry)
    }

    /// Decode a move string in the given notation against the current position.
    pub fn decode(&self, notation: Notation, text: &str) -> Result<Move, NotationError> {
        match notation {
            Notation::Uci => {
                decode_uci(&self.position, &self.legal_moves(), text).map_err(NotationError::from)
            }
            Notation::San => parse_san(&self.position, text).map_err(NotationError::from),
        }
    }

    /// Get all legal moves for the current position
    pub fn legal_moves(&self) -> Vec<Move> {
        generate_legal_moves(&self.position)
    }

    /// Legal moves in standard UCI notation.
    pub fn legal_moves_uci(&self) -> Vec<String> {
        self.legal_moves()
            .into_iter()
            .map(|mv| to_standard_uci(&self.position, mv))
            .collect()
    }

    /// The history in standard UCI notation, as sent in a `position` command.
    pub fn uci_history(&self) -> Vec<String> {
        self.history.iter().map(|e| e.uci.clone()).collect()
    }

    /// The history in SAN.
    pub fn san_history(&self) -> Vec<String> {
        self.history.iter().map(|e| e.san.clone()).collect()
    }

    /// Get the side to move
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        format_fen(&self.position)
    }

    /// The result of the game, or `None` while it is still being played.
    ///
    /// The fifty-move rule only entitles a player to claim a draw, so the
    /// halfmove clock never ends the game by itself.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.legal_moves().is_empty() {
            if self.position.checkers().is_empty() {
                return Some(Outcome::Stalemate);
            }
            return Some(Outcome::Checkmate {
                winner: PieceColor::from(!self.side_to_move()),
            });
        }
        if insufficient_material(&self.position) {
            return Some(Outcome::InsufficientMaterial);
        }
        None
    }

    pub fn is_over(&self) -> bool {
        self.outcome().is_some()
    }

    /// Replay the history from the start position, re-validating every move.
    /// Returns the resulting board, which must equal [`Game::position`].
    pub fn replay(&self) -> Result<Board, GameError> {
        let mut board = parse_fen(self.start_position.fen())?;
        for entry in &self.history {
            board
                .try_play(entry.mv)
                .map_err(|_| GameError::IllegalMove(entry.uci.clone()))?;
        }
        Ok(board)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// All legal moves of `board`, castling in cozy-chess encoding.
pub fn generate_legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

/// Bare kings, or bare kings plus a single minor piece.
fn insufficient_material(board: &Board) -> bool {
    let occupied = board.occupied().len();
    let minors = (board.pieces(Piece::Knight) | board.pieces(Piece::Bishop)).len();
    occupied == 2 || (occupied == 3 && minors == 1)
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("FEN parse error: {0}")]
    FenError(#[from] crate::fen::FenError),
}

/// Failure to turn client text into a legal move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    /// Not a well-formed move description in the notation's grammar.
    #[error("Malformed move: {0}")]
    Malformed(String),
    /// Well-formed but matches more than one legal move.
    #[error("Ambiguous move: {0}")]
    Ambiguous(String),
    /// Well-formed but not legal in the current position.
    #[error("Illegal move: {0}")]
    Illegal(String),
}

impl From<UciNotationError> for NotationError {
    fn from(err: UciNotationError) -> Self {
        match err {
            UciNotationError::Malformed(s) => Self::Malformed(s),
            UciNotationError::Illegal(s) => Self::Illegal(s),
        }
    }
}

impl From<SanError> for NotationError {
    fn from(err: SanError) -> Self {
        match err {
            SanError::InvalidFormat(s) => Self::Malformed(s),
            SanError::AmbiguousMove(s) => Self::Ambiguous(s),
            SanError::NoLegalMove(s) => Self::Illegal(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn play(game: &mut Game, uci: &str) -> HistoryEntry {
        let mv = game.decode(Notation::Uci, uci).unwrap();
        game.make_move(mv).unwrap()
    }

    #[test]
    fn test_new_game_has_twenty_moves() {
        let game = Game::new();
        assert_eq!(game.legal_moves().len(), 20);
        assert_eq!(game.to_fen(), STARTING_FEN);
        assert!(game.history().is_empty());
        assert_eq!(game.outcome(), None);
    }

    #[test]
    fn test_make_move_records_history() {
        let mut game = Game::new();
        let entry = play(&mut game, "e2e4");
        assert_eq!(entry.san, "e4");
        assert_eq!(entry.uci, "e2e4");
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(
            game.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_make_move_rejects_illegal_and_leaves_state() {
        let mut game = Game::new();
        let before = game.to_fen();
        let mv = crate::uci::parse_uci_move("e2e5").unwrap();
        assert!(matches!(game.make_move(mv), Err(GameError::IllegalMove(_))));
        assert_eq!(game.to_fen(), before);
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_wrong_side_is_illegal() {
        let game = Game::new();
        assert!(matches!(
            game.decode(Notation::Uci, "e7e5"),
            Err(NotationError::Illegal(_))
        ));
        assert!(matches!(
            game.decode(Notation::San, "Nf6"),
            Err(NotationError::Illegal(_))
        ));
    }

    #[test]
    fn test_decode_classifies_errors() {
        let game = Game::new();
        assert!(matches!(
            game.decode(Notation::Uci, "zz99"),
            Err(NotationError::Malformed(_))
        ));
        assert!(matches!(
            game.decode(Notation::San, "Q?x"),
            Err(NotationError::Malformed(_))
        ));
        assert_eq!(
            game.decode(Notation::San, "e4").unwrap(),
            game.decode(Notation::Uci, "e2e4").unwrap()
        );
    }

    #[test]
    fn test_fools_mate_outcome() {
        let mut game = Game::new();
        for mv in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            play(&mut game, mv);
        }
        assert_eq!(
            game.outcome(),
            Some(Outcome::Checkmate {
                winner: PieceColor::Black
            })
        );
        assert_eq!(game.san_history(), vec!["f3", "e5", "g4", "Qh4#"]);
        assert!(game.legal_moves_uci().is_empty());
    }

    #[test]
    fn test_stalemate_outcome() {
        let game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(game.outcome(), Some(Outcome::Stalemate));
    }

    #[test]
    fn test_insufficient_material_outcome() {
        let game = Game::from_fen("8/8/4k3/8/8/3NK3/8/8 w - - 0 1").unwrap();
        assert_eq!(game.outcome(), Some(Outcome::InsufficientMaterial));
        let game = Game::from_fen("8/8/4k3/8/8/3RK3/8/8 w - - 0 1").unwrap();
        assert_eq!(game.outcome(), None);
    }

    #[test]
    fn test_fifty_move_clock_does_not_end_the_game() {
        let mut game = Game::from_fen("8/8/4k3/8/8/3RK3/8/8 w - - 100 80").unwrap();
        assert_eq!(game.outcome(), None);
        play(&mut game, "d3d1");
        assert_eq!(game.outcome(), None);
        assert!(!game.legal_moves().is_empty());
    }

    #[test]
    fn test_castling_history_uses_standard_uci() {
        let mut game =
            Game::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let entry = play(&mut game, "e1g1");
        assert_eq!(entry.uci, "e1g1");
        assert_eq!(entry.san, "O-O");
        assert_eq!(game.uci_history(), vec!["e1g1"]);
    }

    #[test]
    fn test_en_passant_resets_clock() {
        let mut game = Game::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 7 1").unwrap();
        let entry = play(&mut game, "e5d6");
        assert_eq!(entry.san, "exd6");
        assert_eq!(game.to_fen(), "4k3/8/3P4/8/8/8/8/4K3 b - - 0 1");
    }

    proptest! {
        /// Any sequence of legal moves replays to the same position, and
        /// every SAN entry decodes back to the move that produced it.
        #[test]
        fn prop_history_replays(choices in proptest::collection::vec(any::<u16>(), 0..60)) {
            let mut game = Game::new();
            for choice in choices {
                let moves = game.legal_moves();
                if moves.is_empty() {
                    break;
                }
                let mv = moves[choice as usize % moves.len()];
                let before = game.clone();
                let entry = game.make_move(mv).unwrap();
                prop_assert_eq!(before.decode(Notation::San, &entry.san).unwrap(), mv);
                prop_assert_eq!(before.decode(Notation::Uci, &entry.uci).unwrap(), mv);
            }
            let replayed = game.replay().unwrap();
            prop_assert_eq!(format_fen(&replayed), game.to_fen());
        }
    }
}
