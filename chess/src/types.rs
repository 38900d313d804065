//! Project-owned piece and color types used by rendering and the views.
//! cozy-chess types stay behind the `Game` API.

use serde::Serialize;

/// Project-owned piece type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// Project-owned color type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceColor {
    White,
    Black,
}

impl PieceKind {
    /// Unicode chess glyph for this piece in `color`.
    pub fn glyph(self, color: PieceColor) -> char {
        match (color, self) {
            (PieceColor::White, Self::King) => '♔',
            (PieceColor::White, Self::Queen) => '♕',
            (PieceColor::White, Self::Rook) => '♖',
            (PieceColor::White, Self::Bishop) => '♗',
            (PieceColor::White, Self::Knight) => '♘',
            (PieceColor::White, Self::Pawn) => '♙',
            (PieceColor::Black, Self::King) => '♚',
            (PieceColor::Black, Self::Queen) => '♛',
            (PieceColor::Black, Self::Rook) => '♜',
            (PieceColor::Black, Self::Bishop) => '♝',
            (PieceColor::Black, Self::Knight) => '♞',
            (PieceColor::Black, Self::Pawn) => '♟',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(Self::Pawn),
            'n' => Some(Self::Knight),
            'b' => Some(Self::Bishop),
            'r' => Some(Self::Rook),
            'q' => Some(Self::Queen),
            'k' => Some(Self::King),
            _ => None,
        }
    }
}

impl PieceColor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

impl From<cozy_chess::Color> for PieceColor {
    fn from(c: cozy_chess::Color) -> Self {
        match c {
            cozy_chess::Color::White => Self::White,
            cozy_chess::Color::Black => Self::Black,
        }
    }
}

impl std::fmt::Display for PieceColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
