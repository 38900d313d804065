//! Lightweight board representation for rendering from FEN.

use crate::types::{PieceColor, PieceKind};

const FILE_HEADER: &str = " A B C D E F G H";

/// An 8x8 board for display purposes only.
#[derive(Debug, Clone, Default)]
pub struct DisplayBoard {
    squares: [[Option<(PieceKind, PieceColor)>; 8]; 8],
}

impl DisplayBoard {
    /// Parse the board placement from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, DisplayBoardError> {
        let placement = fen
            .split_whitespace()
            .next()
            .ok_or(DisplayBoardError::InvalidFen)?;

        let mut squares = [[None; 8]; 8];
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(DisplayBoardError::InvalidFen);
        }

        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx;
            let mut file = 0usize;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                } else {
                    if file > 7 {
                        return Err(DisplayBoardError::InvalidFen);
                    }
                    let color = if c.is_uppercase() {
                        PieceColor::White
                    } else {
                        PieceColor::Black
                    };
                    let kind = PieceKind::from_char(c).ok_or(DisplayBoardError::InvalidPiece(c))?;
                    squares[rank][file] = Some((kind, color));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(DisplayBoardError::InvalidFen);
            }
        }

        Ok(DisplayBoard { squares })
    }

    pub fn piece_at(&self, file: u8, rank: u8) -> Option<(PieceKind, PieceColor)> {
        if file > 7 || rank > 7 {
            return None;
        }
        self.squares[rank as usize][file as usize]
    }

    /// Text diagram from White's side: a file header, then ranks 8 to 1 with
    /// one glyph per square and `-` for empty squares.
    pub fn draw(&self) -> String {
        let mut out = String::from(FILE_HEADER);
        out.push('\n');
        for rank in (0..8u8).rev() {
            out.push(char::from(b'1' + rank));
            for file in 0..8u8 {
                let cell = self
                    .piece_at(file, rank)
                    .map_or('-', |(kind, color)| kind.glyph(color));
                out.push(cell);
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayBoardError {
    #[error("Invalid FEN string")]
    InvalidFen,
    #[error("Invalid piece character: {0}")]
    InvalidPiece(char),
}
