//! UCI (Universal Chess Interface) move notation
//!
//! cozy-chess encodes castling as "king captures own rook" (e1h1), while the
//! UCI protocol and the client-facing move lists use the king's two-square
//! step (e1g1). Every move crossing this boundary goes through this module.

use cozy_chess::{Board, File, Move, Piece, Square};

use crate::converters::{format_piece, format_square, parse_piece, parse_square};

/// Whether `mv` is a castling move in cozy-chess encoding on `board`.
pub fn is_castling(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move())
        && board.piece_on(mv.to) == Some(Piece::Rook)
}

/// Format a move of `board` in standard UCI notation (castling as e1g1).
pub fn to_standard_uci(board: &Board, mv: Move) -> String {
    if is_castling(board, mv) {
        let king_file = if mv.to.file() as usize > mv.from.file() as usize {
            File::G
        } else {
            File::C
        };
        return format_uci_move(Move {
            from: mv.from,
            to: Square::new(king_file, mv.from.rank()),
            promotion: None,
        });
    }
    format_uci_move(mv)
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q") without any
/// castling translation.
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(format_piece(promo));
    }
    s
}

/// Parse the coordinate grammar only: two squares and an optional
/// promotion letter. Says nothing about legality.
pub fn parse_uci_move(s: &str) -> Result<Move, UciNotationError> {
    let s = s.trim();
    if !s.is_ascii() || !(4..=5).contains(&s.len()) {
        return Err(UciNotationError::Malformed(s.to_string()));
    }
    let from = parse_square(&s[0..2]).ok_or_else(|| UciNotationError::Malformed(s.to_string()))?;
    let to = parse_square(&s[2..4]).ok_or_else(|| UciNotationError::Malformed(s.to_string()))?;
    let promotion = match s[4..].chars().next() {
        None => None,
        Some(c) => match parse_piece(c) {
            Some(p @ (Piece::Queen | Piece::Rook | Piece::Bishop | Piece::Knight))
                if c.is_ascii_lowercase() =>
            {
                Some(p)
            }
            _ => return Err(UciNotationError::Malformed(s.to_string())),
        },
    };
    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Decode a standard UCI string against `legal_moves` of `board`.
///
/// The king-takes-rook form is not accepted: a move is legal only when its
/// standard rendering equals the input.
pub fn decode_uci(board: &Board, legal_moves: &[Move], s: &str) -> Result<Move, UciNotationError> {
    let parsed = parse_uci_move(s)?;
    let wanted = format_uci_move(parsed);
    legal_moves
        .iter()
        .copied()
        .find(|mv| to_standard_uci(board, *mv) == wanted)
        .ok_or(UciNotationError::Illegal(wanted))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UciNotationError {
    #[error("Malformed UCI move: {0}")]
    Malformed(String),
    #[error("Move {0} is not legal in this position")]
    Illegal(String),
}
