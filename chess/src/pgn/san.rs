use cozy_chess::{Board, GameStatus, Move, Piece, Square};

use crate::converters::{file_char, format_piece_upper, parse_file, parse_piece, parse_rank, rank_char};
use crate::game::generate_legal_moves;
use crate::uci::{format_uci_move, is_castling};

/// Parse Standard Algebraic Notation (SAN) move
///
/// Trailing annotations (`+`, `#`, `!`, `?`) are ignored, castling accepts
/// both `O-O` and `0-0`, and promotions may omit the `=`. The capture marker
/// is not checked against the board.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let text = san
        .trim()
        .trim_end_matches(|c: char| matches!(c, '+' | '#' | '!' | '?'));
    if text.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let legal = generate_legal_moves(board);

    if let Some(kingside) = castling_side(text) {
        return legal
            .into_iter()
            .find(|&mv| is_castling(board, mv) && is_kingside(mv) == kingside)
            .ok_or_else(|| SanError::NoLegalMove(san.to_string()));
    }

    let spec = SanSpec::parse(text).ok_or_else(|| SanError::InvalidFormat(san.to_string()))?;

    let candidates: Vec<Move> = legal
        .into_iter()
        .filter(|&mv| !is_castling(board, mv))
        .filter(|mv| spec.matches(board, mv))
        .collect();

    match candidates.as_slice() {
        [] => Err(SanError::NoLegalMove(san.to_string())),
        [mv] => Ok(*mv),
        _ => Err(SanError::AmbiguousMove(san.to_string())),
    }
}

/// Format a legal move of `board` as SAN, including check and mate suffixes.
pub fn format_san(board: &Board, mv: Move) -> String {
    let mut san = if is_castling(board, mv) {
        if is_kingside(mv) {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        }
    } else {
        match board.piece_on(mv.from) {
            Some(piece) => format_piece_move(board, mv, piece),
            None => return format_uci_move(mv),
        }
    };

    let mut after = board.clone();
    if after.try_play(mv).is_ok() && !after.checkers().is_empty() {
        san.push(if after.status() == GameStatus::Won {
            '#'
        } else {
            '+'
        });
    }

    san
}

fn format_piece_move(board: &Board, mv: Move, piece: Piece) -> String {
    let mut san = String::new();
    let is_capture = board.color_on(mv.to) == Some(!board.side_to_move())
        || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

    if piece == Piece::Pawn {
        if is_capture {
            san.push(file_char(mv.from.file()));
        }
    } else {
        san.push(format_piece_upper(piece));
        if piece != Piece::King {
            san.push_str(&disambiguation(board, mv, piece));
        }
    }

    if is_capture {
        san.push('x');
    }
    san.push(file_char(mv.to.file()));
    san.push(rank_char(mv.to.rank()));

    if let Some(promo) = mv.promotion {
        san.push('=');
        san.push(format_piece_upper(promo));
    }

    san
}

/// Minimal origin hint: file if it is unique among rivals, else rank, else both.
fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let rivals: Vec<Square> = generate_legal_moves(board)
        .into_iter()
        .filter(|other| {
            other.to == mv.to && other.from != mv.from && board.piece_on(other.from) == Some(piece)
        })
        .map(|other| other.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }
    let file = file_char(mv.from.file());
    let rank = rank_char(mv.from.rank());
    if rivals.iter().all(|sq| sq.file() != mv.from.file()) {
        file.to_string()
    } else if rivals.iter().all(|sq| sq.rank() != mv.from.rank()) {
        rank.to_string()
    } else {
        format!("{}{}", file, rank)
    }
}

fn castling_side(text: &str) -> Option<bool> {
    match text {
        "O-O" | "0-0" => Some(true),
        "O-O-O" | "0-0-0" => Some(false),
        _ => None,
    }
}

fn is_kingside(mv: Move) -> bool {
    mv.to.file() as usize > mv.from.file() as usize
}

/// The constraints a non-castling SAN string places on a move.
#[derive(Debug)]
struct SanSpec {
    piece: Piece,
    from_file: Option<cozy_chess::File>,
    from_rank: Option<cozy_chess::Rank>,
    to: Square,
    promotion: Option<Piece>,
}

impl SanSpec {
    fn parse(text: &str) -> Option<Self> {
        let chars: Vec<char> = text.chars().collect();

        let (piece, rest) = match chars.first() {
            Some(&c) if "KQRBN".contains(c) => (parse_piece(c)?, &chars[1..]),
            Some(_) => (Piece::Pawn, &chars[..]),
            None => return None,
        };

        let (body, promotion) = match rest.iter().position(|&c| c == '=') {
            Some(idx) => match &rest[idx + 1..] {
                [c] => (&rest[..idx], Some(promotion_piece(*c)?)),
                _ => return None,
            },
            None => match rest.last() {
                Some(&c) if piece == Piece::Pawn && "QRBN".contains(c) => {
                    (&rest[..rest.len() - 1], Some(promotion_piece(c)?))
                }
                _ => (rest, None),
            },
        };
        if promotion.is_some() && piece != Piece::Pawn {
            return None;
        }
        if body.len() < 2 {
            return None;
        }

        let (origin, dest) = body.split_at(body.len() - 2);
        let to = Square::new(parse_file(dest[0])?, parse_rank(dest[1])?);

        let origin = match origin.split_last() {
            Some((&'x', head)) => head,
            _ => origin,
        };
        let (from_file, from_rank) = match origin {
            [] => (None, None),
            [c] => match (parse_file(*c), parse_rank(*c)) {
                (Some(f), _) => (Some(f), None),
                (None, Some(r)) => (None, Some(r)),
                _ => return None,
            },
            [f, r] => (Some(parse_file(*f)?), Some(parse_rank(*r)?)),
            _ => return None,
        };

        Some(Self {
            piece,
            from_file,
            from_rank,
            to,
            promotion,
        })
    }

    fn matches(&self, board: &Board, mv: &Move) -> bool {
        board.piece_on(mv.from) == Some(self.piece)
            && mv.to == self.to
            && mv.promotion == self.promotion
            && self.from_file.map_or(true, |f| mv.from.file() == f)
            && self.from_rank.map_or(true, |r| mv.from.rank() == r)
    }
}

fn promotion_piece(c: char) -> Option<Piece> {
    match c {
        'Q' | 'R' | 'B' | 'N' => parse_piece(c),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uci::parse_uci_move;

    fn board(fen: &str) -> Board {
        Board::from_fen(fen, false).unwrap()
    }

    fn san_of(board: &Board, uci: &str) -> String {
        let mv = crate::uci::decode_uci(board, &generate_legal_moves(board), uci).unwrap();
        format_san(board, mv)
    }

    #[test]
    fn test_format_opening_moves() {
        let b = Board::default();
        assert_eq!(san_of(&b, "e2e4"), "e4");
        assert_eq!(san_of(&b, "g1f3"), "Nf3");
    }

    #[test]
    fn test_format_castling() {
        let b = board("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        assert_eq!(san_of(&b, "e1g1"), "O-O");
        assert_eq!(san_of(&b, "e1c1"), "O-O-O");
    }

    #[test]
    fn test_format_file_disambiguation() {
        let b = board("rnbqkbnr/pppppppp/8/8/8/5N2/PPP1PPPP/RNBQKB1R w KQkq - 0 1");
        assert_eq!(san_of(&b, "b1d2"), "Nbd2");
        assert_eq!(san_of(&b, "f3d2"), "Nfd2");
    }

    #[test]
    fn test_format_rank_disambiguation() {
        let b = board("4k3/8/8/R7/8/8/8/R3K3 w - - 0 1");
        assert_eq!(san_of(&b, "a1a3"), "R1a3");
        assert_eq!(san_of(&b, "a5a3"), "R5a3");
    }

    #[test]
    fn test_format_en_passant_capture() {
        let b = board("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        assert_eq!(san_of(&b, "e5d6"), "exd6");
    }

    #[test]
    fn test_format_promotion_with_check() {
        let b = board("8/P7/8/8/8/8/8/k6K w - - 0 1");
        assert_eq!(san_of(&b, "a7a8q"), "a8=Q+");
        assert_eq!(san_of(&b, "a7a8n"), "a8=N");
    }

    #[test]
    fn test_format_mate() {
        let b = board("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2");
        assert_eq!(san_of(&b, "d8h4"), "Qh4#");
    }

    #[test]
    fn test_parse_simple_moves() {
        let b = Board::default();
        assert_eq!(parse_san(&b, "e4").unwrap(), parse_uci_move("e2e4").unwrap());
        assert_eq!(parse_san(&b, "Nf3").unwrap(), parse_uci_move("g1f3").unwrap());
        assert_eq!(parse_san(&b, "Nf3!?").unwrap(), parse_uci_move("g1f3").unwrap());
    }

    #[test]
    fn test_parse_castling_variants() {
        let b = board("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        let short = parse_san(&b, "O-O").unwrap();
        assert_eq!(short, parse_san(&b, "0-0").unwrap());
        assert!(is_castling(&b, short));
        assert!(is_kingside(short));
        assert!(!is_kingside(parse_san(&b, "O-O-O").unwrap()));
    }

    #[test]
    fn test_parse_castling_unavailable() {
        assert!(matches!(
            parse_san(&Board::default(), "O-O"),
            Err(SanError::NoLegalMove(_))
        ));
    }

    #[test]
    fn test_parse_disambiguation() {
        let b = board("rnbqkbnr/pppppppp/8/8/8/5N2/PPP1PPPP/RNBQKB1R w KQkq - 0 1");
        assert_eq!(parse_san(&b, "Nbd2").unwrap(), parse_uci_move("b1d2").unwrap());
        assert!(matches!(
            parse_san(&b, "Nd2"),
            Err(SanError::AmbiguousMove(_))
        ));
    }

    #[test]
    fn test_parse_promotion_forms() {
        let b = board("8/P7/8/8/8/8/8/k6K w - - 0 1");
        let expected = parse_uci_move("a7a8q").unwrap();
        assert_eq!(parse_san(&b, "a8=Q+").unwrap(), expected);
        assert_eq!(parse_san(&b, "a8Q").unwrap(), expected);
        assert!(matches!(parse_san(&b, "a8"), Err(SanError::NoLegalMove(_))));
    }

    #[test]
    fn test_parse_en_passant() {
        let b = board("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        assert_eq!(parse_san(&b, "exd6").unwrap(), parse_uci_move("e5d6").unwrap());
    }

    #[test]
    fn test_parse_illegal_vs_malformed() {
        let b = Board::default();
        assert!(matches!(parse_san(&b, "Ke2"), Err(SanError::NoLegalMove(_))));
        assert!(matches!(parse_san(&b, "e5"), Err(SanError::NoLegalMove(_))));
        for garbage in ["", "+", "Zz9", "Nf9", "hello", "Nf3=Q", "e2e4e5"] {
            assert!(
                matches!(parse_san(&b, garbage), Err(SanError::InvalidFormat(_))),
                "{garbage:?} should be malformed"
            );
        }
    }
}
