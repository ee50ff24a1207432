//! UCI (Universal Chess Interface) move notation

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
}

/// Parse UCI move format (e2e4, e7e8q)
pub fn parse_uci_move(s: &str) -> Result<Move, NotationError> {
    if !s.is_ascii() || !(4..=5).contains(&s.len()) {
        return Err(NotationError::InvalidMove(s.to_string()));
    }

    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;

    let promotion = match s.get(4..5) {
        Some("q") => Some(Piece::Queen),
        Some("r") => Some(Piece::Rook),
        Some("b") => Some(Piece::Bishop),
        Some("n") => Some(Piece::Knight),
        Some(_) => return Err(NotationError::InvalidPromotion(s.to_string())),
        None => None,
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Parse a square in coordinate notation ("e4").
pub fn parse_square(s: &str) -> Result<Square, NotationError> {
    let mut chars = s.chars();
    let (Some(f), Some(r), None) = (chars.next(), chars.next(), chars.next()) else {
        return Err(NotationError::InvalidSquare(s.to_string()));
    };

    let file = match f {
        'a'..='h' => File::index(f as usize - 'a' as usize),
        _ => return Err(NotationError::InvalidSquare(s.to_string())),
    };
    let rank = match r {
        '1'..='8' => Rank::index(r as usize - '1' as usize),
        _ => return Err(NotationError::InvalidSquare(s.to_string())),
    };

    Ok(Square::new(file, rank))
}

pub fn format_square(sq: Square) -> String {
    let file = (b'a' + sq.file() as u8) as char;
    let rank = (b'1' + sq.rank() as u8) as char;
    format!("{}{}", file, rank)
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q")
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(crate::PieceKind::from(promo).to_char_lower());
    }
    s
}

/// Convert UCI castling notation to cozy_chess notation
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8
///
/// The converted move is only returned when it is among `legal_moves`.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_rank_1_or_8 = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);
    let is_g_or_c_file = matches!(mv.to.file(), File::G | File::C);

    if is_rank_1_or_8 && is_e_file && is_g_or_c_file && mv.promotion.is_none() {
        let rook_file = match mv.to.file() {
            File::G => File::H,
            _ => File::A,
        };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };

        if legal_moves.contains(&converted) {
            return converted;
        }
    }

    mv
}

/// Inverse of [`convert_uci_castling_to_cozy`]: turn a king-takes-rook
/// castling move into the king's two-square step.
pub fn convert_cozy_castling_to_uci(board: &Board, mv: Move) -> Move {
    let Some(color) = board.color_on(mv.from) else {
        return mv;
    };
    let is_castle = board.piece_on(mv.from) == Some(Piece::King)
        && board.piece_on(mv.to) == Some(Piece::Rook)
        && board.colors(color).has(mv.to);

    if !is_castle {
        return mv;
    }

    let king_file = if mv.to.file() as u8 > mv.from.file() as u8 {
        File::G
    } else {
        File::C
    };
    Move {
        from: mv.from,
        to: Square::new(king_file, mv.from.rank()),
        promotion: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uci_move() {
        let mv = Move {
            from: Square::new(File::E, Rank::Second),
            to: Square::new(File::E, Rank::Fourth),
            promotion: None,
        };
        assert_eq!(format_uci_move(mv), "e2e4");
    }

    #[test]
    fn test_format_uci_move_with_promotion() {
        let mv = Move {
            from: Square::new(File::E, Rank::Seventh),
            to: Square::new(File::E, Rank::Eighth),
            promotion: Some(Piece::Queen),
        };
        assert_eq!(format_uci_move(mv), "e7e8q");
    }

    #[test]
    fn test_parse_uci_move_with_promotion() {
        let mv = parse_uci_move("a7a8n").unwrap();
        assert_eq!(mv.from, Square::A7);
        assert_eq!(mv.to, Square::A8);
        assert_eq!(mv.promotion, Some(Piece::Knight));
    }

    #[test]
    fn test_parse_rejects_malformed_moves() {
        assert!(parse_uci_move("(none)").is_err());
        assert!(parse_uci_move("e2").is_err());
        assert!(parse_uci_move("e2e9").is_err());
        assert!(parse_uci_move("e7e8k").is_err());
        assert!(parse_uci_move("i2e4").is_err());
    }

    #[test]
    fn test_castling_conversion_both_ways() {
        let board: Board = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        let mut legal = Vec::new();
        board.generate_moves(|mvs| {
            legal.extend(mvs);
            false
        });

        let uci = parse_uci_move("e1g1").unwrap();
        let cozy = convert_uci_castling_to_cozy(uci, &legal);
        assert_eq!(cozy.to, Square::H1);
        assert_eq!(convert_cozy_castling_to_uci(&board, cozy), uci);

        let long = convert_uci_castling_to_cozy(parse_uci_move("e1c1").unwrap(), &legal);
        assert_eq!(long.to, Square::A1);
        assert_eq!(format_uci_move(convert_cozy_castling_to_uci(&board, long)), "e1c1");
    }

    #[test]
    fn test_non_castling_move_is_untouched() {
        let board = Board::default();
        let mv = parse_uci_move("e2e4").unwrap();
        assert_eq!(convert_cozy_castling_to_uci(&board, mv), mv);
        assert_eq!(convert_uci_castling_to_cozy(mv, &[]), mv);
    }
}
