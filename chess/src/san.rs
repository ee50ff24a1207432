//! Standard Algebraic Notation formatting.

use cozy_chess::{Board, GameStatus, Move, Piece};

use crate::types::PieceKind;
use crate::uci::format_square;

/// Format a legal move as SAN. `mv` uses cozy-chess castling form.
pub fn format_san(board: &Board, mv: Move) -> String {
    let Some(piece) = board.piece_on(mv.from) else {
        return crate::uci::format_uci_move(mv);
    };
    let color = board.side_to_move();

    let mut san = String::new();

    let is_castle = piece == Piece::King && board.colors(color).has(mv.to);
    if is_castle {
        if mv.to.file() as u8 > mv.from.file() as u8 {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        let is_capture = board.colors(!color).has(mv.to)
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

        if piece == Piece::Pawn {
            if is_capture {
                san.push(file_char(mv));
            }
        } else {
            san.push(PieceKind::from(piece).to_char_upper());
            san.push_str(&disambiguation(board, mv, piece));
        }

        if is_capture {
            san.push('x');
        }
        san.push_str(&format_square(mv.to));

        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(PieceKind::from(promo).to_char_upper());
        }
    }

    let mut after = board.clone();
    after.play_unchecked(mv);
    if after.status() == GameStatus::Won {
        san.push('#');
    } else if !after.checkers().is_empty() {
        san.push('+');
    }

    san
}

fn file_char(mv: Move) -> char {
    (b'a' + mv.from.file() as u8) as char
}

/// File, rank, or full square of the origin when another piece of the same
/// kind could reach the same destination.
fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let mut rivals = Vec::new();
    board.generate_moves(|mvs| {
        if mvs.piece == piece && mvs.from != mv.from {
            rivals.extend(mvs.into_iter().filter(|m| m.to == mv.to).map(|m| m.from));
        }
        false
    });

    if rivals.is_empty() {
        return String::new();
    }

    let origin = format_square(mv.from);
    if rivals.iter().all(|sq| sq.file() != mv.from.file()) {
        origin[0..1].to_string()
    } else if rivals.iter().all(|sq| sq.rank() != mv.from.rank()) {
        origin[1..2].to_string()
    } else {
        origin
    }
}
