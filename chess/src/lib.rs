//! Rules-engine layer for the coach: positions, legality, notation.
//!
//! cozy-chess does the move generation; this crate adds the pieces the
//! analysis core needs on top of it (standard UCI castling, SAN, attack
//! queries and terminal-state checks).

pub mod fen;
pub mod game;
pub mod position;
pub mod san;
pub mod types;
pub mod uci;

pub use fen::{format_fen, parse_fen, FenError};
pub use game::{Game, GameError};
pub use position::{PlayedMove, Position};
pub use types::{PieceColor, PieceKind};
pub use uci::{
    convert_cozy_castling_to_uci, convert_uci_castling_to_cozy, format_square, format_uci_move,
    parse_square, parse_uci_move, NotationError,
};

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
