//! Position wrapper: the rules-engine surface the analysis core calls.

use cozy_chess::{BitBoard, Board, GameStatus, Move, Piece, Square};

use crate::fen::{format_fen, parse_fen, FenError};
use crate::types::{PieceColor, PieceKind};
use crate::uci::{
    convert_cozy_castling_to_uci, convert_uci_castling_to_cozy, format_uci_move, parse_uci_move,
};

#[derive(Debug, Clone)]
pub struct Position {
    board: Board,
}

/// A move that was accepted by [`Position::apply_move`].
#[derive(Debug, Clone)]
pub struct PlayedMove {
    /// The move in cozy-chess form (castling is king-takes-rook).
    pub mv: Move,
    /// Standard UCI notation, as an engine would write it.
    pub uci: String,
    pub san: String,
    pub piece: PieceKind,
    pub color: PieceColor,
    pub from: Square,
    /// Destination of the moving piece (the king's square when castling).
    pub to: Square,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub after: Position,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            board: Board::default(),
        }
    }
}

impl From<Board> for Position {
    fn from(board: Board) -> Self {
        Self { board }
    }
}

impl Position {
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        parse_fen(fen).map(Self::from)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_fen(&self) -> String {
        format_fen(&self.board)
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.board.side_to_move().into()
    }

    pub fn piece_on(&self, sq: Square) -> Option<(PieceKind, PieceColor)> {
        let piece = self.board.piece_on(sq)?;
        let color = self.board.color_on(sq)?;
        Some((piece.into(), color.into()))
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.board.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    /// All pieces of `color` that attack `sq`, regardless of whose turn it is.
    pub fn attackers_of(&self, sq: Square, color: PieceColor) -> BitBoard {
        let board = &self.board;
        let color: cozy_chess::Color = color.into();
        let occupied = board.occupied();
        let color_pieces = board.colors(color);

        let mut attackers = BitBoard::EMPTY;

        // A pawn of `color` attacks `sq` if `sq` is in that pawn's attack set,
        // i.e. the pawn sits where an opposite-coloured pawn on `sq` would attack.
        let pawn_attacks = cozy_chess::get_pawn_attacks(sq, !color);
        attackers |= pawn_attacks & board.pieces(Piece::Pawn) & color_pieces;

        let knight_attacks = cozy_chess::get_knight_moves(sq);
        attackers |= knight_attacks & board.pieces(Piece::Knight) & color_pieces;

        let bishop_attacks = cozy_chess::get_bishop_moves(sq, occupied);
        attackers |= bishop_attacks
            & (board.pieces(Piece::Bishop) | board.pieces(Piece::Queen))
            & color_pieces;

        let rook_attacks = cozy_chess::get_rook_moves(sq, occupied);
        attackers |=
            rook_attacks & (board.pieces(Piece::Rook) | board.pieces(Piece::Queen)) & color_pieces;

        let king_attacks = cozy_chess::get_king_moves(sq);
        attackers |= king_attacks & board.pieces(Piece::King) & color_pieces;

        attackers
    }

    pub fn is_square_attacked(&self, sq: Square, by: PieceColor) -> bool {
        !self.attackers_of(sq, by).is_empty()
    }

    /// Resolve engine notation to the matching legal move, if any.
    pub fn resolve_uci(&self, uci: &str) -> Option<Move> {
        let mv = self.normalize_castling(parse_uci_move(uci).ok()?);
        self.board.is_legal(mv).then_some(mv)
    }

    /// Only a king's two-square step is castling; a rook `e1g1` stays as is.
    fn normalize_castling(&self, mv: Move) -> Move {
        if self.board.piece_on(mv.from) == Some(Piece::King) {
            convert_uci_castling_to_cozy(mv, &self.legal_moves())
        } else {
            mv
        }
    }

    /// Apply a move given as squares. Returns `None` for illegal moves.
    pub fn apply(
        &self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Option<PlayedMove> {
        let mv = Move {
            from,
            to,
            promotion: promotion.map(Piece::from),
        };
        self.apply_move(self.normalize_castling(mv))
    }

    pub fn apply_uci(&self, uci: &str) -> Option<PlayedMove> {
        let mv = self.resolve_uci(uci)?;
        self.apply_move(mv)
    }

    pub fn apply_move(&self, mv: Move) -> Option<PlayedMove> {
        if !self.board.is_legal(mv) {
            return None;
        }

        let piece = self.board.piece_on(mv.from)?;
        let color = self.board.color_on(mv.from)?;
        let standard = convert_cozy_castling_to_uci(&self.board, mv);
        let is_castle = standard != mv;

        let captured = if is_castle {
            None
        } else if let Some(target) = self.board.piece_on(mv.to) {
            Some(target.into())
        } else if piece == Piece::Pawn && mv.from.file() != mv.to.file() {
            // En passant: the pawn lands on an empty square.
            Some(PieceKind::Pawn)
        } else {
            None
        };

        let san = crate::san::format_san(&self.board, mv);
        let mut after = self.board.clone();
        after.play_unchecked(mv);

        Some(PlayedMove {
            mv,
            uci: format_uci_move(standard),
            san,
            piece: piece.into(),
            color: color.into(),
            from: mv.from,
            to: standard.to,
            captured,
            promotion: mv.promotion.map(PieceKind::from),
            after: Position { board: after },
        })
    }

    /// SAN for a move given in engine notation.
    pub fn san_of_uci(&self, uci: &str) -> Option<String> {
        let mv = self.resolve_uci(uci)?;
        Some(crate::san::format_san(&self.board, mv))
    }

    pub fn is_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    pub fn is_checkmate(&self) -> bool {
        self.board.status() == GameStatus::Won
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_check() && self.legal_moves().is_empty()
    }

    /// Stalemate, the fifty-move rule, or bare kings / a lone minor piece.
    pub fn is_draw(&self) -> bool {
        self.board.status() == GameStatus::Drawn || self.is_insufficient_material()
    }

    pub fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw()
    }

    fn is_insufficient_material(&self) -> bool {
        let board = &self.board;
        let non_kings = board.occupied() & !board.pieces(Piece::King);
        match non_kings.len() {
            0 => true,
            1 => {
                let minors = board.pieces(Piece::Knight) | board.pieces(Piece::Bishop);
                !(non_kings & minors).is_empty()
            }
            _ => false,
        }
    }

    /// Every capture `by` could make right now, as (from, to) pairs.
    ///
    /// When `by` is not the side to move the turn is passed with a null move;
    /// a side in check cannot pass, so that case yields nothing.
    pub fn capture_threats(&self, by: PieceColor) -> Vec<(Square, Square)> {
        let board = if self.side_to_move() == by {
            self.board.clone()
        } else {
            match self.board.null_move() {
                Some(board) => board,
                None => return Vec::new(),
            }
        };

        let enemy = board.colors(!board.side_to_move());
        let mut threats = Vec::new();
        board.generate_moves(|mvs| {
            for mv in mvs {
                if enemy.has(mv.to) {
                    threats.push((mv.from, mv.to));
                }
            }
            false
        });
        threats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn test_apply_uci_start_position() {
        let start = Position::default();
        let played = start.apply_uci("e2e4").unwrap();
        assert_eq!(played.uci, "e2e4");
        assert_eq!(played.san, "e4");
        assert_eq!(played.piece, PieceKind::Pawn);
        assert_eq!(played.color, PieceColor::White);
        assert_eq!(played.after.side_to_move(), PieceColor::Black);
    }

    #[test]
    fn test_illegal_move_is_rejected() {
        let start = Position::default();
        assert!(start.apply_uci("e2e5").is_none());
        assert!(start.apply_uci("garbage").is_none());
        assert!(start.apply(Square::E1, Square::E2, None).is_none());
    }

    #[test]
    fn test_castling_reports_standard_notation() {
        let p = pos("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let played = p.apply_uci("e1g1").unwrap();
        assert_eq!(played.uci, "e1g1");
        assert_eq!(played.san, "O-O");
        assert_eq!(played.to, Square::G1);
        assert!(played.captured.is_none());
        assert_eq!(
            played.after.piece_on(Square::G1),
            Some((PieceKind::King, PieceColor::White))
        );
    }

    #[test]
    fn test_capture_and_en_passant_are_recorded() {
        let p = pos("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        let played = p.apply_uci("e5d6").unwrap();
        assert_eq!(played.captured, Some(PieceKind::Pawn));
        assert_eq!(played.san, "exd6");
        assert!(played.after.piece_on(Square::D5).is_none());
    }

    #[test]
    fn test_square_attacks() {
        let start = Position::default();
        assert!(start.is_square_attacked(Square::E3, PieceColor::White));
        assert!(start.is_square_attacked(Square::F6, PieceColor::Black));
        assert!(!start.is_square_attacked(Square::E4, PieceColor::White));
        assert!(!start.is_square_attacked(Square::E4, PieceColor::Black));
    }

    #[test]
    fn test_checkmate_and_stalemate() {
        let mated = pos("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
        assert!(mated.is_checkmate());
        assert!(mated.is_game_over());
        assert!(!mated.is_stalemate());

        let stale = pos("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert!(stale.is_stalemate());
        assert!(stale.is_draw());
        assert!(!stale.is_checkmate());
    }

    #[test]
    fn test_bare_kings_are_drawn() {
        assert!(pos("4k3/8/8/8/8/8/8/4K3 w - - 0 1").is_draw());
        assert!(pos("4k3/8/8/8/8/8/8/3NK3 w - - 0 1").is_draw());
        assert!(!pos("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").is_draw());
    }

    #[test]
    fn test_capture_threats_for_side_not_to_move() {
        // White to move; the black knight on d5 could take the white pawn on e3 or the knight on c3.
        let p = pos("4k3/8/8/3n4/8/2N1P3/8/4K3 w - - 0 1");
        let threats = p.capture_threats(PieceColor::Black);
        assert!(threats.contains(&(Square::D5, Square::E3)));
        assert!(threats.contains(&(Square::D5, Square::C3)));

        let own = p.capture_threats(PieceColor::White);
        assert_eq!(own, vec![(Square::C3, Square::D5)]);
    }

    #[test]
    fn test_fen_round_trip_through_position() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        assert_eq!(pos(fen).to_fen(), fen);
    }

    mod playouts {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Engine notation produced for a move resolves back to that same move,
            /// castling included.
            #[test]
            fn uci_notation_resolves_to_the_played_move(picks in prop::collection::vec(any::<usize>(), 1..60)) {
                let mut position = Position::default();
                for pick in picks {
                    let legal = position.legal_moves();
                    if legal.is_empty() {
                        break;
                    }
                    let played = position.apply_move(legal[pick % legal.len()]).unwrap();
                    let replayed = position.apply_uci(&played.uci).unwrap();
                    prop_assert_eq!(replayed.mv, played.mv);
                    prop_assert_eq!(replayed.after.to_fen(), played.after.to_fen());
                    prop_assert_eq!(position.san_of_uci(&played.uci), Some(played.san.clone()));
                    position = played.after;
                }
            }
        }
    }
}
