use crate::position::{PlayedMove, Position};
use crate::types::PieceColor;

/// A game from a start position plus the moves played so far.
#[derive(Debug, Clone, Default)]
pub struct Game {
    start: Position,
    position: Position,
    history: Vec<PlayedMove>,
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let start = Position::from_fen(fen)?;
        Ok(Self {
            position: start.clone(),
            start,
            history: Vec::new(),
        })
    }

    /// Get the current board position
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn start_position(&self) -> &Position {
        &self.start
    }

    /// Get the move history
    pub fn history(&self) -> &[PlayedMove] {
        &self.history
    }

    /// Moves played so far in engine notation, oldest first.
    pub fn uci_history(&self) -> Vec<String> {
        self.history.iter().map(|m| m.uci.clone()).collect()
    }

    /// Play a move given in engine notation.
    pub fn make_move_uci(&mut self, uci: &str) -> Result<PlayedMove, GameError> {
        let played = self
            .position
            .apply_uci(uci)
            .ok_or_else(|| GameError::IllegalMove(uci.to_string()))?;
        self.position = played.after.clone();
        self.history.push(played.clone());
        Ok(played)
    }

    /// Undo the last move
    pub fn undo(&mut self) -> Result<PlayedMove, GameError> {
        let last = self.history.pop().ok_or(GameError::NothingToUndo)?;
        self.position = self
            .history
            .last()
            .map(|m| m.after.clone())
            .unwrap_or_else(|| self.start.clone());
        Ok(last)
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.position.side_to_move()
    }

    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }

    pub fn is_over(&self) -> bool {
        self.position.is_game_over()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("FEN parse error: {0}")]
    FenError(#[from] crate::fen::FenError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_and_undo_moves() {
        let mut game = Game::new();
        game.make_move_uci("e2e4").unwrap();
        game.make_move_uci("e7e5").unwrap();
        assert_eq!(game.uci_history(), vec!["e2e4", "e7e5"]);
        assert_eq!(game.side_to_move(), PieceColor::White);

        let undone = game.undo().unwrap();
        assert_eq!(undone.uci, "e7e5");
        assert_eq!(game.side_to_move(), PieceColor::Black);

        game.undo().unwrap();
        assert_eq!(game.to_fen(), crate::START_FEN);
        assert!(matches!(game.undo(), Err(GameError::NothingToUndo)));
    }

    #[test]
    fn test_illegal_move_leaves_game_untouched() {
        let mut game = Game::new();
        assert!(matches!(
            game.make_move_uci("e2e5"),
            Err(GameError::IllegalMove(_))
        ));
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_fools_mate_ends_the_game() {
        let mut game = Game::new();
        for mv in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            game.make_move_uci(mv).unwrap();
        }
        assert!(game.is_over());
        assert!(game.position().is_checkmate());
        assert_eq!(game.history().last().unwrap().san, "Qh4#");
    }
}
