//! Whole-game review: evaluate every position, classify every move, and
//! estimate both players.

use analysis::{
    estimate_game, explain, Classification, Classifier, EloEstimate, MoveMeta, MoveRecord,
    OpeningBook, Severity,
};
use chess::{Game, GameError, PieceColor, Position};
use engine::EngineSession;
use serde::Serialize;

/// Evaluation given to a checkmated side to move.
const MATED: f64 = -100.0;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Invalid start position: {0}")]
    InvalidStart(#[source] GameError),
    #[error("Illegal move {uci} at ply {ply}")]
    IllegalMove { ply: usize, uci: String },
}

/// One reviewed ply.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewedPly {
    /// 1-based.
    pub ply: usize,
    pub fen_before: String,
    #[serde(flatten)]
    pub record: MoveRecord,
    /// Engine's first choice before the move, in UCI and SAN.
    pub best_move: Option<String>,
    pub best_san: Option<String>,
    pub explanation: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameReview {
    pub plies: Vec<ReviewedPly>,
    pub white: EloEstimate,
    pub black: EloEstimate,
}

impl GameReview {
    pub fn records(&self) -> Vec<MoveRecord> {
        self.plies.iter().map(|p| p.record.clone()).collect()
    }

    pub fn count(&self, mover: PieceColor, class: Classification) -> usize {
        self.plies
            .iter()
            .filter(|p| p.record.mover == mover && p.record.classification() == Some(class))
            .count()
    }
}

/// Evaluation of one position from its side to move.
#[derive(Debug, Clone, PartialEq)]
struct Assessment {
    evaluation: f64,
    best_move: Option<String>,
}

async fn assess(session: &EngineSession, position: &Position, depth: u32) -> Assessment {
    if position.is_checkmate() {
        return Assessment {
            evaluation: MATED,
            best_move: None,
        };
    }
    if position.is_game_over() {
        return Assessment {
            evaluation: 0.0,
            best_move: None,
        };
    }

    match session.best_move(position.to_fen(), depth).await {
        Some(result) => Assessment {
            evaluation: result.evaluation.unwrap_or(0.0),
            best_move: result.mv,
        },
        None => {
            tracing::warn!(fen = %position.to_fen(), "No engine result, scoring position as level");
            Assessment {
                evaluation: 0.0,
                best_move: None,
            }
        }
    }
}

/// Review `moves` (UCI) played from `start_fen`, or the initial position.
pub async fn review_game(
    session: &EngineSession,
    start_fen: Option<&str>,
    moves: &[String],
    depth: u32,
    book: &dyn OpeningBook,
) -> Result<GameReview, ReviewError> {
    review_game_with(session, start_fen, moves, depth, book, &Classifier::default()).await
}

pub async fn review_game_with(
    session: &EngineSession,
    start_fen: Option<&str>,
    moves: &[String],
    depth: u32,
    book: &dyn OpeningBook,
    classifier: &Classifier,
) -> Result<GameReview, ReviewError> {
    let mut game = match start_fen {
        Some(fen) => Game::from_fen(fen).map_err(ReviewError::InvalidStart)?,
        None => Game::new(),
    };
    // Book lines are sequences from the initial position.
    let from_start = start_fen.is_none();

    tracing::info!(plies = moves.len(), depth, "Starting review");

    let mut plies = Vec::with_capacity(moves.len());
    let mut before = assess(session, game.position(), depth).await;
    let mut in_book = from_start;

    for (i, uci) in moves.iter().enumerate() {
        let ply = i + 1;
        let position = game.position().clone();
        let played = game.make_move_uci(uci).map_err(|_| ReviewError::IllegalMove {
            ply,
            uci: uci.clone(),
        })?;

        let after = assess(session, &played.after, depth).await;

        in_book = in_book && book.is_book(&moves[..=i]);
        let meta = MoveMeta::from_move(&position, &played, before.best_move.as_deref(), in_book);
        let class = classifier.classify(before.evaluation, after.evaluation, Some(&meta));

        let mut record = MoveRecord::new(
            played.uci.clone(),
            played.san.clone(),
            played.color,
            played.after.to_fen(),
        )
        .with_evals(before.evaluation, after.evaluation);
        record.set_classification(class);

        let best_san = before
            .best_move
            .as_deref()
            .and_then(|best| position.san_of_uci(best));
        let named = best_san
            .clone()
            .or_else(|| before.best_move.clone())
            .unwrap_or_else(|| played.san.clone());

        tracing::debug!(ply, uci = %played.uci, ?class, "Reviewed ply");
        plies.push(ReviewedPly {
            ply,
            fen_before: position.to_fen(),
            record,
            best_move: before.best_move.clone(),
            best_san,
            explanation: explain(class, &named),
            severity: class.severity(),
        });

        before = after;
    }

    let records: Vec<MoveRecord> = plies.iter().map(|p| p.record.clone()).collect();
    let estimate = estimate_game(&records);
    tracing::info!(
        white = estimate.white.rating,
        black = estimate.black.rating,
        "Review complete"
    );

    Ok(GameReview {
        plies,
        white: estimate.white,
        black: estimate.black,
    })
}
