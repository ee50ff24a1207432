//! Move quality, rating estimates and hints built on engine output.

pub mod accuracy;
pub mod book;
pub mod classification;
pub mod hints;
pub mod record;

pub use accuracy::{
    average_loss, estimate, estimate_game, quality_score, EloEstimate, GameEstimate, RatingBand,
};
pub use book::{LineBook, NoBook, OpeningBook, OpeningLine};
pub use classification::{
    classify, explain, material_value, Classification, Classifier, MoveMeta, Severity, Thresholds,
};
pub use hints::{project_hint, threat_arrows, Arrow, Hint, HintKind, HintLadder, MAX_HINT_LEVEL};
pub use record::MoveRecord;
