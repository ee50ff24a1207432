//! Chess coaching on top of a UCI engine: game review, hints and one-off
//! queries.

pub mod config;
pub mod query;
pub mod review;

pub use config::CoachConfig;
pub use review::{review_game, review_game_with, GameReview, ReviewError, ReviewedPly};
