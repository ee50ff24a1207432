//! Rating and accuracy estimates from a side's move records.

use chess::PieceColor;
use serde::Serialize;

use crate::record::MoveRecord;

/// Quality score reported before anything has been classified.
pub const DEFAULT_QUALITY: f64 = 50.0;

pub const MIN_RATING: f64 = 200.0;
pub const MAX_RATING: f64 = 3200.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EloEstimate {
    pub rating: u32,
    /// Percentage, 0-100.
    pub accuracy: u32,
    /// Average centipawn loss, rounded.
    pub average_loss: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GameEstimate {
    pub white: EloEstimate,
    pub black: EloEstimate,
}

/// Average centipawn loss over records carrying both evaluations.
/// Gains count as zero so they cannot offset later losses.
pub fn average_loss(records: &[MoveRecord]) -> f64 {
    let losses: Vec<f64> = records
        .iter()
        .filter_map(MoveRecord::loss)
        .map(|loss| (loss * 100.0).max(0.0))
        .collect();

    if losses.is_empty() {
        return 0.0;
    }
    losses.iter().sum::<f64>() / losses.len() as f64
}

/// Mean quality weight of the classified records.
pub fn quality_score(records: &[MoveRecord]) -> f64 {
    let weights: Vec<f64> = records
        .iter()
        .filter_map(|r| r.classification())
        .map(|c| c.quality_weight())
        .collect();

    if weights.is_empty() {
        return DEFAULT_QUALITY;
    }
    weights.iter().sum::<f64>() / weights.len() as f64
}

pub fn estimate(records: &[MoveRecord]) -> EloEstimate {
    let acpl = average_loss(records);
    let quality = quality_score(records);

    let from_loss = 3100.0 * (-0.01 * acpl).exp();
    let from_quality = ((quality - 30.0) * 40.0).clamp(MIN_RATING, MAX_RATING);
    let blended = (0.55 * from_loss + 0.45 * from_quality).clamp(MIN_RATING, MAX_RATING);

    EloEstimate {
        rating: blended.round() as u32,
        accuracy: quality.clamp(0.0, 100.0).round() as u32,
        average_loss: acpl.round() as u32,
    }
}

/// Estimate both sides of one game.
pub fn estimate_game(records: &[MoveRecord]) -> GameEstimate {
    let (white, black): (Vec<MoveRecord>, Vec<MoveRecord>) = records
        .iter()
        .cloned()
        .partition(|r| r.mover == PieceColor::White);

    GameEstimate {
        white: estimate(&white),
        black: estimate(&black),
    }
}

/// Display band for a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingBand {
    Expert,
    Advanced,
    Intermediate,
    Beginner,
    Novice,
}

impl RatingBand {
    pub fn of(rating: u32) -> Self {
        match rating {
            2200.. => Self::Expert,
            1800.. => Self::Advanced,
            1400.. => Self::Intermediate,
            1000.. => Self::Beginner,
            _ => Self::Novice,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Expert => "Expert",
            Self::Advanced => "Advanced",
            Self::Intermediate => "Intermediate",
            Self::Beginner => "Beginner",
            Self::Novice => "Novice",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Expert => "#22c55e",
            Self::Advanced => "#4ade80",
            Self::Intermediate => "#eab308",
            Self::Beginner => "#f97316",
            Self::Novice => "#ef4444",
        }
    }
}

impl EloEstimate {
    pub fn band(&self) -> RatingBand {
        RatingBand::of(self.rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::Classification;

    fn record(mover: PieceColor, before: f64, after: f64, class: Classification) -> MoveRecord {
        let mut r = MoveRecord::new("e2e4", "e4", mover, "fen").with_evals(before, after);
        r.set_classification(class);
        r
    }

    #[test]
    fn test_empty_sequence() {
        assert_eq!(average_loss(&[]), 0.0);
        assert_eq!(quality_score(&[]), DEFAULT_QUALITY);
        let est = estimate(&[]);
        // 0.55 * 3100 + 0.45 * 800
        assert_eq!(est.rating, 2065);
        assert_eq!(est.accuracy, 50);
    }

    #[test]
    fn test_gains_do_not_offset_losses() {
        let records = vec![
            record(PieceColor::White, 0.0, -1.0, Classification::Great),
            record(PieceColor::White, 0.0, 0.5, Classification::Okay),
        ];
        assert!((average_loss(&records) - 25.0).abs() < 1e-9);
        assert_eq!(estimate(&records).average_loss, 25);
    }

    #[test]
    fn test_estimate_rounds_average_loss() {
        let records = vec![
            record(PieceColor::White, 0.0, 0.5, Classification::Okay),
            record(PieceColor::White, 0.0, 0.5, Classification::Okay),
            record(PieceColor::White, 0.1, -0.1, Classification::Best),
        ];
        assert!((average_loss(&records) - 100.0 / 3.0).abs() < 1e-9);
        let est = estimate(&records);
        assert_eq!(est.average_loss, 33);
        // The rating uses the unrounded average.
        let from_loss = 3100.0 * (-0.01 * (100.0_f64 / 3.0)).exp();
        let quality = quality_score(&records);
        let from_quality = ((quality - 30.0) * 40.0).clamp(MIN_RATING, MAX_RATING);
        assert_eq!(
            est.rating,
            (0.55 * from_loss + 0.45 * from_quality)
                .clamp(MIN_RATING, MAX_RATING)
                .round() as u32
        );
    }

    #[test]
    fn test_records_without_evals_are_skipped_by_average_loss() {
        let mut records = vec![record(PieceColor::White, 0.0, 1.0, Classification::Mistake)];
        records.push(MoveRecord::new("e7e5", "e5", PieceColor::White, "fen"));
        assert!((average_loss(&records) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_best_is_near_the_top() {
        let records: Vec<_> = (0..20)
            .map(|_| record(PieceColor::White, 0.2, -0.2, Classification::Best))
            .collect();
        let est = estimate(&records);
        assert_eq!(est.accuracy, 100);
        // 0.55 * 3100 + 0.45 * 2800
        assert_eq!(est.rating, 2965);
        assert_eq!(est.band(), RatingBand::Expert);
    }

    #[test]
    fn test_all_blunders_hit_the_floor() {
        let records: Vec<_> = (0..20)
            .map(|_| record(PieceColor::Black, 0.0, 5.0, Classification::Blunder))
            .collect();
        let est = estimate(&records);
        assert_eq!(est.accuracy, 0);
        assert_eq!(est.rating, 200);
        assert_eq!(est.band(), RatingBand::Novice);
    }

    #[test]
    fn test_estimate_game_splits_by_mover() {
        let records = vec![
            record(PieceColor::White, 0.2, -0.2, Classification::Best),
            record(PieceColor::Black, 0.0, 5.0, Classification::Blunder),
            record(PieceColor::White, 0.1, -0.1, Classification::Best),
        ];
        let game = estimate_game(&records);
        assert_eq!(game.white.accuracy, 100);
        assert_eq!(game.black.accuracy, 0);
        assert!(game.white.rating > game.black.rating);
    }

    #[test]
    fn test_rating_bands() {
        assert_eq!(RatingBand::of(2200), RatingBand::Expert);
        assert_eq!(RatingBand::of(2199), RatingBand::Advanced);
        assert_eq!(RatingBand::of(1400), RatingBand::Intermediate);
        assert_eq!(RatingBand::of(1000), RatingBand::Beginner);
        assert_eq!(RatingBand::of(999).label(), "Novice");
    }
}
