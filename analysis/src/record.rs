use chess::PieceColor;
use serde::{Deserialize, Serialize};

use crate::classification::Classification;

/// One played move with the evaluations around it.
///
/// `eval_before` is from the mover's point of view and `eval_after` from
/// the opponent's, both in pawns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub uci: String,
    pub san: String,
    pub mover: PieceColor,
    pub fen_after: String,
    pub eval_before: Option<f64>,
    pub eval_after: Option<f64>,
    classification: Option<Classification>,
}

impl MoveRecord {
    pub fn new(
        uci: impl Into<String>,
        san: impl Into<String>,
        mover: PieceColor,
        fen_after: impl Into<String>,
    ) -> Self {
        Self {
            uci: uci.into(),
            san: san.into(),
            mover,
            fen_after: fen_after.into(),
            eval_before: None,
            eval_after: None,
            classification: None,
        }
    }

    pub fn with_evals(mut self, eval_before: f64, eval_after: f64) -> Self {
        self.eval_before = Some(eval_before);
        self.eval_after = Some(eval_after);
        self
    }

    pub fn classification(&self) -> Option<Classification> {
        self.classification
    }

    /// Attach a classification. Write-once: a different value after the first
    /// is rejected and `false` returned; repeating the same value is fine.
    pub fn set_classification(&mut self, classification: Classification) -> bool {
        match self.classification {
            None => {
                self.classification = Some(classification);
                true
            }
            Some(existing) => existing == classification,
        }
    }

    /// `eval_before + eval_after`, when both are known.
    pub fn loss(&self) -> Option<f64> {
        Some(self.eval_before? + self.eval_after?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::classify;

    #[test]
    fn test_classification_is_write_once() {
        let mut record = MoveRecord::new("e2e4", "e4", PieceColor::White, "fen").with_evals(0.3, -0.3);
        let class = classify(0.3, -0.3, None);

        assert!(record.set_classification(class));
        assert!(record.set_classification(classify(0.3, -0.3, None)));
        assert_eq!(record.classification(), Some(Classification::Good));

        assert!(!record.set_classification(Classification::Blunder));
        assert_eq!(record.classification(), Some(Classification::Good));
    }

    #[test]
    fn test_loss_needs_both_evals() {
        let record = MoveRecord::new("e2e4", "e4", PieceColor::White, "fen");
        assert_eq!(record.loss(), None);
        assert_eq!(record.with_evals(0.5, 0.25).loss(), Some(0.75));
    }
}
