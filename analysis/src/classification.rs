//! Move quality classification.
//!
//! Evaluations are in pawns. `eval_before` is from the mover's perspective
//! and `eval_after` from the opponent's, so `loss = eval_before + eval_after`
//! is how much ground the mover ceded.

use chess::{PieceKind, PlayedMove, Position};
use serde::{Deserialize, Serialize};

/// Quality of a single move, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Brilliant,
    Great,
    Best,
    Good,
    Okay,
    Book,
    Inaccuracy,
    Miss,
    Mistake,
    Blunder,
}

/// How loudly a classification should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Minor,
    Major,
    Critical,
}

impl Classification {
    pub const ALL: [Self; 10] = [
        Self::Brilliant,
        Self::Great,
        Self::Best,
        Self::Good,
        Self::Okay,
        Self::Book,
        Self::Inaccuracy,
        Self::Miss,
        Self::Mistake,
        Self::Blunder,
    ];

    /// Annotation glyph; empty for unremarkable moves.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Brilliant => "!!",
            Self::Great => "!",
            Self::Best | Self::Good | Self::Okay | Self::Book => "",
            Self::Inaccuracy => "?!",
            Self::Miss | Self::Mistake => "?",
            Self::Blunder => "??",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Brilliant => "#26c6da",
            Self::Great => "#5dadec",
            Self::Best | Self::Good => "#96bc4b",
            Self::Okay => "#8b8b8b",
            Self::Book => "#a88865",
            Self::Inaccuracy => "#f7c631",
            Self::Miss | Self::Mistake => "#e67e22",
            Self::Blunder => "#e74c3c",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Brilliant => "Brilliant",
            Self::Great => "Great",
            Self::Best => "Best",
            Self::Good => "Good",
            Self::Okay => "Okay",
            Self::Book => "Book",
            Self::Inaccuracy => "Inaccuracy",
            Self::Miss => "Miss",
            Self::Mistake => "Mistake",
            Self::Blunder => "Blunder",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::Inaccuracy => Severity::Minor,
            Self::Miss | Self::Mistake => Severity::Major,
            Self::Blunder => Severity::Critical,
            _ => Severity::None,
        }
    }

    /// Weight on a 0-100 scale used by the quality score.
    pub fn quality_weight(self) -> f64 {
        match self {
            Self::Brilliant | Self::Best => 100.0,
            Self::Great => 95.0,
            Self::Book => 90.0,
            Self::Good => 80.0,
            Self::Okay => 55.0,
            Self::Inaccuracy => 25.0,
            Self::Miss => 15.0,
            Self::Mistake => 10.0,
            Self::Blunder => 0.0,
        }
    }

    /// Title of the take-back prompt, for moves that warrant one.
    pub fn alert_title(self) -> Option<&'static str> {
        match self {
            Self::Blunder => Some("Blunder!"),
            Self::Mistake => Some("Mistake!"),
            Self::Miss => Some("Missed Opportunity!"),
            _ => None,
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Relative material value; the king is excluded.
pub fn material_value(piece: PieceKind) -> i32 {
    match piece {
        PieceKind::Pawn => 1,
        PieceKind::Knight | PieceKind::Bishop => 3,
        PieceKind::Rook => 5,
        PieceKind::Queen => 9,
        PieceKind::King => 0,
    }
}

/// Board facts about one move, derived before classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveMeta {
    /// Value of the moved piece minus value of anything it captured.
    pub material_given: i32,
    /// The destination is attacked by the opponent after the move.
    pub lands_attacked: bool,
    /// The piece was already attacked on its origin square.
    pub origin_attacked: bool,
    /// The move is the engine's first choice in the position before it.
    pub matches_best: bool,
    pub is_book: bool,
}

impl MoveMeta {
    pub fn from_move(
        before: &Position,
        played: &PlayedMove,
        best_uci: Option<&str>,
        is_book: bool,
    ) -> Self {
        let captured = played.captured.map(material_value).unwrap_or(0);
        let opponent = !played.color;

        Self {
            material_given: material_value(played.piece) - captured,
            lands_attacked: played.after.is_square_attacked(played.to, opponent),
            origin_attacked: before.is_square_attacked(played.from, opponent),
            matches_best: best_uci == Some(played.uci.as_str()),
            is_book,
        }
    }
}

/// Tunable decision boundaries, in pawns unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Net material, in relative units, that counts as a sacrifice.
    pub sacrifice_material: i32,
    pub brilliant_ceiling: f64,
    pub near_best: f64,
    pub great: f64,
    pub good: f64,
    pub okay: f64,
    pub blunder: f64,
    pub miss_eval: f64,
    pub miss_loss: f64,
    pub mistake: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            sacrifice_material: 3,
            brilliant_ceiling: 0.15,
            near_best: 0.10,
            great: -0.3,
            good: 0.15,
            okay: 0.5,
            blunder: 2.0,
            miss_eval: 1.5,
            miss_loss: 0.5,
            mistake: 1.0,
        }
    }
}

struct Inputs<'a> {
    before: f64,
    loss: f64,
    meta: Option<&'a MoveMeta>,
}

type Guard = fn(&Thresholds, &Inputs<'_>) -> bool;

/// Ordered decision table; the first matching guard wins.
const DECISIONS: [(Guard, Classification); 8] = [
    (is_brilliant, Classification::Brilliant),
    (is_great, Classification::Great),
    (is_best, Classification::Best),
    (is_good, Classification::Good),
    (is_okay, Classification::Okay),
    (is_blunder, Classification::Blunder),
    (is_miss, Classification::Miss),
    (is_mistake, Classification::Mistake),
];

fn is_brilliant(t: &Thresholds, i: &Inputs<'_>) -> bool {
    let Some(meta) = i.meta else {
        return false;
    };
    let sacrifice =
        meta.material_given >= t.sacrifice_material && meta.lands_attacked && !meta.origin_attacked;
    sacrifice && i.loss <= t.brilliant_ceiling && (meta.matches_best || i.loss <= t.near_best)
}

fn is_great(t: &Thresholds, i: &Inputs<'_>) -> bool {
    i.loss <= t.great
}

fn is_best(_: &Thresholds, i: &Inputs<'_>) -> bool {
    i.meta.is_some_and(|m| m.matches_best)
}

fn is_good(t: &Thresholds, i: &Inputs<'_>) -> bool {
    i.loss <= t.good
}

fn is_okay(t: &Thresholds, i: &Inputs<'_>) -> bool {
    i.loss <= t.okay
}

fn is_blunder(t: &Thresholds, i: &Inputs<'_>) -> bool {
    i.loss >= t.blunder
}

fn is_miss(t: &Thresholds, i: &Inputs<'_>) -> bool {
    i.before >= t.miss_eval && i.loss >= t.miss_loss
}

fn is_mistake(t: &Thresholds, i: &Inputs<'_>) -> bool {
    i.loss >= t.mistake
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Classifier {
    pub thresholds: Thresholds,
}

impl Classifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(
        &self,
        eval_before: f64,
        eval_after: f64,
        meta: Option<&MoveMeta>,
    ) -> Classification {
        if meta.is_some_and(|m| m.is_book) {
            return Classification::Book;
        }

        let inputs = Inputs {
            before: eval_before,
            loss: eval_before + eval_after,
            meta,
        };

        let class = DECISIONS
            .iter()
            .find(|(guard, _)| guard(&self.thresholds, &inputs))
            .map(|&(_, class)| class)
            .unwrap_or(Classification::Inaccuracy);
        tracing::trace!(eval_before, eval_after, loss = inputs.loss, ?class, "Classified move");
        class
    }
}

/// Classify with the default thresholds.
pub fn classify(eval_before: f64, eval_after: f64, meta: Option<&MoveMeta>) -> Classification {
    Classifier::default().classify(eval_before, eval_after, meta)
}

/// One-line explanation of a classification, naming the better move where
/// there was one.
pub fn explain(classification: Classification, best_san: &str) -> String {
    match classification {
        Classification::Brilliant => "Brilliant sacrifice!".to_string(),
        Classification::Great => "Great move!".to_string(),
        Classification::Best => "Best move, the top engine choice.".to_string(),
        Classification::Good => "Good move.".to_string(),
        Classification::Okay => "Okay move, slightly imprecise.".to_string(),
        Classification::Book => "Book move, known theory.".to_string(),
        Classification::Miss => format!("Missed opportunity! {} was winning.", best_san),
        Classification::Blunder => format!("Blunder! {} was much stronger.", best_san),
        Classification::Mistake => format!("Mistake. Consider {} instead.", best_san),
        Classification::Inaccuracy => format!("Inaccuracy. {} was more precise.", best_san),
    }
}
