//! Graded hints projected from the engine's current lines.
//!
//! Level 1 marks destination squares, level 2 draws candidate arrows, and
//! level 3 names the best move. Lower levels never identify which
//! candidate is best.

use chess::{format_square, parse_uci_move, Position};
use engine::EngineLine;
use serde::Serialize;
use smallvec::SmallVec;

pub const MAX_HINT_LEVEL: u8 = 3;

/// Lines considered for levels 1 and 2.
const CANDIDATES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    Squares,
    Arrows,
    BestMove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arrow {
    pub from: String,
    pub to: String,
    /// Drawn distinctly from the other arrows.
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hint {
    pub level: u8,
    pub kind: HintKind,
    pub squares: SmallVec<[String; CANDIDATES]>,
    pub arrows: SmallVec<[Arrow; CANDIDATES]>,
    pub text: String,
}

/// `(from, to)` square names of a UCI move; malformed moves yield `None`.
fn move_squares(uci: &str) -> Option<(String, String)> {
    let mv = parse_uci_move(uci).ok()?;
    Some((format_square(mv.from), format_square(mv.to)))
}

/// `(rank, from, to)` for the top-ranked lines. Ranks the engine has not
/// reported are missing from `lines`, so rank is kept rather than position.
fn candidate_moves(lines: &[EngineLine]) -> impl Iterator<Item = (usize, String, String)> + '_ {
    lines
        .iter()
        .filter(|line| line.rank < CANDIDATES)
        .filter_map(|line| {
            let (from, to) = line.first_move().and_then(move_squares)?;
            Some((line.rank, from, to))
        })
}

/// Project a hint at `level` (0 is treated as 1, anything above 3 as 3).
/// Returns `None` when there are no lines to hint from, or at level 3 when
/// the rank-0 line has not been reported yet.
pub fn project_hint(lines: &[EngineLine], position: &Position, level: u8) -> Option<Hint> {
    if lines.is_empty() {
        return None;
    }

    match level.clamp(1, MAX_HINT_LEVEL) {
        1 => {
            let mut squares = SmallVec::new();
            for (_, _, to) in candidate_moves(lines) {
                if !squares.contains(&to) {
                    squares.push(to);
                }
            }
            Some(Hint {
                level: 1,
                kind: HintKind::Squares,
                squares,
                arrows: SmallVec::new(),
                text: "Pay attention to these squares.".to_string(),
            })
        }
        2 => {
            let arrows = candidate_moves(lines)
                .map(|(rank, from, to)| Arrow {
                    from,
                    to,
                    primary: rank == 0,
                })
                .collect();
            Some(Hint {
                level: 2,
                kind: HintKind::Arrows,
                squares: SmallVec::new(),
                arrows,
                text: "These are the candidate moves.".to_string(),
            })
        }
        _ => {
            let best = lines.iter().find(|line| line.rank == 0)?;
            let uci = best.first_move()?;
            let (from, to) = move_squares(uci)?;
            let san = position
                .san_of_uci(uci)
                .unwrap_or_else(|| uci.to_string());
            Some(Hint {
                level: MAX_HINT_LEVEL,
                kind: HintKind::BestMove,
                squares: SmallVec::new(),
                arrows: smallvec::smallvec![Arrow {
                    from,
                    to,
                    primary: true,
                }],
                text: format!("Best move: {} (eval: {})", san, format_eval(best.evaluation)),
            })
        }
    }
}

/// One decimal, with an explicit sign for positive values.
pub fn format_eval(evaluation: f64) -> String {
    if evaluation > 0.0 {
        format!("+{:.1}", evaluation)
    } else {
        format!("{:.1}", evaluation)
    }
}

/// Hint level for a single position. The level only rises until
/// [`HintLadder::reset`] is called for a new position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HintLadder {
    level: u8,
}

impl HintLadder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Next hint. The level advances only when a hint can be produced.
    pub fn request(&mut self, lines: &[EngineLine], position: &Position) -> Option<Hint> {
        let next = (self.level + 1).min(MAX_HINT_LEVEL);
        let hint = project_hint(lines, position, next)?;
        self.level = next;
        Some(hint)
    }

    pub fn reset(&mut self) {
        self.level = 0;
    }
}

/// Captures available to the side that just moved, as arrows.
pub fn threat_arrows(position: &Position) -> Vec<Arrow> {
    position
        .capture_threats(!position.side_to_move())
        .into_iter()
        .map(|(from, to)| Arrow {
            from: format_square(from),
            to: format_square(to),
            primary: false,
        })
        .collect()
}
