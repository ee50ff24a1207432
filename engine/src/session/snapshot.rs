use serde::Serialize;

/// Lifecycle of the engine channel as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    #[default]
    Starting,
    Ready,
    /// The channel never came up or has died; terminal.
    Unavailable,
}

/// One principal variation at the depth it was last reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineLine {
    /// 0 = best.
    pub rank: usize,
    /// Pawns, from the side to move in the analysed position.
    pub evaluation: f64,
    /// Engine notation, first move first.
    pub moves: Vec<String>,
    pub depth: u32,
}

impl EngineLine {
    pub fn first_move(&self) -> Option<&str> {
        self.moves.first().map(String::as_str)
    }
}

/// Result of [`EngineSession::best_move`](super::EngineSession::best_move).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestMove {
    /// `None` when the engine reported no legal move.
    #[serde(rename = "move")]
    pub mv: Option<String>,
    /// Rank-0 evaluation of the search, if one was reported in time.
    pub evaluation: Option<f64>,
}

/// Point-in-time view of the session, published after every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub status: EngineStatus,
    /// Tracked variations in rank order.
    pub lines: Vec<EngineLine>,
    /// Latest rank-0 evaluation.
    pub evaluation: Option<f64>,
    /// Chosen move of the last search that ran to completion.
    pub best_move: Option<String>,
    /// Token of the request that produced `best_move`.
    pub finished_token: Option<u64>,
    /// Every request with a token at or below this has finished or been
    /// cancelled.
    pub settled_token: u64,
    /// A request is queued or running.
    pub searching: bool,
    /// Correlation token of the current request.
    pub token: Option<u64>,
}

impl Snapshot {
    pub fn unavailable() -> Self {
        Self {
            status: EngineStatus::Unavailable,
            ..Self::default()
        }
    }

    pub fn best_line(&self) -> Option<&EngineLine> {
        self.lines.first().filter(|line| line.rank == 0)
    }
}
