use tokio::sync::oneshot;

use super::snapshot::BestMove;

pub(crate) type BestMoveReply = oneshot::Sender<Option<BestMove>>;

/// Requests handled by the session actor.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    Configure {
        strength: u8,
        variations: u32,
    },
    Analyze {
        token: u64,
        fen: String,
        depth: u32,
    },
    BestMove {
        token: u64,
        fen: String,
        depth: u32,
        reply: BestMoveReply,
    },
    Stop,
    Reset,
}
