//! One-shot engine queries used by the CLI.

use analysis::{project_hint, Hint};
use chess::Position;
use engine::{EngineSession, EngineStatus, Snapshot};
use tokio_stream::StreamExt;

/// Search `position` to `depth` and return the finished snapshot.
///
/// `None` when the request was superseded or the engine is unavailable.
pub async fn settled_search(
    session: &EngineSession,
    position: &Position,
    depth: u32,
) -> Option<Snapshot> {
    let mut rx = session.subscribe();
    session.best_move(position.to_fen(), depth).await?;

    // The reply is sent in the same actor step that publishes the finished
    // snapshot, so the next idle snapshot belongs to this search.
    let snapshot = rx.wait_for(|s| !s.searching).await.ok()?;
    Some(snapshot.clone())
}

/// Hint at `level` for `position`, from a fresh search.
pub async fn hint(
    session: &EngineSession,
    position: &Position,
    level: u8,
    depth: u32,
) -> Option<Hint> {
    let snapshot = settled_search(session, position, depth).await?;
    project_hint(&snapshot.lines, position, level)
}

/// Run an analysis, handing every snapshot of this request to
/// `on_snapshot` until it settles. Returns the final snapshot.
///
/// `None` when the analysis was superseded or stopped before it finished,
/// or the engine is unavailable. A position with no legal move finishes
/// normally with no best move.
pub async fn stream_analysis(
    session: &EngineSession,
    position: &Position,
    depth: u32,
    mut on_snapshot: impl FnMut(&Snapshot),
) -> Option<Snapshot> {
    let mut stream = session.snapshot_stream();
    let token = session.analyze(position.to_fen(), depth);

    while let Some(snapshot) = stream.next().await {
        if snapshot.status == EngineStatus::Unavailable {
            return None;
        }
        let finished = snapshot.finished_token == Some(token);
        if finished || snapshot.token == Some(token) {
            on_snapshot(&snapshot);
        }
        if snapshot.settled_token >= token {
            return finished.then_some(snapshot);
        }
    }
    None
}
