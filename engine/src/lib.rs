pub mod process;
pub mod scripted;
pub mod session;
pub mod uci;

pub use process::{find_engine_path, spawn_engine, EngineConfig, EngineError};
pub use session::{BestMove, EngineLine, EngineSession, EngineStatus, Snapshot, MIN_INFO_DEPTH};
pub use uci::{UciCommand, UciError, UciMessage};

use tokio::sync::mpsc;

/// Line channel to an analysis engine.
///
/// `tx` carries outbound command lines, `rx` the engine's output lines,
/// both without trailing newlines. Order is preserved in each direction.
pub struct EngineHandle {
    pub tx: mpsc::UnboundedSender<String>,
    pub rx: mpsc::UnboundedReceiver<String>,
}
