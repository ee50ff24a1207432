//! Engine session: a single UCI engine shared by interactive analysis and
//! fire-and-forget best-move queries.
//!
//! Every new request supersedes the one before it. A superseded
//! [`EngineSession::best_move`] future resolves to `None`; it never observes
//! output belonging to another request.
//!
//! Requests carry a correlation token. Snapshots report which token produced
//! the current result and how far requests have settled, so a caller can
//! tell its own result apart from an earlier one.

mod actor;
mod commands;
mod snapshot;
mod state;

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::wrappers::WatchStream;

use crate::process::{spawn_engine, EngineConfig};
use crate::uci::UciCommand;
use crate::EngineHandle;

use actor::run_session_actor;
use commands::SessionCommand;
pub use snapshot::{BestMove, EngineLine, EngineStatus, Snapshot};
pub use state::MIN_INFO_DEPTH;

/// Cheap, cloneable handle to an engine session actor.
#[derive(Clone)]
pub struct EngineSession {
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    snapshot_rx: watch::Receiver<Snapshot>,
    last_token: Arc<Mutex<u64>>,
}

impl EngineSession {
    /// Start a session over an already connected engine channel.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(engine: EngineHandle) -> Self {
        Self::with_options(engine, Vec::new())
    }

    /// Like [`EngineSession::new`], sending `options` during the handshake.
    pub fn with_options(engine: EngineHandle, options: Vec<UciCommand>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());

        tokio::spawn(run_session_actor(engine, options, cmd_rx, snapshot_tx));

        Self {
            cmd_tx,
            snapshot_rx,
            last_token: Arc::default(),
        }
    }

    /// Spawn the configured engine binary. If it cannot be started the
    /// session comes up [`EngineStatus::Unavailable`] instead of failing.
    pub fn launch(config: &EngineConfig) -> Self {
        match spawn_engine(config) {
            Ok(engine) => Self::with_options(engine, config.startup_options()),
            Err(e) => {
                tracing::error!("Engine unavailable: {}", e);
                Self::unavailable()
            }
        }
    }

    /// A session with no engine behind it. Every query resolves to `None`.
    pub fn unavailable() -> Self {
        // The receiver is dropped at once, so sends fail and map to `None`.
        let (cmd_tx, _) = mpsc::unbounded_channel();
        let (_, snapshot_rx) = watch::channel(Snapshot::unavailable());
        Self {
            cmd_tx,
            snapshot_rx,
            last_token: Arc::default(),
        }
    }

    /// Set playing strength (clamped to 0..=20) and the number of
    /// variations reported (at least 1).
    pub fn configure(&self, strength: u8, variations: u32) {
        self.send(SessionCommand::Configure {
            strength,
            variations,
        });
    }

    /// Start an infinite-until-depth analysis of `fen`, superseding any
    /// outstanding request. Progress is visible through [`Self::subscribe`].
    ///
    /// Returns the request's token. The analysis is over once a snapshot's
    /// `settled_token` reaches it; it ran to completion if `finished_token`
    /// equals it.
    pub fn analyze(&self, fen: impl Into<String>, depth: u32) -> u64 {
        let fen = fen.into();
        self.send_request(|token| SessionCommand::Analyze { token, fen, depth })
    }

    /// Ask for the best move in `fen`.
    ///
    /// The request is enqueued before this returns, so two calls made in
    /// sequence are ordered even if neither future has been polled yet.
    /// Resolves to `None` when superseded, stopped, reset, or when the
    /// engine is unavailable.
    pub fn best_move(
        &self,
        fen: impl Into<String>,
        depth: u32,
    ) -> impl Future<Output = Option<BestMove>> + Send + 'static {
        let (reply, rx) = oneshot::channel();
        let fen = fen.into();
        self.send_request(|token| SessionCommand::BestMove {
            token,
            fen,
            depth,
            reply,
        });
        async move { rx.await.ok().flatten() }
    }

    /// Stop the current request, if any.
    pub fn stop(&self) {
        self.send(SessionCommand::Stop);
    }

    /// Stop, forget all analysis, and tell the engine a new game begins.
    pub fn reset(&self) {
        self.send(SessionCommand::Reset);
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn status(&self) -> EngineStatus {
        self.snapshot_rx.borrow().status
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// Stream of snapshots, starting with the current one.
    pub fn snapshot_stream(&self) -> WatchStream<Snapshot> {
        WatchStream::new(self.snapshot_rx.clone())
    }

    /// Allocate a token and send under one lock, so tokens reach the actor
    /// in increasing order even from cloned handles on other threads.
    fn send_request(&self, build: impl FnOnce(u64) -> SessionCommand) -> u64 {
        let mut last = self
            .last_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *last += 1;
        let token = *last;
        self.send(build(token));
        token
    }

    fn send(&self, cmd: SessionCommand) {
        if let Err(mpsc::error::SendError(cmd)) = self.cmd_tx.send(cmd) {
            tracing::debug!("Engine session gone, dropping {:?}", cmd);
        }
    }
}
