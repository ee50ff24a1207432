//! Session state machine. Pure with respect to I/O: every transition returns
//! the commands to write, and the actor does the writing.
//!
//! Fencing: probes (`isready`) are numbered as they are sent and
//! acknowledgements (`readyok`) are counted as they arrive. The channel is
//! ordered, so acknowledgement N answers probe N. A request waits in `queued`
//! until the acknowledgement for its own probe arrives; by then any output of
//! the search stopped before it has drained through the channel. Only then
//! is it sent to the engine and moved to `active`.
//!
//! Tokens are allocated by the handle and arrive in increasing order, so
//! `settled_token` is a watermark: every request at or below it has either
//! finished or been cancelled.

use crate::uci::{parse_uci_message, EngineInfo, UciCommand, UciMessage};

use super::commands::{BestMoveReply, SessionCommand};
use super::snapshot::{BestMove, EngineLine, EngineStatus, Snapshot};

/// Progress lines shallower than this are noise and are dropped.
pub const MIN_INFO_DEPTH: u32 = 4;

pub(crate) const MAX_STRENGTH: u8 = 20;

#[derive(Debug)]
struct QueuedSearch {
    token: u64,
    fen: String,
    depth: u32,
    /// Probe number whose acknowledgement releases this request.
    fence: u64,
    reply: Option<BestMoveReply>,
}

#[derive(Debug)]
struct ActiveSearch {
    token: u64,
    reply: Option<BestMoveReply>,
}

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    status: EngineStatus,
    lines: Vec<Option<EngineLine>>,
    evaluation: Option<f64>,
    best_move: Option<String>,
    finished_token: Option<u64>,
    settled_token: u64,
    probes_sent: u64,
    probes_acked: u64,
    queued: Option<QueuedSearch>,
    active: Option<ActiveSearch>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_alive(&self) -> bool {
        self.status != EngineStatus::Unavailable
    }

    /// Handshake: `uci`, any startup options, then a counted probe.
    pub fn startup(&mut self, options: Vec<UciCommand>) -> Vec<UciCommand> {
        let mut out = vec![UciCommand::Uci];
        out.extend(options);
        out.push(self.probe());
        out
    }

    pub fn handle_command(&mut self, cmd: SessionCommand) -> Vec<UciCommand> {
        if !self.is_alive() {
            if let SessionCommand::BestMove { reply, .. } = cmd {
                let _ = reply.send(None);
            }
            return Vec::new();
        }

        match cmd {
            SessionCommand::Configure {
                strength,
                variations,
            } => {
                let strength = strength.min(MAX_STRENGTH);
                let variations = variations.max(1);
                tracing::info!(strength, variations, "Configuring engine");
                vec![
                    UciCommand::set_option("Skill Level", strength),
                    UciCommand::set_option("MultiPV", variations),
                ]
            }
            SessionCommand::Analyze { token, fen, depth } => {
                self.queue_search(token, fen, depth, None)
            }
            SessionCommand::BestMove {
                token,
                fen,
                depth,
                reply,
            } => self.queue_search(token, fen, depth, Some(reply)),
            SessionCommand::Stop => self.cancel(),
            SessionCommand::Reset => {
                let mut out = self.cancel();
                self.clear_lines();
                self.forget_result();
                out.push(UciCommand::UciNewGame);
                out.push(self.probe());
                tracing::info!("Engine reset");
                out
            }
        }
    }

    pub fn handle_line(&mut self, line: &str) -> Vec<UciCommand> {
        tracing::trace!("UCI << {}", line);
        if !self.is_alive() {
            return Vec::new();
        }

        let msg = match parse_uci_message(line) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::trace!("Discarding engine line: {}", e);
                return Vec::new();
            }
        };

        match msg {
            UciMessage::UciOk => {
                self.mark_ready();
                Vec::new()
            }
            UciMessage::ReadyOk => {
                self.probes_acked += 1;
                self.mark_ready();
                self.release_fence()
            }
            UciMessage::Info(info) => {
                self.record_info(info);
                Vec::new()
            }
            UciMessage::BestMove { mv, .. } => {
                self.finish_search(mv);
                Vec::new()
            }
            UciMessage::Id { name, value } => {
                tracing::debug!("Engine id {} = {}", name, value);
                Vec::new()
            }
        }
    }

    /// The channel is gone: resolve everything and go terminal.
    pub fn fail(&mut self) {
        if !self.is_alive() {
            return;
        }
        tracing::error!("Engine unavailable");
        self.cancel();
        self.clear_lines();
        self.status = EngineStatus::Unavailable;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status,
            lines: self.lines.iter().flatten().cloned().collect(),
            evaluation: self.evaluation,
            best_move: self.best_move.clone(),
            finished_token: self.finished_token,
            settled_token: self.settled_token,
            searching: self.queued.is_some() || self.active.is_some(),
            token: self
                .queued
                .as_ref()
                .map(|q| q.token)
                .or(self.active.as_ref().map(|a| a.token)),
        }
    }

    fn probe(&mut self) -> UciCommand {
        self.probes_sent += 1;
        UciCommand::IsReady
    }

    fn mark_ready(&mut self) {
        if self.status == EngineStatus::Starting {
            tracing::info!("Engine ready");
            self.status = EngineStatus::Ready;
        }
    }

    fn clear_lines(&mut self) {
        self.lines.clear();
        self.evaluation = None;
    }

    fn forget_result(&mut self) {
        self.best_move = None;
        self.finished_token = None;
    }

    fn settle(&mut self, token: u64) {
        self.settled_token = self.settled_token.max(token);
    }

    /// Supersede whatever is outstanding and fence the new request.
    fn queue_search(
        &mut self,
        token: u64,
        fen: String,
        depth: u32,
        reply: Option<BestMoveReply>,
    ) -> Vec<UciCommand> {
        let mut out = self.cancel();
        self.clear_lines();
        self.forget_result();

        out.push(self.probe());
        tracing::debug!(token, depth, fence = self.probes_sent, "Queued search");

        self.queued = Some(QueuedSearch {
            token,
            fen,
            depth: depth.max(1),
            fence: self.probes_sent,
            reply,
        });
        out
    }

    /// Resolve every outstanding reply with `None`; stop a running search.
    fn cancel(&mut self) -> Vec<UciCommand> {
        let mut out = Vec::new();

        if let Some(queued) = self.queued.take() {
            tracing::debug!(token = queued.token, "Cancelled queued search");
            self.settle(queued.token);
            resolve(queued.reply, None);
        }

        if let Some(active) = self.active.take() {
            tracing::debug!(token = active.token, "Stopping active search");
            self.settle(active.token);
            resolve(active.reply, None);
            out.push(UciCommand::Stop);
        }

        out
    }

    fn release_fence(&mut self) -> Vec<UciCommand> {
        let released = self
            .queued
            .as_ref()
            .is_some_and(|q| q.fence <= self.probes_acked);
        if !released {
            return Vec::new();
        }
        let Some(queued) = self.queued.take() else {
            return Vec::new();
        };

        tracing::info!(token = queued.token, depth = queued.depth, "Fence passed, starting search");
        self.clear_lines();
        self.active = Some(ActiveSearch {
            token: queued.token,
            reply: queued.reply,
        });
        vec![
            UciCommand::Position { fen: queued.fen },
            UciCommand::GoDepth(queued.depth),
        ]
    }

    fn record_info(&mut self, info: EngineInfo) {
        if self.active.is_none() {
            return;
        }
        let (Some(depth), Some(score)) = (info.depth, info.score) else {
            return;
        };
        if depth < MIN_INFO_DEPTH {
            return;
        }

        let rank = info.multipv.unwrap_or(1).saturating_sub(1) as usize;
        let evaluation = score.to_pawns();

        if self.lines.len() <= rank {
            self.lines.resize(rank + 1, None);
        }
        self.lines[rank] = Some(EngineLine {
            rank,
            evaluation,
            moves: info.pv,
            depth,
        });

        if rank == 0 {
            self.evaluation = Some(evaluation);
        }
    }

    fn finish_search(&mut self, mv: Option<String>) {
        let Some(active) = self.active.take() else {
            tracing::debug!("Discarding bestmove of a stopped search");
            return;
        };

        tracing::info!(token = active.token, mv = ?mv, "Search finished");
        self.best_move = mv.clone();
        self.finished_token = Some(active.token);
        self.settle(active.token);
        resolve(
            active.reply,
            Some(BestMove {
                mv,
                evaluation: self.evaluation,
            }),
        );
    }
}

fn resolve(reply: Option<BestMoveReply>, result: Option<BestMove>) {
    if let Some(reply) = reply {
        // The caller may have stopped waiting; that is fine.
        let _ = reply.send(result);
    }
}
