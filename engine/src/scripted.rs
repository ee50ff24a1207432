//! An in-process engine that answers the UCI subset the session speaks,
//! playing back scripted results. Lets the session and everything above it
//! run without an engine binary.
//!
//! Ordering follows a real engine: output for a stopped search is written
//! before the engine reads the next command, so it always precedes the
//! acknowledgement of a later `isready`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::EngineHandle;

/// Scripted answer for one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedResult {
    /// `None` plays the `(none)` sentinel.
    pub mv: Option<String>,
    pub centipawns: i32,
}

impl ScriptedResult {
    pub fn new(mv: &str, centipawns: i32) -> Self {
        Self {
            mv: Some(mv.to_string()),
            centipawns,
        }
    }

    pub fn no_move() -> Self {
        Self {
            mv: None,
            centipawns: 0,
        }
    }
}

/// Positions keyed by FEN. Unknown positions answer with `fallback`.
#[derive(Debug, Clone)]
pub struct Script {
    results: HashMap<String, ScriptedResult>,
    fallback: ScriptedResult,
    seed: u64,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            results: HashMap::new(),
            fallback: ScriptedResult::no_move(),
            seed: 0,
        }
    }
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, fen: &str, result: ScriptedResult) -> Self {
        self.results.insert(fen.to_string(), result);
        self
    }

    pub fn fallback(mut self, result: ScriptedResult) -> Self {
        self.fallback = result;
        self
    }

    /// Seed for the scheduling jitter between output lines.
    pub fn jitter(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn lookup(&self, fen: &str) -> &ScriptedResult {
        self.results.get(fen).unwrap_or(&self.fallback)
    }
}

/// What the scripted engine observed.
#[derive(Debug, Default)]
pub struct ScriptedLog {
    received: Mutex<Vec<String>>,
    overlapping_go: AtomicUsize,
}

impl ScriptedLog {
    /// Every line received, in order.
    pub fn received(&self) -> Vec<String> {
        self.received
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// `go` commands that arrived while another search was still running.
    pub fn overlapping_go(&self) -> usize {
        self.overlapping_go.load(Ordering::SeqCst)
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.received()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    fn record(&self, line: &str) {
        if let Ok(mut lines) = self.received.lock() {
            lines.push(line.to_string());
        }
    }
}

struct Search {
    result: ScriptedResult,
    depth: u32,
    target: u32,
}

/// Start a scripted engine task and return the channel to it.
///
/// Must be called inside a tokio runtime.
pub fn spawn_scripted(script: Script) -> (EngineHandle, Arc<ScriptedLog>) {
    let (to_engine_tx, to_engine_rx) = mpsc::unbounded_channel();
    let (from_engine_tx, from_engine_rx) = mpsc::unbounded_channel();
    let log = Arc::new(ScriptedLog::default());

    tokio::spawn(run_scripted(script, to_engine_rx, from_engine_tx, log.clone()));

    (
        EngineHandle {
            tx: to_engine_tx,
            rx: from_engine_rx,
        },
        log,
    )
}

/// A channel whose engine has already exited.
pub fn dead_engine() -> EngineHandle {
    let (tx, _) = mpsc::unbounded_channel();
    let (_, rx) = mpsc::unbounded_channel();
    EngineHandle { tx, rx }
}

async fn run_scripted(
    script: Script,
    mut input: mpsc::UnboundedReceiver<String>,
    output: mpsc::UnboundedSender<String>,
    log: Arc<ScriptedLog>,
) {
    let mut rng = script.seed;
    let mut fen = String::new();
    let mut search: Option<Search> = None;

    let emit = |line: String| output.send(line).is_ok();

    loop {
        // Drain commands before producing output when any are waiting.
        let cmd = if search.is_some() {
            match input.try_recv() {
                Ok(cmd) => Some(cmd),
                Err(mpsc::error::TryRecvError::Empty) => None,
                Err(mpsc::error::TryRecvError::Disconnected) => return,
            }
        } else {
            match input.recv().await {
                Some(cmd) => Some(cmd),
                None => return,
            }
        };

        if let Some(cmd) = cmd {
            log.record(&cmd);
            let mut tokens = cmd.split_whitespace();
            let ok = match tokens.next() {
                Some("uci") => {
                    emit("id name Scripted".to_string()) && emit("uciok".to_string())
                }
                Some("isready") => emit("readyok".to_string()),
                Some("position") => {
                    fen = tokens.skip(1).collect::<Vec<_>>().join(" ");
                    true
                }
                Some("go") => {
                    if search.is_some() {
                        log.overlapping_go.fetch_add(1, Ordering::SeqCst);
                    }
                    let target = match (tokens.next(), tokens.next()) {
                        (Some("depth"), Some(d)) => d.parse().unwrap_or(1),
                        _ => 1,
                    };
                    search = Some(Search {
                        result: script.lookup(&fen).clone(),
                        depth: 0,
                        target,
                    });
                    true
                }
                Some("stop") => match search.take() {
                    Some(s) => {
                        // One trailing progress line, then the terminal line.
                        emit(info_line(&s.result, s.depth.max(crate::MIN_INFO_DEPTH)))
                            && emit(bestmove_line(&s.result))
                    }
                    None => true,
                },
                Some("quit") => return,
                _ => true,
            };
            if !ok {
                return;
            }
            continue;
        }

        if let Some(s) = search.as_mut() {
            s.depth += 1;
            let ok = if s.depth >= s.target {
                let done = emit(info_line(&s.result, s.depth)) && emit(bestmove_line(&s.result));
                search = None;
                done
            } else {
                emit(info_line(&s.result, s.depth))
            };
            if !ok {
                return;
            }
        }

        rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        for _ in 0..(rng >> 62) + 1 {
            tokio::task::yield_now().await;
        }
    }
}

fn info_line(result: &ScriptedResult, depth: u32) -> String {
    match &result.mv {
        Some(mv) => format!(
            "info depth {} multipv 1 score cp {} nodes {} pv {}",
            depth,
            result.centipawns,
            depth * 1000,
            mv
        ),
        None => format!("info depth {} score mate 0", depth),
    }
}

fn bestmove_line(result: &ScriptedResult) -> String {
    match &result.mv {
        Some(mv) => format!("bestmove {}", mv),
        None => "bestmove (none)".to_string(),
    }
}
