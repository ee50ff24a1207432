use tokio::sync::{mpsc, watch};
use tracing::Instrument;

use crate::uci::UciCommand;
use crate::EngineHandle;

use super::commands::SessionCommand;
use super::snapshot::Snapshot;
use super::state::SessionState;

/// The session actor loop.
/// Owns the engine channel and all session state; processes caller commands
/// and engine output strictly in arrival order.
pub(crate) async fn run_session_actor(
    engine: EngineHandle,
    startup: Vec<UciCommand>,
    cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
    snapshot_tx: watch::Sender<Snapshot>,
) {
    run_session_actor_inner(engine, startup, cmd_rx, snapshot_tx)
        .instrument(tracing::info_span!("engine_session"))
        .await;
}

async fn run_session_actor_inner(
    engine: EngineHandle,
    startup: Vec<UciCommand>,
    mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
    snapshot_tx: watch::Sender<Snapshot>,
) {
    tracing::info!("Engine session started");

    let mut state = SessionState::new();
    let mut engine = Some(engine);

    let handshake = state.startup(startup);
    send_all(&mut state, &mut engine, handshake);
    publish(&state, &snapshot_tx);

    loop {
        tokio::select! {
            biased;

            line = next_line(&mut engine), if engine.is_some() => {
                match line {
                    Some(line) => {
                        let out = state.handle_line(&line);
                        send_all(&mut state, &mut engine, out);
                    }
                    None => {
                        tracing::warn!("Engine output closed");
                        fail(&mut state, &mut engine);
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    tracing::info!("All session handles dropped, shutting down");
                    break;
                };
                let out = state.handle_command(cmd);
                send_all(&mut state, &mut engine, out);
            }
        }

        publish(&state, &snapshot_tx);
    }

    // Dropping the channel makes the writer task send `quit`.
    drop(engine);
    tracing::info!("Engine session exited");
}

async fn next_line(engine: &mut Option<EngineHandle>) -> Option<String> {
    match engine {
        Some(engine) => engine.rx.recv().await,
        None => None,
    }
}

fn send_all(state: &mut SessionState, engine: &mut Option<EngineHandle>, cmds: Vec<UciCommand>) {
    for cmd in cmds {
        let Some(handle) = engine.as_ref() else {
            return;
        };
        let line = cmd.to_line();
        tracing::trace!("UCI >> {}", line);
        if handle.tx.send(line).is_err() {
            tracing::warn!("Engine input closed");
            fail(state, engine);
            return;
        }
    }
}

fn fail(state: &mut SessionState, engine: &mut Option<EngineHandle>) {
    state.fail();
    *engine = None;
}

fn publish(state: &SessionState, snapshot_tx: &watch::Sender<Snapshot>) {
    let snapshot = state.snapshot();
    snapshot_tx.send_if_modified(|current| {
        if *current == snapshot {
            false
        } else {
            *current = snapshot;
            true
        }
    });
}
