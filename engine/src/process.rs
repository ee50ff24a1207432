//! Engine process transport: spawns a UCI executable and bridges its
//! stdin/stdout to an [`EngineHandle`].

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::uci::UciCommand;
use crate::EngineHandle;

/// Common install locations probed when no explicit path is configured.
const SEARCH_PATHS: &[&str] = &[
    "/usr/local/bin/stockfish",
    "/usr/bin/stockfish",
    "/opt/homebrew/bin/stockfish",
    "/usr/games/stockfish",
];

const QUIT_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Engine executable not found: {0}")]
    NotFound(String),
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Engine has no stdin")]
    NoStdin,
    #[error("Engine has no stdout")]
    NoStdout,
}

/// Configuration for engine performance tuning.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Explicit executable; otherwise [`find_engine_path`] probes.
    pub path: Option<PathBuf>,
    pub skill_level: Option<u8>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
}

impl EngineConfig {
    /// Options sent once after the `uci` handshake.
    pub fn startup_options(&self) -> Vec<UciCommand> {
        let mut options = Vec::new();
        if let Some(threads) = self.threads {
            options.push(UciCommand::set_option("Threads", threads.clamp(1, 16)));
        }
        if let Some(hash_mb) = self.hash_mb {
            options.push(UciCommand::set_option("Hash", hash_mb.clamp(1, 2048)));
        }
        if let Some(level) = self.skill_level {
            options.push(UciCommand::set_option("Skill Level", level.min(20)));
        }
        options
    }
}

/// Locate the engine executable.
pub fn find_engine_path(configured: Option<&Path>) -> Result<PathBuf, EngineError> {
    if let Some(path) = configured {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(EngineError::NotFound(path.display().to_string()));
    }

    if let Some(path) = SEARCH_PATHS.iter().map(Path::new).find(|p| p.is_file()) {
        return Ok(path.to_path_buf());
    }

    std::env::var_os("PATH")
        .and_then(|paths| {
            std::env::split_paths(&paths)
                .map(|dir| dir.join("stockfish"))
                .find(|candidate| candidate.is_file())
        })
        .ok_or_else(|| EngineError::NotFound("stockfish".to_string()))
}

/// Spawn the engine and wire its pipes to a line channel.
///
/// Must be called from within a Tokio runtime. Dropping the returned
/// handle's `tx` sends `quit` and reaps the process.
#[tracing::instrument(level = "info", skip(config))]
pub fn spawn_engine(config: &EngineConfig) -> Result<EngineHandle, EngineError> {
    let path = find_engine_path(config.path.as_deref())?;
    tracing::info!("Found engine at: {:?}", path);

    let mut process = tokio::process::Command::new(&path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            tracing::error!("Failed to spawn engine: {}", e);
            EngineError::Spawn(e)
        })?;

    let mut stdin = process.stdin.take().ok_or(EngineError::NoStdin)?;
    let stdout = process.stdout.take().ok_or(EngineError::NoStdout)?;

    let (to_engine_tx, mut to_engine_rx) = mpsc::unbounded_channel::<String>();
    let (from_engine_tx, from_engine_rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    tracing::warn!("Engine stdout EOF - engine closed");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if from_engine_tx.send(trimmed.to_string()).is_err() {
                        tracing::debug!("Session gone, stopping output reader");
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Error reading from engine stdout: {}", e);
                    break;
                }
            }
        }
        tracing::info!("Output reader task exiting");
    });

    tokio::spawn(async move {
        while let Some(cmd) = to_engine_rx.recv().await {
            if let Err(e) = write_line(&mut stdin, &cmd).await {
                tracing::error!("Failed to write to engine stdin: {}", e);
                // Dropping the receiver tells the session its writes now fail.
                return;
            }
        }

        tracing::info!("Command channel closed, shutting engine down");
        let _ = write_line(&mut stdin, &UciCommand::Quit.to_line()).await;
        if tokio::time::timeout(QUIT_GRACE, process.wait()).await.is_err() {
            let _ = process.kill().await;
        }
        tracing::info!("Stdin writer task exiting");
    });

    tracing::info!("Engine process spawned");
    Ok(EngineHandle {
        tx: to_engine_tx,
        rx: from_engine_rx,
    })
}

async fn write_line(
    stdin: &mut tokio::process::ChildStdin,
    line: &str,
) -> Result<(), std::io::Error> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_configured_path_is_not_found() {
        let err = find_engine_path(Some(Path::new("/definitely/not/an/engine"))).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn test_startup_options_are_clamped() {
        let config = EngineConfig {
            path: None,
            skill_level: Some(42),
            threads: Some(0),
            hash_mb: Some(1 << 20),
        };
        let lines: Vec<String> = config.startup_options().iter().map(|c| c.to_line()).collect();
        assert_eq!(
            lines,
            vec![
                "setoption name Threads value 1",
                "setoption name Hash value 2048",
                "setoption name Skill Level value 20",
            ]
        );
    }

    #[test]
    fn test_default_config_sends_no_options() {
        assert!(EngineConfig::default().startup_options().is_empty());
    }
}
