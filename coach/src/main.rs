//! `chesscoach`: review games, ask for best moves and hints, and stream
//! analysis from a UCI engine. Results are printed to stdout as JSON.

use std::path::PathBuf;

use analysis::LineBook;
use anyhow::Context;
use chess::Position;
use clap::{Args, Parser, Subcommand};
use coach::{query, review_game, CoachConfig};
use engine::EngineSession;
use serde::Serialize;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "chesscoach", about = "Chess coaching backed by a UCI engine")]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Engine overrides. Each falls back to its environment variable.
#[derive(Args)]
struct EngineArgs {
    /// Engine executable (`CHESSCOACH_ENGINE_PATH`)
    #[arg(long, global = true)]
    engine_path: Option<PathBuf>,

    /// Skill level 0-20 (`CHESSCOACH_SKILL_LEVEL`)
    #[arg(long, global = true)]
    skill: Option<u8>,

    /// Search threads (`CHESSCOACH_THREADS`)
    #[arg(long, global = true)]
    threads: Option<u32>,

    /// Hash table size in MB (`CHESSCOACH_HASH_MB`)
    #[arg(long, global = true)]
    hash_mb: Option<u32>,

    /// Search depth (`CHESSCOACH_ANALYSIS_DEPTH`)
    #[arg(long, global = true)]
    depth: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every move of a game and estimate both players.
    Review {
        /// Start position; the initial position when omitted.
        #[arg(long)]
        fen: Option<String>,

        /// Moves in UCI notation.
        #[arg(required = true)]
        moves: Vec<String>,
    },
    /// Print the engine's best move.
    Best {
        #[arg(long)]
        fen: String,
    },
    /// Print a hint for the side to move.
    Hint {
        #[arg(long)]
        fen: String,

        /// 1 squares, 2 arrows, 3 best move
        #[arg(long, default_value_t = 1)]
        level: u8,

        /// Candidate lines to search
        #[arg(long, default_value_t = 3)]
        variations: u32,
    },
    /// Stream analysis snapshots until the search ends.
    Analyze {
        #[arg(long)]
        fen: String,

        #[arg(long, default_value_t = 1)]
        variations: u32,
    },
}

impl EngineArgs {
    fn apply(&self, config: &mut CoachConfig) {
        if let Some(path) = &self.engine_path {
            config.engine_path = Some(path.clone());
        }
        if let Some(skill) = self.skill {
            config.skill_level = skill;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(hash_mb) = self.hash_mb {
            config.hash_mb = hash_mb;
        }
        if let Some(depth) = self.depth {
            config.depth = depth;
        }
    }
}

fn init_tracing(
    config: &CoachConfig,
) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match config.prepare_log_dir()? {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "chesscoach");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn parse_position(fen: &str) -> anyhow::Result<Position> {
    Position::from_fen(fen).with_context(|| format!("invalid FEN: {}", fen))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = CoachConfig::from_env();
    cli.engine.apply(&mut config);
    let _guard = init_tracing(&config)?;

    tracing::info!(depth = config.depth, "chesscoach starting");
    let session = EngineSession::launch(&config.engine_config());

    match cli.command {
        Commands::Review { fen, moves } => {
            let book = LineBook::common_openings();
            let review = review_game(&session, fen.as_deref(), &moves, config.depth, &book)
                .await
                .context("review failed")?;
            print_json(&review)?;
        }
        Commands::Best { fen } => {
            let position = parse_position(&fen)?;
            let best = session.best_move(position.to_fen(), config.depth).await;
            print_json(&best)?;
        }
        Commands::Hint {
            fen,
            level,
            variations,
        } => {
            let position = parse_position(&fen)?;
            session.configure(config.skill_level, variations);
            let hint = query::hint(&session, &position, level, config.depth).await;
            print_json(&hint)?;
        }
        Commands::Analyze { fen, variations } => {
            let position = parse_position(&fen)?;
            session.configure(config.skill_level, variations);
            let mut last_lines = None;
            let mut failed = None;
            query::stream_analysis(&session, &position, config.depth, |snapshot| {
                // Only print when the lines move, and always the final one.
                let finished = snapshot.finished_token.is_some() && !snapshot.searching;
                if finished || last_lines.as_ref() != Some(&snapshot.lines) {
                    last_lines = Some(snapshot.lines.clone());
                    if let Err(e) = print_json(snapshot) {
                        failed = Some(e);
                    }
                }
            })
            .await;
            if let Some(e) = failed {
                return Err(e);
            }
        }
    }

    session.stop();
    Ok(())
}
