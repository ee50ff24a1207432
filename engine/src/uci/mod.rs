pub mod command;
pub mod parser;

pub use command::UciCommand;
pub use parser::{parse_uci_message, EngineInfo, Score, UciMessage, MATE_PAWNS};

#[derive(Debug, thiserror::Error)]
pub enum UciError {
    #[error("Malformed UCI message: {0}")]
    MalformedMessage(String),
    #[error("Unknown UCI message: {0}")]
    UnknownMessage(String),
    #[error("Invalid move: {0}")]
    InvalidMove(#[from] chess::NotationError),
}
