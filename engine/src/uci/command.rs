/// Outbound UCI commands, one line each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    SetOption { name: String, value: String },
    Position { fen: String },
    GoDepth(u32),
    Stop,
    Quit,
}

impl UciCommand {
    pub fn set_option(name: &str, value: impl ToString) -> Self {
        Self::SetOption {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// The command as a protocol line, without the trailing newline.
    pub fn to_line(&self) -> String {
        match self {
            Self::Uci => "uci".to_string(),
            Self::IsReady => "isready".to_string(),
            Self::UciNewGame => "ucinewgame".to_string(),
            Self::SetOption { name, value } => format!("setoption name {} value {}", name, value),
            Self::Position { fen } => format!("position fen {}", fen),
            Self::GoDepth(depth) => format!("go depth {}", depth),
            Self::Stop => "stop".to_string(),
            Self::Quit => "quit".to_string(),
        }
    }
}

impl std::fmt::Display for UciCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_lines() {
        assert_eq!(UciCommand::IsReady.to_line(), "isready");
        assert_eq!(
            UciCommand::set_option("MultiPV", 3).to_line(),
            "setoption name MultiPV value 3"
        );
        assert_eq!(
            UciCommand::Position {
                fen: chess::START_FEN.to_string()
            }
            .to_line(),
            format!("position fen {}", chess::START_FEN)
        );
        assert_eq!(UciCommand::GoDepth(15).to_string(), "go depth 15");
    }
}
