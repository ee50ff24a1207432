//! Opening book lookup. A move sequence is "book" when it follows a known
//! opening line from the initial position.

/// Decides whether a move sequence (UCI, from the start) is known theory.
pub trait OpeningBook: Send + Sync {
    fn is_book(&self, moves: &[String]) -> bool;
}

/// A book that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBook;

impl OpeningBook for NoBook {
    fn is_book(&self, _moves: &[String]) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningLine {
    pub name: String,
    pub moves: Vec<String>,
}

/// A book made of named lines; any non-empty prefix of a line is book.
#[derive(Debug, Clone, Default)]
pub struct LineBook {
    lines: Vec<OpeningLine>,
}

const COMMON_OPENINGS: &[(&str, &str)] = &[
    ("Italian Game", "e2e4 e7e5 g1f3 b8c6 f1c4 f8c5"),
    ("Ruy Lopez", "e2e4 e7e5 g1f3 b8c6 f1b5 a7a6 b5a4 g8f6 e1g1 f8e7"),
    ("Sicilian Najdorf", "e2e4 c7c5 g1f3 d7d6 d2d4 c5d4 f3d4 g8f6 b1c3 a7a6"),
    ("Queen's Gambit Declined", "d2d4 d7d5 c2c4 e7e6 b1c3 g8f6 c1g5 f8e7"),
    ("London System", "d2d4 d7d5 c1f4 g8f6 e2e3 e7e6 g1f3 f8d6 f4g3"),
    ("King's Indian Defense", "d2d4 g8f6 c2c4 g7g6 b1c3 f8g7 e2e4 d7d6 g1f3 e8g8"),
    ("French Defense", "e2e4 e7e6 d2d4 d7d5 b1c3 g8f6 c1g5 f8e7"),
    ("Caro-Kann Defense", "e2e4 c7c6 d2d4 d7d5 b1c3 d5e4 c3e4 b8d7"),
    ("Scotch Game", "e2e4 e7e5 g1f3 b8c6 d2d4 e5d4 f3d4 g8f6 b1c3 f8b4"),
    ("English Opening", "c2c4 e7e5 b1c3 g8f6 g1f3 b8c6 g2g3 f8b4"),
    ("Pirc Defense", "e2e4 d7d6 d2d4 g8f6 b1c3 g7g6 f1c4 f8g7 g1f3 e8g8"),
    ("Vienna Game", "e2e4 e7e5 b1c3 g8f6 f1c4 f8c5 f2f4"),
    ("King's Gambit", "e2e4 e7e5 f2f4 e5f4 g1f3 g7g5 h2h4 g5g4 f3e5"),
];

impl LineBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mainlines of the common openings.
    pub fn common_openings() -> Self {
        COMMON_OPENINGS
            .iter()
            .fold(Self::new(), |book, (name, moves)| book.with_line(name, moves))
    }

    /// Add a line given as space-separated UCI moves.
    pub fn with_line(mut self, name: &str, moves: &str) -> Self {
        self.lines.push(OpeningLine {
            name: name.to_string(),
            moves: moves.split_whitespace().map(str::to_string).collect(),
        });
        self
    }

    pub fn lines(&self) -> &[OpeningLine] {
        &self.lines
    }

    /// Name of the first line `moves` follows, if any.
    pub fn opening_name(&self, moves: &[String]) -> Option<&str> {
        self.lines
            .iter()
            .find(|line| follows(line, moves))
            .map(|line| line.name.as_str())
    }
}

fn follows(line: &OpeningLine, moves: &[String]) -> bool {
    !moves.is_empty() && line.moves.starts_with(moves)
}

impl OpeningBook for LineBook {
    fn is_book(&self, moves: &[String]) -> bool {
        self.lines.iter().any(|line| follows(line, moves))
    }
}
