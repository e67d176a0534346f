use std::fmt::{self, Display};

/// Identifies a statement within a block, or the block's terminator.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum StmtIdx {
    Stmt(usize),
    Term,
}

impl Display for StmtIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stmt(idx) => write!(f, "{}", idx),
            Self::Term => write!(f, "TERM"),
        }
    }
}

/// The statement currently being processed by an analysis.
///
/// Rendered as `<path> BB<block>/<statement|TERM>: ` so that it can be used
/// directly as a diagnostic prefix.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct Position {
    pub path: String,
    pub bb: usize,
    pub stmt: StmtIdx,
}

impl Position {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            bb: 0,
            stmt: StmtIdx::Stmt(0),
        }
    }

    pub fn is_terminator(&self) -> bool {
        self.stmt == StmtIdx::Term
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BB{}/{}: ", self.path, self.bb, self.stmt)
    }
}
