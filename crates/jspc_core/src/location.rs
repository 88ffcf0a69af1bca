use std::{fmt::Display, sync::Arc};

/// Position of a node in the template source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub filename: Arc<str>,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(filename: Arc<str>, line: u32) -> Self {
        SourceLocation { filename, line }
    }

    /// Same file, another line
    pub fn with_line(&self, line: u32) -> Self {
        SourceLocation {
            filename: self.filename.clone(),
            line,
        }
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.filename, self.line)
    }
}
