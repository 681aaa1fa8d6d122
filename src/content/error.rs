//! Content parsing errors

use thiserror::Error;

/// Errors raised while splitting or parsing a content document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("missing front-matter: the document must start with a `---` line")]
    MissingFrontMatter,

    #[error("front-matter opened on line {line} is never closed")]
    UnclosedFrontMatter { line: usize },

    #[error("malformed front-matter at line {line}: {message}")]
    MalformedFrontMatter { line: usize, message: String },
}

impl ContentError {
    /// Line (1-based) the error points at
    pub fn line(&self) -> usize {
        match self {
            ContentError::MissingFrontMatter => 1,
            ContentError::UnclosedFrontMatter { line } => *line,
            ContentError::MalformedFrontMatter { line, .. } => *line,
        }
    }
}
