//! Error types for the compiler pipeline and runtime.

use crate::types::SourcePosition;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Malformed bracket structure in the source text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("unmatched '[' at {position}")]
    UnmatchedOpen { position: SourcePosition },

    #[error("unmatched ']' at {position}")]
    UnmatchedClose { position: SourcePosition },

    #[error("loop at {position} nests deeper than {limit} levels")]
    NestingTooDeep {
        position: SourcePosition,
        limit: usize,
    },
}

impl SyntaxError {
    pub fn position(&self) -> SourcePosition {
        match self {
            SyntaxError::UnmatchedOpen { position }
            | SyntaxError::UnmatchedClose { position }
            | SyntaxError::NestingTooDeep { position, .. } => *position,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// A defect in the compiler itself, never caused by the source program.
    #[error("Internal compiler error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WASM error: {0}")]
    Wasm(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// True when the source program itself is invalid.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax(_))
    }

    /// True when the failure indicates a bug in the compiler.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::Internal(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let position = SourcePosition::new(4, 1, 5);
        let err: Error = SyntaxError::UnmatchedOpen { position }.into();
        assert!(err.is_syntax());
        assert!(!err.is_internal());

        let err = Error::Internal("bad module".to_string());
        assert!(err.is_internal());
        assert!(!err.is_syntax());
    }

    #[test]
    fn test_syntax_error_display() {
        let err = SyntaxError::UnmatchedClose {
            position: SourcePosition::new(10, 2, 3),
        };
        assert_eq!(err.to_string(), "unmatched ']' at line 2, column 3 (offset 10)");
        assert_eq!(err.position().offset, 10);

        let err = SyntaxError::NestingTooDeep {
            position: SourcePosition::new(512, 1, 513),
            limit: 512,
        };
        assert_eq!(
            err.to_string(),
            "loop at line 1, column 513 (offset 512) nests deeper than 512 levels"
        );
        assert!(Error::from(err).is_syntax());
    }
}
