//! Error taxonomy for query composition and execution
//!
//! Translation and usage problems are programmer errors and surface at
//! materialization. Transport failures come from the executor and are passed
//! through untouched.

use thiserror::Error;

/// Coarse classification of a [`QueryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TranslationUnsupported,
    Usage,
    Transport,
}

#[derive(Debug, Error)]
pub enum QueryError {
    /// The predicate or projection has a shape with no OData equivalent
    #[error("unsupported expression `{expression}`: {reason}")]
    TranslationUnsupported { expression: String, reason: String },

    /// The query API was misused
    #[error("invalid query usage: {0}")]
    Usage(String),

    /// The execution collaborator failed
    #[error("transport failure: {0:#}")]
    Transport(anyhow::Error),
}

impl QueryError {
    pub fn unsupported(expression: impl ToString, reason: impl Into<String>) -> Self {
        Self::TranslationUnsupported {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TranslationUnsupported { .. } => ErrorKind::TranslationUnsupported,
            Self::Usage(_) => ErrorKind::Usage,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
