//! Error taxonomy for scanning.
//!
//! Everything except [`DocError::SourceUnreadable`] is recoverable: the
//! scanner records a [`Diagnostic`], skips the offending line or block and
//! keeps going. `SourceUnreadable` ends the scan of that one file.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum DocError {
    /// A constructed entity violates a data-model invariant.
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),

    #[error("malformed tag: {0}")]
    MalformedTag(String),

    #[error("malformed enum member: {0}")]
    MalformedEnumMember(String),

    #[error("malformed declaration: {0}")]
    MalformedDeclarationLine(String),

    /// The line source could not be opened or read.
    #[error("source unreadable: {0}")]
    SourceUnreadable(String),
}

impl DocError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DocError::SourceUnreadable(_))
    }
}

/// A recoverable (or file-fatal) problem found while scanning one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub path: PathBuf,
    /// 1-based line number, when the problem belongs to a line.
    pub line: Option<usize>,
    pub error: DocError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.path.display(), line, self.error),
            None => write!(f, "{}: {}", self.path.display(), self.error),
        }
    }
}
