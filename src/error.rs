//! @ai:module:intent Error types for the problem model and the per-instance pipeline
//! @ai:module:layer domain
//! @ai:module:public_api ModelError, StageError, StageKind
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Errors raised by the instance reader, the solver and the solution writer
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error at {file}:{line}: {message}")]
    Parse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Unexpected end of file {file}: {message}")]
    UnexpectedEof { file: PathBuf, message: String },

    #[error("Solver error: {0}")]
    Solver(String),
}

/// @ai:intent Pipeline stage in which an instance failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Parse,
    Solve,
    Validation,
    Export,
}

impl StageKind {
    /// @ai:intent Convert stage to string representation
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Parse => "parse",
            StageKind::Solve => "solve",
            StageKind::Validation => "validation",
            StageKind::Export => "export",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Classified failure of one instance; never escapes the batch loop
#[derive(Error, Debug)]
pub enum StageError {
    #[error("parse error: {0}")]
    Parse(#[source] ModelError),

    #[error("solve error: {0}")]
    Solve(#[source] ModelError),

    #[error("invalid solution ({} errors)", errors.len())]
    Validation { errors: Vec<String> },

    #[error("export error: {0}")]
    Export(#[source] ModelError),
}

impl StageError {
    /// @ai:intent Stage that produced this error
    /// @ai:effects pure
    pub fn kind(&self) -> StageKind {
        match self {
            StageError::Parse(_) => StageKind::Parse,
            StageError::Solve(_) => StageKind::Solve,
            StageError::Validation { .. } => StageKind::Validation,
            StageError::Export(_) => StageKind::Export,
        }
    }
}
