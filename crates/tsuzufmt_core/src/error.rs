//! Error types for formatting sessions.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::Origin;
use crate::report::Position;

/// Malformed line-range input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Line numbers are 1-based.
    #[error("Line numbers must be positive, got {line}")]
    NonPositiveLine { line: i64 },

    /// Range whose start lies after its end.
    #[error("Invalid line range: start {start} is after end {end}")]
    StartAfterEnd { start: u32, end: u32 },

    /// Unparsable file-lines JSON.
    #[error("Invalid file-lines JSON: {0}")]
    Json(String),
}

/// Errors raised while resolving a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Option name not in the option table.
    #[error("Unknown configuration option `{key}` (from {origin})")]
    UnknownOption { key: String, origin: Origin },

    /// Value of the wrong kind or outside the allowed set.
    #[error("Invalid value `{value}` for `{key}`: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    /// Unstable option set while `unstable_features` is off.
    #[error("Option `{key}` is unstable; set `unstable_features = true` to use it")]
    UnstableOption { key: String },

    /// `required_version` does not match this build.
    #[error("Configuration requires version {required}, but this is {actual}")]
    VersionMismatch { required: String, actual: String },

    /// Config file could not be read or parsed.
    #[error("Failed to load config {}: {message}", path.display())]
    File { path: PathBuf, message: String },
}

impl ConfigError {
    /// Creates a file error.
    pub fn file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

/// Per-input failure of the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The source could not be parsed.
    #[error("Parse error at {position}: {message}")]
    Parse { position: Position, message: String },

    /// Any other renderer failure.
    #[error("Render failed: {0}")]
    Failed(String),
}

impl RenderError {
    /// Creates a parse error.
    pub fn parse(position: Position, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }
}

/// Violated diff invariants. These indicate a bug, not bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    /// Chunk starts before the end of the previous chunk.
    #[error("Chunk at line {line} overlaps the previous chunk ending at line {previous_end}")]
    OutOfOrder { line: u32, previous_end: u32 },

    /// Chunk removes lines past the end of the original.
    #[error("Chunk at line {line} removes {removed} lines but the original has {len}")]
    OutOfBounds { line: u32, removed: u32, len: usize },

    /// Malformed modified-lines text.
    #[error("Malformed modified lines at line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Errors that abort a whole session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Configuration could not be resolved.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Internal diff failure.
    #[error("Internal diff error: {0}")]
    Diff(#[from] DiffError),

    /// Session already finished.
    #[error("Session is finished; no more inputs can be formatted")]
    Finished,
}
