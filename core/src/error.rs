//! Error types shared by the engine's callers.
//!
//! The engine itself is total over its input domain and never returns an
//! error; these types cover parsing, the state codec, configuration loading
//! and the session pipeline.

use std::io;
use std::path::PathBuf;

/// An unknown direction literal was given to `Direction::from_str`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction {0:?} (expected up, down, left or right)")]
pub struct ParseDirectionError(pub String);

/// Failure to encode or decode a share string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("state string has no '-' between score and grid")]
    MissingDelimiter,
    #[error("invalid score {0:?}")]
    InvalidScore(String),
    #[error("grid must have {expected} digits, got {actual}")]
    GridLength { expected: usize, actual: usize },
    #[error("invalid grid digit {digit:?} at cell {index}")]
    InvalidDigit { index: usize, digit: char },
    #[error("tile value {0} cannot be stored as a single hex digit")]
    UnencodableTile(u32),
}

/// Failure to load a [`SessionConfig`](crate::config::SessionConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("history_capacity must be at least 1")]
    ZeroHistory,
    #[error("win_value must be a power of two >= 4, got {0}")]
    InvalidWinValue(u32),
}

/// A request the session pipeline refused to carry out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("a move is still being processed")]
    Busy,
    #[error("the game is over")]
    GameOver,
    #[error("the game is won; continue playing or start a new game")]
    AwaitingContinue,
    #[error("no move is waiting to be finished")]
    NoPendingMove,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error(transparent)]
    Codec(#[from] CodecError),
}
