use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::codec::ScoreRadix;
use crate::error::ConfigError;
use crate::history::History;
use crate::WIN_VALUE;

/// Settings for a [`Session`](crate::Session).
///
/// Every field has a default, so an empty TOML document is a valid config:
///
/// ```toml
/// history_capacity = 50
/// win_value = 2048
/// score_radix = "base36"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Number of snapshots kept for undo.
    pub history_capacity: usize,
    /// Tile value that wins the game.
    pub win_value: u32,
    /// Radix of the score in share strings.
    pub score_radix: ScoreRadix,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            history_capacity: History::DEFAULT_CAPACITY,
            win_value: WIN_VALUE,
            score_radix: ScoreRadix::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroHistory);
        }
        if !self.win_value.is_power_of_two() || self.win_value < 4 {
            return Err(ConfigError::InvalidWinValue(self.win_value));
        }
        Ok(())
    }
}
