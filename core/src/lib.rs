//! # Tile Merge Core Engine
//!
//! The move/merge engine of a 4x4 sliding-tile merge puzzle (2048-style),
//! together with the pieces a front-end needs around it: a bounded undo
//! history, a compact share-string codec and a [`Session`] that sequences
//! move, spawn and terminal checks.
//!
//! The [`Engine`] is a pure state machine over the grid, the score and a tile
//! id counter. It never decides that a game is won or lost; callers derive
//! that from [`MoveOutcome::win_detected`] and [`Engine::moves_available`].
//!
//! ## Example
//!
//! ```rust
//! use tilemerge_core::{Direction, Engine};
//!
//! let mut engine = Engine::new(42);
//! engine.restore_grid(&[[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
//! engine.prepare_tiles();
//! let outcome = engine.move_tiles(Direction::Left);
//! assert!(outcome.moved);
//! assert_eq!(outcome.score_gain, 4);
//! assert_eq!(engine.grid_values()[0], [4, 0, 0, 0]);
//! ```

use std::fmt;
use std::str::FromStr;

pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod session;
pub mod tile;

pub use codec::ScoreRadix;
pub use config::SessionConfig;
pub use engine::{Engine, MoveOutcome};
pub use error::{CodecError, ConfigError, ParseDirectionError, SessionError};
pub use history::{GameState, History};
pub use session::{Session, Status, TurnReport};
pub use tile::{Position, Tile, TileId};

/// Side length of the grid.
pub const SIZE: usize = 4;

/// Tile value that counts as a win unless configured otherwise.
pub const WIN_VALUE: u32 = 2048;

/// Probability that a spawned tile is a 2 rather than a 4.
pub const SPAWN_TWO_PROBABILITY: f32 = 0.9;

/// Plain tile values in row-major order, 0 for an empty cell.
pub type GridValues = [[u32; SIZE]; SIZE];

/// The four possible move directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    /// Convert a u8 to a Direction (0=Up, 1=Down, 2=Left, 3=Right).
    /// Returns None for invalid values.
    pub fn from_u8(value: u8) -> Option<Direction> {
        match value {
            0 => Some(Direction::Up),
            1 => Some(Direction::Down),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }

    /// Get all four directions.
    pub fn all() -> [Direction; 4] {
        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ]
    }

    /// Index into `[Up, Down, Left, Right]` arrays such as
    /// [`Engine::legal_directions`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Unit step as `(row, col)`.
    pub fn vector(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}
