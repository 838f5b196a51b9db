//! Tile model: identity-bearing values placed on the grid.

use std::fmt;

/// A cell coordinate, 0-indexed from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Identifier of a tile, unique within one engine until the next reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u32);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single tile.
///
/// Tiles are owned by the [`Engine`](crate::Engine); callers only ever see
/// shared references or copies. A tile consumed by a merge stays readable
/// through [`Engine::tile`](crate::Engine::tile) until the next move is
/// prepared, so front-ends can animate it into the merge cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub id: TileId,
    /// Power of two, at least 2.
    pub value: u32,
    pub position: Position,
    /// Where the tile stood before the move in progress. `None` for tiles that
    /// were spawned or restored since the last `prepare_tiles`.
    pub previous: Option<Position>,
    /// The two tiles consumed to produce this one during the current move.
    pub merged_from: Option<[TileId; 2]>,
    /// Set only during the turn the tile was spawned.
    pub is_new: bool,
}

impl Tile {
    pub(crate) fn new(id: TileId, position: Position, value: u32, is_new: bool) -> Self {
        Tile {
            id,
            value,
            position,
            previous: None,
            merged_from: None,
            is_new,
        }
    }

    /// Whether this tile was produced by a merge during the current move.
    pub fn is_merged(&self) -> bool {
        self.merged_from.is_some()
    }
}
