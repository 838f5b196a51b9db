//! Grid engine: tile placement, the move/merge algorithm and terminal queries.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, trace};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::history::GameState;
use crate::tile::{Position, Tile, TileId};
use crate::{Direction, GridValues, SIZE, SPAWN_TWO_PROBABILITY, WIN_VALUE};

/// Largest value [`Engine::restore_grid`] accepts, so one merge still fits in a `u32`.
const MAX_RESTORED_VALUE: u32 = 1 << 30;

/// Result of a single [`Engine::move_tiles`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Whether at least one tile slid or merged.
    pub moved: bool,
    /// Points earned from merges in this move.
    pub score_gain: u32,
    /// Whether a merge produced the win value.
    pub win_detected: bool,
    /// Value of every tile produced by a merge, in traversal order.
    pub merged_values: Vec<u32>,
}

/// The grid engine.
///
/// Tiles live in an arena keyed by [`TileId`]; the grid stores ids. Tiles
/// consumed by a merge leave the grid but stay in the arena until the next
/// [`prepare_tiles`](Engine::prepare_tiles), so `merged_from` can always be
/// resolved for the move that produced it.
#[derive(Clone)]
pub struct Engine<R = SmallRng> {
    cells: [[Option<TileId>; SIZE]; SIZE],
    tiles: BTreeMap<TileId, Tile>,
    score: u32,
    next_id: u32,
    win_value: u32,
    rng: R,
}

impl Engine<SmallRng> {
    /// Create an empty engine whose spawns are driven by the given seed.
    pub fn new(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }
}

impl<R> Engine<R> {
    /// Create an empty engine drawing spawns from `rng`.
    pub fn with_rng(rng: R) -> Self {
        Engine {
            cells: [[None; SIZE]; SIZE],
            tiles: BTreeMap::new(),
            score: 0,
            next_id: 0,
            win_value: WIN_VALUE,
            rng,
        }
    }

    /// Replace the tile value reported through [`MoveOutcome::win_detected`].
    pub fn with_win_value(mut self, win_value: u32) -> Self {
        self.win_value = win_value;
        self
    }

    pub fn win_value(&self) -> u32 {
        self.win_value
    }

    /// Clear the grid, the score and the tile id counter.
    pub fn reset(&mut self) {
        self.cells = [[None; SIZE]; SIZE];
        self.tiles.clear();
        self.score = 0;
        self.next_id = 0;
    }

    /// Replace the grid contents with fresh tiles built from `values`.
    ///
    /// Ids are allocated in row-major order and continue from the current
    /// counter; call [`reset`](Engine::reset) first for ids starting at 0.
    /// The score is left alone.
    pub fn restore_grid(&mut self, values: &GridValues) {
        self.cells = [[None; SIZE]; SIZE];
        self.tiles.clear();
        for (row, line) in values.iter().enumerate() {
            for (col, &value) in line.iter().enumerate() {
                if value == 0 {
                    continue;
                }
                debug_assert!(
                    value.is_power_of_two() && (2..=MAX_RESTORED_VALUE).contains(&value),
                    "bad tile value {value}"
                );
                self.insert_tile(Position::new(row, col), value, false);
            }
        }
    }

    /// Tile values in row-major order, 0 for an empty cell.
    pub fn grid_values(&self) -> GridValues {
        let mut values = [[0; SIZE]; SIZE];
        for (row, line) in self.cells.iter().enumerate() {
            for (col, cell) in line.iter().enumerate() {
                if let Some(id) = cell {
                    values[row][col] = self.tiles[id].value;
                }
            }
        }
        values
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    /// Capture grid values and score for undo.
    pub fn snapshot(&self) -> GameState {
        GameState {
            grid: self.grid_values(),
            score: self.score,
        }
    }

    /// Restore a snapshot taken with [`snapshot`](Engine::snapshot).
    pub fn restore(&mut self, state: &GameState) {
        self.restore_grid(&state.grid);
        self.set_score(state.score);
    }

    /// Freeze tile positions before a move.
    ///
    /// Must be called once at the start of every move attempt: it records
    /// `previous`, clears `merged_from` and `is_new`, and drops the tiles
    /// consumed by the last move.
    pub fn prepare_tiles(&mut self) {
        let live: Vec<TileId> = self.cells.iter().flatten().flatten().copied().collect();
        self.tiles.retain(|id, _| live.contains(id));
        for tile in self.tiles.values_mut() {
            tile.merged_from = None;
            tile.is_new = false;
            tile.previous = Some(tile.position);
        }
    }

    /// Slide every tile towards `direction`, merging equal neighbours once.
    ///
    /// Does not spawn a tile and does not check for terminal states.
    pub fn move_tiles(&mut self, direction: Direction) -> MoveOutcome {
        let vector = direction.vector();
        let (rows, cols) = build_traversals(vector);
        let mut outcome = MoveOutcome::default();

        for &row in &rows {
            for &col in &cols {
                let from = Position::new(row, col);
                let Some(id) = self.cell(from) else {
                    continue;
                };
                let value = self.tiles[&id].value;
                let (furthest, next) = self.find_furthest_position(from, vector);

                let target = next.and_then(|pos| self.cell(pos)).map(|other| self.tiles[&other]);
                if let Some(target) = target {
                    if target.value == value && !target.is_merged() {
                        let merged = self.merge(id, from, target);
                        outcome.moved = true;
                        outcome.score_gain = outcome.score_gain.saturating_add(merged.value);
                        outcome.merged_values.push(merged.value);
                        if merged.value == self.win_value {
                            outcome.win_detected = true;
                        }
                        continue;
                    }
                }

                if furthest != from {
                    self.relocate(id, from, furthest);
                    outcome.moved = true;
                }
            }
        }

        if outcome.moved {
            self.score = self.score.saturating_add(outcome.score_gain);
        }
        debug!(
            "move {}: moved={} gain={} merges={:?} score={}",
            direction, outcome.moved, outcome.score_gain, outcome.merged_values, self.score
        );
        outcome
    }

    /// Whether any move could still change the grid: an empty cell or two
    /// orthogonally adjacent equal tiles.
    pub fn moves_available(&self) -> bool {
        for row in 0..SIZE {
            for col in 0..SIZE {
                let Some(value) = self.value_at(Position::new(row, col)) else {
                    return true;
                };
                if col + 1 < SIZE && self.value_at(Position::new(row, col + 1)) == Some(value) {
                    return true;
                }
                if row + 1 < SIZE && self.value_at(Position::new(row + 1, col)) == Some(value) {
                    return true;
                }
            }
        }
        false
    }

    /// Whether moving towards `direction` would change the grid.
    pub fn can_move(&self, direction: Direction) -> bool {
        let vector = direction.vector();
        self.tiles().any(|tile| match step(tile.position, vector) {
            Some(next) => match self.value_at(next) {
                None => true,
                Some(value) => value == tile.value,
            },
            None => false,
        })
    }

    /// Legal directions as a boolean array [Up, Down, Left, Right].
    pub fn legal_directions(&self) -> [bool; 4] {
        Direction::all().map(|direction| self.can_move(direction))
    }

    /// Tiles currently on the grid, in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .map(move |id| &self.tiles[id])
    }

    /// Look up a tile on the grid or one consumed by the current move.
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    pub fn tile_at(&self, position: Position) -> Option<&Tile> {
        self.cell(position).map(|id| &self.tiles[&id])
    }

    /// Get the maximum tile value on the grid.
    pub fn max_tile(&self) -> u32 {
        self.tiles().map(|tile| tile.value).max().unwrap_or(0)
    }

    /// Get the number of empty cells on the grid.
    pub fn empty_count(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_none()).count()
    }

    // -------------------------------------------------------------------------
    // Private methods
    // -------------------------------------------------------------------------

    fn cell(&self, position: Position) -> Option<TileId> {
        self.cells[position.row][position.col]
    }

    fn set_cell(&mut self, position: Position, id: Option<TileId>) {
        self.cells[position.row][position.col] = id;
    }

    fn value_at(&self, position: Position) -> Option<u32> {
        self.cell(position).map(|id| self.tiles[&id].value)
    }

    fn empty_positions(&self) -> Vec<Position> {
        let mut empty = Vec::with_capacity(SIZE * SIZE);
        for row in 0..SIZE {
            for col in 0..SIZE {
                let position = Position::new(row, col);
                if self.cell(position).is_none() {
                    empty.push(position);
                }
            }
        }
        empty
    }

    fn allocate_id(&mut self) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        id
    }

    fn insert_tile(&mut self, position: Position, value: u32, is_new: bool) -> Tile {
        let tile = Tile::new(self.allocate_id(), position, value, is_new);
        self.tiles.insert(tile.id, tile);
        self.set_cell(position, Some(tile.id));
        tile
    }

    /// Walk from `from` along `vector` over empty cells. Returns the last empty
    /// cell reached and the first blocking cell, if the walk stayed on the grid.
    fn find_furthest_position(
        &self,
        from: Position,
        vector: (isize, isize),
    ) -> (Position, Option<Position>) {
        let mut furthest = from;
        let mut next = step(from, vector);
        while let Some(position) = next {
            if self.cell(position).is_some() {
                break;
            }
            furthest = position;
            next = step(position, vector);
        }
        (furthest, next)
    }

    /// Replace the moving tile and `target` with their merge product.
    fn merge(&mut self, moving: TileId, from: Position, target: Tile) -> Tile {
        let value = self.tiles[&moving].value * 2;
        let mut merged = Tile::new(self.allocate_id(), target.position, value, false);
        merged.merged_from = Some([moving, target.id]);
        merged.previous = Some(from);

        self.set_cell(from, None);
        self.set_cell(target.position, Some(merged.id));
        if let Some(source) = self.tiles.get_mut(&moving) {
            source.position = target.position;
        }
        self.tiles.insert(merged.id, merged);
        merged
    }

    fn relocate(&mut self, id: TileId, from: Position, to: Position) {
        self.set_cell(from, None);
        self.set_cell(to, Some(id));
        if let Some(tile) = self.tiles.get_mut(&id) {
            tile.position = to;
        }
    }
}

impl<R: Rng> Engine<R> {
    /// Spawn a tile in a uniformly chosen empty cell.
    /// 90% chance of 2, 10% chance of 4.
    ///
    /// Returns `None` when the grid is full.
    pub fn add_random_tile(&mut self) -> Option<Tile> {
        let empty = self.empty_positions();
        if empty.is_empty() {
            return None;
        }

        let position = empty[self.rng.gen_range(0..empty.len())];
        let value = if self.rng.gen::<f32>() < SPAWN_TWO_PROBABILITY {
            2
        } else {
            4
        };
        let tile = self.insert_tile(position, value, true);
        trace!("spawned {} at {} as {}", value, position, tile.id);
        Some(tile)
    }
}

/// Scan order for a move: cells nearest the target edge come first.
fn build_traversals(vector: (isize, isize)) -> ([usize; SIZE], [usize; SIZE]) {
    let mut rows: [usize; SIZE] = std::array::from_fn(|i| i);
    let mut cols: [usize; SIZE] = std::array::from_fn(|i| i);
    if vector.0 == 1 {
        rows.reverse();
    }
    if vector.1 == 1 {
        cols.reverse();
    }
    (rows, cols)
}

fn step(position: Position, (d_row, d_col): (isize, isize)) -> Option<Position> {
    let row = position.row.checked_add_signed(d_row)?;
    let col = position.col.checked_add_signed(d_col)?;
    (row < SIZE && col < SIZE).then_some(Position::new(row, col))
}

impl<R> fmt::Debug for Engine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Engine {{ score: {}, next_id: {} }}", self.score, self.next_id)?;
        for line in self.grid_values() {
            for val in line {
                if val == 0 {
                    write!(f, "    .")?;
                } else {
                    write!(f, "{:5}", val)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<R> fmt::Display for Engine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Score: {}", self.score)?;
        writeln!(f, "+------+------+------+------+")?;
        for line in self.grid_values() {
            write!(f, "|")?;
            for val in line {
                if val == 0 {
                    write!(f, "      |")?;
                } else {
                    write!(f, "{:^6}|", val)?;
                }
            }
            writeln!(f)?;
            writeln!(f, "+------+------+------+------+")?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
