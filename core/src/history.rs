//! Undo history: a bounded stack of (grid, score) snapshots.

use std::collections::VecDeque;

use crate::GridValues;

/// Immutable capture of the grid values and the score.
///
/// Carries no tile identities; restoring a snapshot synthesizes fresh tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    pub grid: GridValues,
    pub score: u32,
}

/// Bounded stack of snapshots. Pushing past capacity evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<GameState>,
    capacity: usize,
}

impl History {
    /// Default number of snapshots kept for undo.
    pub const DEFAULT_CAPACITY: usize = 50;

    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be at least 1");
        History {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, state: GameState) {
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(state);
    }

    /// Remove and return the most recent snapshot.
    pub fn pop(&mut self) -> Option<GameState> {
        self.snapshots.pop_back()
    }

    pub fn latest(&self) -> Option<&GameState> {
        self.snapshots.back()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for History {
    fn default() -> Self {
        History::new(Self::DEFAULT_CAPACITY)
    }
}
