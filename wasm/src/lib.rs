//! # Tile Merge WebAssembly Bindings
//!
//! JavaScript-friendly bindings to the tile merge engine using wasm-bindgen.
//! A turn is split the way a browser front-end animates it: `move` computes
//! the slide and returns every tile with its previous position and merge
//! sources, then `spawn` adds the new tile and reports the game status once
//! the animation is done.

use serde::Serialize;
use tilemerge_core::{
    Direction, Engine, MoveOutcome, Session, SessionConfig, Status, Tile, TurnReport,
};
use wasm_bindgen::prelude::*;

/// A tile as seen by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsTile {
    pub id: u32,
    pub value: u32,
    pub row: usize,
    pub col: usize,
    pub previous_row: Option<usize>,
    pub previous_col: Option<usize>,
    /// The two tiles consumed to produce this one, at their final positions.
    pub merged_from: Option<Vec<JsTile>>,
    pub is_new: bool,
}

impl JsTile {
    fn from_tile<R>(engine: &Engine<R>, tile: &Tile) -> JsTile {
        let merged_from = tile.merged_from.map(|ids| {
            ids.iter()
                .filter_map(|&id| engine.tile(id))
                .map(|source| JsTile::from_tile(engine, source))
                .collect()
        });
        JsTile {
            id: tile.id.0,
            value: tile.value,
            row: tile.position.row,
            col: tile.position.col,
            previous_row: tile.previous.map(|p| p.row),
            previous_col: tile.previous.map(|p| p.col),
            merged_from,
            is_new: tile.is_new,
        }
    }
}

/// Result of the move phase, serialized for JavaScript.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsMoveResult {
    pub moved: bool,
    pub score_gain: u32,
    pub win_detected: bool,
    pub merged_values: Vec<u32>,
    /// Current total score.
    pub score: u32,
    pub best_score: u32,
    pub tiles: Vec<JsTile>,
    /// Why the move was refused, if it was.
    pub rejected: Option<String>,
}

/// Result of the spawn phase, serialized for JavaScript.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsTurnResult {
    pub spawned: Option<JsTile>,
    pub status: &'static str,
}

/// WebAssembly wrapper for a game session.
#[wasm_bindgen]
pub struct WasmGame {
    session: Session,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game with the given seed.
    ///
    /// The seed is a 64-bit integer used to initialize the deterministic RNG.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> WasmGame {
        WasmGame {
            session: Session::new(SessionConfig::default(), seed),
        }
    }

    /// Start over with two fresh tiles.
    #[wasm_bindgen(js_name = newGame)]
    pub fn new_game(&mut self) {
        self.session.new_game();
    }

    /// Load a share string. Starts a new game and returns false if it is invalid.
    #[wasm_bindgen(js_name = loadState)]
    pub fn load_state(&mut self, state: &str) -> bool {
        self.session.load_or_new_game(state)
    }

    /// Current position as a share string.
    #[wasm_bindgen(js_name = encodeState)]
    pub fn encode_state(&self) -> Result<String, JsError> {
        Ok(self.session.encode_state()?)
    }

    /// First phase of a turn.
    ///
    /// Direction values:
    /// - 0 = Up
    /// - 1 = Down
    /// - 2 = Left
    /// - 3 = Right
    ///
    /// When `moved` is true, call `spawn` once the slide has been animated.
    #[wasm_bindgen(js_name = "move")]
    pub fn move_tiles(&mut self, direction: u8) -> JsValue {
        let result = match Direction::from_u8(direction) {
            Some(direction) => self.session.begin_move(direction),
            None => {
                let reason = format!("invalid direction {direction}, expected 0-3");
                return self.move_result(MoveOutcome::default(), Some(reason));
            }
        };
        match result {
            Ok(outcome) => self.move_result(outcome, None),
            Err(err) => self.move_result(MoveOutcome::default(), Some(err.to_string())),
        }
    }

    /// Second and third phases: spawn a tile and evaluate the game status.
    pub fn spawn(&mut self) -> Result<JsValue, JsError> {
        let report = self.session.finish_move()?;
        Ok(self.turn_result(report))
    }

    /// Whole turn without a pause between phases. Returns the spawn result,
    /// or null if nothing moved.
    pub fn play(&mut self, direction: u8) -> Result<JsValue, JsError> {
        let direction = Direction::from_u8(direction)
            .ok_or_else(|| JsError::new(&format!("invalid direction {direction}, expected 0-3")))?;
        match self.session.play(direction)? {
            (_, Some(report)) => Ok(self.turn_result(report)),
            (_, None) => Ok(JsValue::NULL),
        }
    }

    /// Returns false if there was nothing to undo or a move is in progress.
    pub fn undo(&mut self) -> bool {
        self.session.undo().is_ok()
    }

    /// Keep playing after reaching the win value.
    #[wasm_bindgen(js_name = keepPlaying)]
    pub fn keep_playing(&mut self) -> bool {
        self.session.continue_playing()
    }

    /// Get the current board as 16 values in row-major order.
    #[wasm_bindgen(js_name = getBoard)]
    pub fn get_board(&self) -> Vec<u32> {
        self.session.engine().grid_values().iter().flatten().copied().collect()
    }

    /// Get every tile on the board.
    #[wasm_bindgen(js_name = getTiles)]
    pub fn get_tiles(&self) -> JsValue {
        to_js(&self.tiles())
    }

    /// Get the current score.
    #[wasm_bindgen(js_name = getScore)]
    pub fn get_score(&self) -> u32 {
        self.session.score()
    }

    #[wasm_bindgen(js_name = getBestScore)]
    pub fn get_best_score(&self) -> u32 {
        self.session.best_score()
    }

    /// Seed the best score from the front-end's own storage.
    #[wasm_bindgen(js_name = setBestScore)]
    pub fn set_best_score(&mut self, best_score: u32) {
        self.session.set_best_score(best_score);
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        !self.session.history().is_empty()
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.session.is_busy()
    }

    /// "playing", "won" or "lost".
    pub fn status(&self) -> String {
        status_name(self.session.status()).to_string()
    }
}

impl WasmGame {
    fn tiles(&self) -> Vec<JsTile> {
        let engine = self.session.engine();
        engine.tiles().map(|tile| JsTile::from_tile(engine, tile)).collect()
    }

    fn move_result(&self, outcome: MoveOutcome, rejected: Option<String>) -> JsValue {
        to_js(&JsMoveResult {
            moved: outcome.moved,
            score_gain: outcome.score_gain,
            win_detected: outcome.win_detected,
            merged_values: outcome.merged_values,
            score: self.session.score(),
            best_score: self.session.best_score(),
            tiles: self.tiles(),
            rejected,
        })
    }

    fn turn_result(&self, report: TurnReport) -> JsValue {
        let engine = self.session.engine();
        to_js(&JsTurnResult {
            spawned: report.spawned.map(|tile| JsTile::from_tile(engine, &tile)),
            status: status_name(report.status),
        })
    }
}

fn status_name(status: Status) -> &'static str {
    match status {
        Status::Playing => "playing",
        Status::Won => "won",
        Status::Lost => "lost",
    }
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}
