//! The caller side of the engine contract.
//!
//! A [`Session`] sequences every turn as three explicit phases: compute the
//! move ([`begin_move`](Session::begin_move)), then spawn a tile and evaluate
//! the terminal state ([`finish_move`](Session::finish_move)). Between the
//! two the session is busy and refuses further moves and undo, which leaves
//! front-ends free to animate. Win and loss gating live here, never in the
//! [`Engine`].

use log::{info, warn};
use rand::rngs::SmallRng;
use rand::Rng;

use crate::codec;
use crate::config::SessionConfig;
use crate::engine::{Engine, MoveOutcome};
use crate::error::{CodecError, SessionError};
use crate::history::{GameState, History};
use crate::tile::Tile;
use crate::Direction;

/// Derived game status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Playing,
    /// The win value was reached and the player has not chosen to continue.
    Won,
    /// The grid is full and no adjacent tiles match.
    Lost,
}

/// Result of the spawn and terminal-check phases of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnReport {
    pub spawned: Option<Tile>,
    pub status: Status,
}

/// One player's game: an [`Engine`] plus undo history, best score and the
/// win/loss/busy flags that decide which moves are accepted.
pub struct Session<R = SmallRng> {
    engine: Engine<R>,
    history: History,
    config: SessionConfig,
    best_score: u32,
    busy: bool,
    game_over: bool,
    has_won: bool,
    keep_playing: bool,
}

impl Session<SmallRng> {
    /// Start a new game seeded with `seed`.
    ///
    /// # Panics
    ///
    /// Panics if `config.history_capacity` is zero. Configs parsed by
    /// [`SessionConfig::from_toml_str`] are already validated; check
    /// hand-built ones with [`SessionConfig::validate`].
    pub fn new(config: SessionConfig, seed: u64) -> Self {
        Self::with_engine(config, Engine::new(seed))
    }
}

impl<R: Rng> Session<R> {
    /// Start a new game on `engine`, whose previous contents are discarded.
    ///
    /// # Panics
    ///
    /// Panics if `config.history_capacity` is zero.
    pub fn with_engine(config: SessionConfig, engine: Engine<R>) -> Self {
        let mut session = Session {
            engine: engine.with_win_value(config.win_value),
            history: History::new(config.history_capacity),
            config,
            best_score: 0,
            busy: false,
            game_over: false,
            has_won: false,
            keep_playing: false,
        };
        session.new_game();
        session
    }

    /// Reset the engine, forget history and flags, and spawn two tiles.
    pub fn new_game(&mut self) {
        self.engine.reset();
        self.clear_turn_state();
        self.engine.add_random_tile();
        self.engine.add_random_tile();
        info!("new game started");
    }

    /// Replace the game with `state`, forgetting history and flags.
    pub fn start_from(&mut self, state: &GameState) {
        self.engine.reset();
        self.engine.restore(state);
        self.clear_turn_state();
    }

    /// Load a share string produced by [`encode_state`](Session::encode_state).
    pub fn load(&mut self, encoded: &str) -> Result<(), SessionError> {
        let state = codec::decode(encoded, self.config.score_radix)?;
        self.start_from(&state);
        info!("loaded state {encoded:?} (score {})", state.score);
        Ok(())
    }

    /// Load a share string, starting a fresh game if it does not decode.
    /// Returns whether the string was loaded.
    pub fn load_or_new_game(&mut self, encoded: &str) -> bool {
        match self.load(encoded) {
            Ok(()) => true,
            Err(err) => {
                warn!("ignoring state {encoded:?}: {err}");
                self.new_game();
                false
            }
        }
    }

    pub fn encode_state(&self) -> Result<String, CodecError> {
        codec::encode(&self.engine.snapshot(), self.config.score_radix)
    }

    /// Phase one of a turn: snapshot, prepare and move.
    ///
    /// A move that changes nothing is dropped from history and leaves the
    /// session idle. A successful move leaves the session busy until
    /// [`finish_move`](Session::finish_move).
    pub fn begin_move(&mut self, direction: Direction) -> Result<MoveOutcome, SessionError> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        if self.game_over {
            return Err(SessionError::GameOver);
        }
        if self.has_won && !self.keep_playing {
            return Err(SessionError::AwaitingContinue);
        }

        self.history.push(self.engine.snapshot());
        self.engine.prepare_tiles();
        let outcome = self.engine.move_tiles(direction);

        if !outcome.moved {
            self.history.pop();
            return Ok(outcome);
        }

        if outcome.win_detected && !self.has_won {
            info!("reached {} with score {}", self.config.win_value, self.engine.score());
            self.has_won = true;
        }
        self.best_score = self.best_score.max(self.engine.score());
        self.busy = true;
        Ok(outcome)
    }

    /// Phases two and three: spawn a tile, then check for a loss.
    pub fn finish_move(&mut self) -> Result<TurnReport, SessionError> {
        if !self.busy {
            return Err(SessionError::NoPendingMove);
        }

        let spawned = self.engine.add_random_tile();
        if !self.engine.moves_available() {
            info!("game over with score {}", self.engine.score());
            self.game_over = true;
        }
        self.busy = false;
        Ok(TurnReport {
            spawned,
            status: self.status(),
        })
    }

    /// Run a whole turn without pausing between phases.
    ///
    /// The report is `None` when the move changed nothing.
    pub fn play(
        &mut self,
        direction: Direction,
    ) -> Result<(MoveOutcome, Option<TurnReport>), SessionError> {
        let outcome = self.begin_move(direction)?;
        if !outcome.moved {
            return Ok((outcome, None));
        }
        let report = self.finish_move()?;
        Ok((outcome, Some(report)))
    }

    /// Restore the position before the last successful move.
    ///
    /// Clears a loss; a reached win stays reached.
    pub fn undo(&mut self) -> Result<(), SessionError> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        let state = self.history.pop().ok_or(SessionError::NothingToUndo)?;
        self.engine.restore(&state);
        self.game_over = false;
        info!("undo to score {} ({} snapshots left)", state.score, self.history.len());
        Ok(())
    }

    /// Keep playing after a win. Returns false if there is no win to continue from.
    pub fn continue_playing(&mut self) -> bool {
        if !self.has_won {
            return false;
        }
        self.keep_playing = true;
        true
    }

    fn clear_turn_state(&mut self) {
        self.history.clear();
        self.busy = false;
        self.game_over = false;
        self.has_won = false;
        self.keep_playing = false;
    }
}

impl<R> Session<R> {
    pub fn status(&self) -> Status {
        if self.game_over {
            Status::Lost
        } else if self.has_won && !self.keep_playing {
            Status::Won
        } else {
            Status::Playing
        }
    }

    pub fn engine(&self) -> &Engine<R> {
        &self.engine
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn score(&self) -> u32 {
        self.engine.score()
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    /// Seed the best score, e.g. from a value the front-end persisted.
    pub fn set_best_score(&mut self, best_score: u32) {
        self.best_score = best_score;
    }

    /// Whether a move is waiting for [`finish_move`](Session::finish_move).
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn has_won(&self) -> bool {
        self.has_won
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridValues, ScoreRadix};

    fn session_at(grid: GridValues) -> Session {
        let mut session = Session::new(SessionConfig::default(), 3);
        session.start_from(&GameState { grid, score: 0 });
        session
    }

    // One Left move away from a full grid with no matching neighbours,
    // whatever value is spawned into (3, 3).
    const ONE_MOVE_FROM_LOSS: GridValues = [
        [8, 16, 32, 64],
        [16, 32, 64, 128],
        [32, 64, 128, 256],
        [64, 128, 0, 256],
    ];

    #[test]
    fn test_new_game_spawns_two_tiles() {
        let session = Session::new(SessionConfig::default(), 1);
        assert_eq!(session.engine().tiles().count(), 2);
        assert_eq!(session.score(), 0);
        assert_eq!(session.status(), Status::Playing);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_successful_turn_records_history_and_spawns() {
        let mut session = session_at([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let (outcome, report) = session.play(Direction::Left).unwrap();

        assert!(outcome.moved);
        assert_eq!(outcome.score_gain, 4);
        let report = report.unwrap();
        assert!(report.spawned.is_some());
        assert_eq!(report.status, Status::Playing);
        assert_eq!(session.engine().tiles().count(), 2);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.best_score(), 4);
    }

    #[test]
    fn test_noop_move_leaves_no_history() {
        let mut session = session_at([[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let (outcome, report) = session.play(Direction::Left).unwrap();

        assert!(!outcome.moved);
        assert!(report.is_none());
        assert!(session.history().is_empty());
        assert!(!session.is_busy());
        assert_eq!(session.engine().tiles().count(), 2);
    }

    #[test]
    fn test_busy_guard() {
        let mut session = session_at([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        session.begin_move(Direction::Left).unwrap();

        assert!(session.is_busy());
        assert_eq!(session.begin_move(Direction::Right), Err(SessionError::Busy));
        assert_eq!(session.undo(), Err(SessionError::Busy));

        session.finish_move().unwrap();
        assert!(!session.is_busy());
        assert_eq!(session.finish_move(), Err(SessionError::NoPendingMove));
    }

    #[test]
    fn test_loss_and_undo() {
        let mut session = session_at(ONE_MOVE_FROM_LOSS);
        let (_, report) = session.play(Direction::Left).unwrap();

        assert_eq!(report.unwrap().status, Status::Lost);
        assert!(session.is_game_over());
        assert_eq!(session.begin_move(Direction::Up), Err(SessionError::GameOver));

        session.undo().unwrap();
        assert_eq!(session.status(), Status::Playing);
        assert_eq!(session.engine().grid_values(), ONE_MOVE_FROM_LOSS);
        assert_eq!(session.undo(), Err(SessionError::NothingToUndo));
    }

    #[test]
    fn test_win_gates_moves_until_continue() {
        let mut session = session_at([[1024, 1024, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(!session.continue_playing());

        let (outcome, report) = session.play(Direction::Left).unwrap();
        assert!(outcome.win_detected);
        assert_eq!(report.unwrap().status, Status::Won);
        assert_eq!(
            session.begin_move(Direction::Right),
            Err(SessionError::AwaitingContinue)
        );

        assert!(session.continue_playing());
        assert_eq!(session.status(), Status::Playing);
        assert!(session.begin_move(Direction::Right).is_ok());
    }

    #[test]
    fn test_undo_keeps_reached_win() {
        let mut session = session_at([[1024, 1024, 0, 0], [0; 4], [0; 4], [0; 4]]);
        session.play(Direction::Left).unwrap();
        session.undo().unwrap();

        assert!(session.has_won());
        assert_eq!(session.status(), Status::Won);
        assert_eq!(session.engine().grid_values()[0], [1024, 1024, 0, 0]);
    }

    #[test]
    fn test_undo_restores_score() {
        let mut session = session_at([[2, 2, 4, 4], [0; 4], [0; 4], [0; 4]]);
        session.play(Direction::Left).unwrap();
        assert_eq!(session.score(), 12);

        session.undo().unwrap();
        assert_eq!(session.score(), 0);
        assert_eq!(session.best_score(), 12);
    }

    #[test]
    fn test_history_capacity_from_config() {
        let config = SessionConfig {
            history_capacity: 2,
            ..SessionConfig::default()
        };
        let mut session = Session::new(config, 11);
        let mut successful = 0;
        while successful < 4 {
            let legal = session.engine().legal_directions();
            let direction = Direction::all()
                .into_iter()
                .find(|d| legal[d.index()])
                .unwrap();
            if session.play(direction).unwrap().0.moved {
                successful += 1;
            }
        }
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    #[should_panic(expected = "history capacity")]
    fn test_zero_history_capacity_panics() {
        let config = SessionConfig {
            history_capacity: 0,
            ..SessionConfig::default()
        };
        Session::new(config, 0);
    }

    #[test]
    fn test_loaded_max_score_saturates_on_merge() {
        let mut session = Session::new(SessionConfig::default(), 2);
        // Row [2, 2, 0, 0] with a score of u32::MAX - 1.
        session.load("1z141z2-1100000000000000").unwrap();
        assert_eq!(session.score(), u32::MAX - 1);

        let (outcome, report) = session.play(Direction::Left).unwrap();
        assert!(outcome.moved);
        assert!(report.is_some());
        assert_eq!(session.score(), u32::MAX);
        assert_eq!(session.best_score(), u32::MAX);
    }

    #[test]
    fn test_share_string_round_trip() {
        let mut session = session_at([[2, 4, 8, 16], [0; 4], [0; 4], [0, 0, 0, 2048]]);
        session.engine.set_score(1234);
        let encoded = session.encode_state().unwrap();

        let mut other = Session::new(SessionConfig::default(), 9);
        other.load(&encoded).unwrap();
        assert_eq!(other.engine().grid_values(), session.engine().grid_values());
        assert_eq!(other.score(), 1234);
        assert!(other.history().is_empty());
    }

    #[test]
    fn test_bad_share_string_falls_back_to_new_game() {
        let mut session = session_at([[2, 4, 8, 16], [0; 4], [0; 4], [0; 4]]);
        session.engine.set_score(100);

        assert!(!session.load_or_new_game("not-a-state"));
        assert_eq!(session.score(), 0);
        assert_eq!(session.engine().tiles().count(), 2);
    }

    #[test]
    fn test_base10_config() {
        let config = SessionConfig {
            score_radix: ScoreRadix::Base10,
            ..SessionConfig::default()
        };
        let mut session = Session::new(config, 5);
        session.load("100-1000000000000000").unwrap();
        assert_eq!(session.score(), 100);
        assert_eq!(session.encode_state().unwrap(), "100-1000000000000000");
    }
}
