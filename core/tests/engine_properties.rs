use proptest::prelude::*;
use tilemerge_core::codec::{decode, encode};
use tilemerge_core::{Direction, Engine, GameState, GridValues, ScoreRadix, SIZE};

fn grid_from_exponents(exponents: Vec<u32>, max: u32) -> GridValues {
    let mut grid = [[0; SIZE]; SIZE];
    for (i, e) in exponents.into_iter().enumerate() {
        let e = e.min(max);
        grid[i / SIZE][i % SIZE] = if e == 0 { 0 } else { 1 << e };
    }
    grid
}

fn grid_strategy() -> impl Strategy<Value = GridValues> {
    prop::collection::vec(0u32..=5, SIZE * SIZE).prop_map(|e| grid_from_exponents(e, 5))
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    (0u8..4).prop_map(|d| Direction::from_u8(d).unwrap())
}

fn engine_with(grid: &GridValues) -> Engine {
    let mut engine = Engine::new(0);
    engine.restore_grid(grid);
    engine.prepare_tiles();
    engine
}

fn tile_count(grid: &GridValues) -> usize {
    grid.iter().flatten().filter(|&&v| v != 0).count()
}

proptest! {
    #[test]
    fn merge_conservation(grid in grid_strategy(), direction in direction_strategy()) {
        let mut engine = engine_with(&grid);
        let outcome = engine.move_tiles(direction);

        prop_assert_eq!(outcome.score_gain, outcome.merged_values.iter().sum::<u32>());
        prop_assert_eq!(
            tile_count(&engine.grid_values()),
            tile_count(&grid) - outcome.merged_values.len()
        );
        prop_assert_eq!(engine.score(), outcome.score_gain);
    }

    #[test]
    fn merge_sources_were_not_merge_products(grid in grid_strategy(), direction in direction_strategy()) {
        let mut engine = engine_with(&grid);
        let outcome = engine.move_tiles(direction);

        let merged: Vec<_> = engine.tiles().filter(|t| t.is_merged()).copied().collect();
        prop_assert_eq!(merged.len(), outcome.merged_values.len());
        for tile in merged {
            let [a, b] = tile.merged_from.unwrap();
            for source in [a, b] {
                let source = engine.tile(source).unwrap();
                prop_assert!(!source.is_merged());
                prop_assert_eq!(source.value * 2, tile.value);
                prop_assert_eq!(source.position, tile.position);
            }
        }
    }

    #[test]
    fn noop_move_changes_nothing(grid in grid_strategy(), direction in direction_strategy()) {
        let mut engine = engine_with(&grid);
        engine.set_score(77);
        let outcome = engine.move_tiles(direction);

        if !outcome.moved {
            prop_assert_eq!(engine.grid_values(), grid);
            prop_assert_eq!(engine.score(), 77);
            prop_assert_eq!(outcome.score_gain, 0);
        } else {
            prop_assert!(engine.grid_values() != grid || !outcome.merged_values.is_empty());
        }
    }

    #[test]
    fn tiles_stay_in_bounds_and_in_their_cells(grid in grid_strategy(), directions in prop::collection::vec(direction_strategy(), 1..8)) {
        let mut engine = engine_with(&grid);
        for direction in directions {
            engine.prepare_tiles();
            engine.move_tiles(direction);
            engine.add_random_tile();
            for tile in engine.tiles() {
                prop_assert!(tile.position.row < SIZE && tile.position.col < SIZE);
                prop_assert_eq!(engine.tile_at(tile.position).map(|t| t.id), Some(tile.id));
            }
        }
    }

    #[test]
    fn can_move_predicts_move(grid in grid_strategy(), direction in direction_strategy()) {
        let engine = engine_with(&grid);
        let predicted = engine.can_move(direction);
        let mut moved = engine.clone();
        prop_assert_eq!(moved.move_tiles(direction).moved, predicted);
    }

    #[test]
    fn moves_available_matches_legal_directions(grid in grid_strategy()) {
        prop_assume!(tile_count(&grid) > 0);
        let engine = engine_with(&grid);
        let any_legal = engine.legal_directions().iter().any(|&legal| legal);
        prop_assert_eq!(engine.moves_available(), any_legal);
    }

    #[test]
    fn restore_grid_round_trip(grid in grid_strategy()) {
        let mut engine = engine_with(&grid);
        engine.restore_grid(&engine.grid_values());
        prop_assert_eq!(engine.grid_values(), grid);
    }

    #[test]
    fn codec_round_trip(exponents in prop::collection::vec(0u32..=15, SIZE * SIZE), score in any::<u32>()) {
        let state = GameState { grid: grid_from_exponents(exponents, 15), score };
        for radix in [ScoreRadix::Base36, ScoreRadix::Base10] {
            let encoded = encode(&state, radix).unwrap();
            prop_assert_eq!(decode(&encoded, radix).unwrap(), state);
        }
    }
}

#[test]
fn checkerboard_is_lost() {
    let engine = engine_with(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
    assert!(!engine.moves_available());
    for direction in Direction::all() {
        let mut engine = engine.clone();
        assert!(!engine.move_tiles(direction).moved);
    }
}
