//! Compact share strings for a game state.
//!
//! Format: `<score>-<grid>`. The grid is 16 hex digits in row-major order,
//! each the base-2 logarithm of the tile (0 for an empty cell), the same
//! 4-bits-per-tile packing a bitboard uses. The score is written in base 36
//! or base 10.

use serde::Deserialize;

use crate::error::CodecError;
use crate::history::GameState;
use crate::SIZE;

const DELIMITER: char = '-';
const GRID_DIGITS: usize = SIZE * SIZE;
/// Largest exponent a single hex digit can hold (2^15 = 32768).
const MAX_EXPONENT: u32 = 15;

/// Radix used for the score part of a share string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreRadix {
    #[default]
    Base36,
    Base10,
}

impl ScoreRadix {
    pub fn radix(self) -> u32 {
        match self {
            ScoreRadix::Base36 => 36,
            ScoreRadix::Base10 => 10,
        }
    }
}

/// Encode a state as `<score>-<grid>`.
pub fn encode(state: &GameState, radix: ScoreRadix) -> Result<String, CodecError> {
    let mut out = format_radix(state.score, radix.radix());
    out.push(DELIMITER);
    for &value in state.grid.iter().flatten() {
        out.push(encode_tile(value)?);
    }
    Ok(out)
}

/// Decode a string produced by [`encode`].
pub fn decode(input: &str, radix: ScoreRadix) -> Result<GameState, CodecError> {
    let (score_part, grid_part) = input
        .trim()
        .split_once(DELIMITER)
        .ok_or(CodecError::MissingDelimiter)?;

    let score = u32::from_str_radix(score_part, radix.radix())
        .map_err(|_| CodecError::InvalidScore(score_part.to_string()))?;

    let digits: Vec<char> = grid_part.chars().collect();
    if digits.len() != GRID_DIGITS {
        return Err(CodecError::GridLength {
            expected: GRID_DIGITS,
            actual: digits.len(),
        });
    }

    let mut grid = [[0; SIZE]; SIZE];
    for (index, &digit) in digits.iter().enumerate() {
        let exponent = digit
            .to_digit(16)
            .ok_or(CodecError::InvalidDigit { index, digit })?;
        grid[index / SIZE][index % SIZE] = if exponent == 0 { 0 } else { 1 << exponent };
    }

    Ok(GameState { grid, score })
}

fn encode_tile(value: u32) -> Result<char, CodecError> {
    if value == 0 {
        return Ok('0');
    }
    if !value.is_power_of_two() || value == 1 {
        return Err(CodecError::UnencodableTile(value));
    }
    let exponent = value.trailing_zeros();
    if exponent > MAX_EXPONENT {
        return Err(CodecError::UnencodableTile(value));
    }
    char::from_digit(exponent, 16).ok_or(CodecError::UnencodableTile(value))
}

fn format_radix(mut value: u32, radix: u32) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        // from_digit only fails for digit >= radix, which the modulo rules out.
        digits.push(char::from_digit(value % radix, radix).unwrap_or('0'));
        value /= radix;
    }
    digits.iter().rev().collect()
}
