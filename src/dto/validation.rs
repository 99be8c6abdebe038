//! Validation helpers for DTOs.

use validator::{ValidationError, ValidationErrors};

use crate::state::game::EntryType;

/// Longest accepted player name, in characters.
pub const MAX_PLAYER_NAME_LENGTH: usize = 32;

/// Bounds applied to raw throw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLimits {
    /// Highest block number accepted.
    pub max_block_number: u32,
    /// Most block numbers accepted in one throw.
    pub max_blocks_per_throw: usize,
}

/// Validated block numbers of a single throw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedThrow {
    /// Block numbers in the order they were entered.
    pub blocks: Vec<u32>,
}

impl ParsedThrow {
    /// A throw that knocked nothing down, entered as a lone `0`.
    ///
    /// Zeros among several tokens are blocks like any other and are counted
    /// in multiple-blocks mode.
    pub fn is_miss(&self) -> bool {
        self.blocks == [0]
    }

    /// Block numbers as the rule engine consumes them.
    pub fn as_values(&self) -> Vec<f64> {
        self.blocks.iter().copied().map(f64::from).collect()
    }
}

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates that a player name is not blank once trimmed.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(error(
            "player_name_blank",
            "Player name must not be empty".into(),
        ));
    }
    if trimmed.chars().count() > MAX_PLAYER_NAME_LENGTH {
        return Err(error(
            "player_name_length",
            format!("Player name must be at most {MAX_PLAYER_NAME_LENGTH} characters"),
        ));
    }
    Ok(())
}

fn parse_block(token: &str, limits: InputLimits) -> Result<u32, ValidationError> {
    match token.parse::<u32>() {
        Ok(block) if block > limits.max_block_number => Err(error(
            "block_out_of_range",
            format!(
                "Block numbers go up to {} (got {block})",
                limits.max_block_number
            ),
        )),
        Ok(block) => Ok(block),
        Err(_) if token.parse::<i64>().is_ok() => Err(error(
            "block_negative",
            format!("Block numbers cannot be negative (got {token})"),
        )),
        Err(_) => Err(error(
            "block_not_numeric",
            format!("`{token}` is not a block number"),
        )),
    }
}

/// Split raw throw input into block numbers, enforcing the input limits.
///
/// Tokens are separated by whitespace or commas. Single-block throws accept
/// exactly one number.
pub fn parse_throw(
    input: &str,
    entry_type: EntryType,
    limits: InputLimits,
) -> Result<ParsedThrow, ValidationError> {
    let tokens = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>();

    if tokens.is_empty() {
        return Err(error(
            "score_empty",
            "Enter the number of the knocked-down block, or 0 for a miss".into(),
        ));
    }

    match entry_type {
        EntryType::SingleBlock if tokens.len() > 1 => {
            return Err(error(
                "single_block_count",
                "A single-block throw takes exactly one block number".into(),
            ));
        }
        EntryType::MultipleBlocks if tokens.len() > limits.max_blocks_per_throw => {
            return Err(error(
                "too_many_blocks",
                format!(
                    "A throw can knock down at most {} blocks",
                    limits.max_blocks_per_throw
                ),
            ));
        }
        _ => {}
    }

    let blocks = tokens
        .into_iter()
        .map(|token| parse_block(token, limits))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedThrow { blocks })
}

/// Wrap a single field error so it converts like derived validation output.
pub fn field_error(field: &'static str, err: ValidationError) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, err);
    errors
}
