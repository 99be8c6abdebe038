//! Pure rule checks for the block-stacking game.
//!
//! Nothing in here touches storage or the session store; the orchestration
//! layer decides what to persist and dispatch from the values returned here.

use std::collections::BTreeSet;

use crate::state::game::{EntryType, Player, PlayerId};

/// Exact score a player must reach to win.
pub const WINNING_SCORE: i32 = 50;
/// Score a player is sent back to after overshooting [`WINNING_SCORE`].
pub const PENALTY_RESET_SCORE: i32 = 25;
/// Number of consecutive misses that eliminates a player for the round.
pub const ELIMINATION_MISSES: u32 = 3;

/// True when `score` overshoots the winning score. Exactly 50 is not a penalty.
pub fn check_penalty_rule(score: impl Into<f64>) -> bool {
    score.into() > f64::from(WINNING_SCORE)
}

/// True once a player has missed [`ELIMINATION_MISSES`] times in a row.
pub fn check_elimination(consecutive_misses: u32) -> bool {
    consecutive_misses >= ELIMINATION_MISSES
}

/// True only when `score` lands on the winning score exactly.
pub fn check_win_condition(score: impl Into<f64>) -> bool {
    score.into() == f64::from(WINNING_SCORE)
}

/// Compute the points scored by a throw from the raw block numbers.
///
/// Valid entries are finite and non-negative. In single-block mode a block
/// numbered zero cannot exist, so entries must also be strictly positive and
/// the first one is the score (fractions are truncated). In multiple-blocks
/// mode the score is the number of valid entries, zeros included.
pub fn calculate_score(blocks: &[f64], entry_type: EntryType) -> i32 {
    let valid = blocks
        .iter()
        .copied()
        .filter(|value| value.is_finite() && *value >= 0.0);

    match entry_type {
        EntryType::MultipleBlocks => i32::try_from(valid.count()).unwrap_or(i32::MAX),
        EntryType::SingleBlock => valid
            .filter(|value| *value > 0.0)
            .map(|value| value as i32)
            .next()
            .unwrap_or(0),
    }
}

/// True when every player has either scored this round or is eliminated.
///
/// An empty roster never completes a round.
pub fn check_round_completion(players: &[Player], scored_this_round: &BTreeSet<PlayerId>) -> bool {
    !players.is_empty()
        && players
            .iter()
            .all(|player| player.is_eliminated || scored_this_round.contains(&player.id))
}

/// Effect of adding a throw's points to a player's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreChange {
    /// Score after the throw, post penalty correction.
    pub total: i32,
    /// Signed delta actually applied to the previous score.
    pub delta: i32,
    /// Whether the overshoot penalty sent the player back to 25.
    pub penalized: bool,
}

/// Add `points` to `current`, resetting to [`PENALTY_RESET_SCORE`] on overshoot.
///
/// The reset is a game rule, not a clamp: 48 + 5 lands on 25, not 50.
pub fn apply_points(current: i32, points: i32) -> ScoreChange {
    let tentative = current.saturating_add(points);
    if check_penalty_rule(tentative) {
        ScoreChange {
            total: PENALTY_RESET_SCORE,
            delta: PENALTY_RESET_SCORE - current,
            penalized: true,
        }
    } else {
        ScoreChange {
            total: tentative,
            delta: points,
            penalized: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: PlayerId, eliminated: bool) -> Player {
        Player {
            id,
            game_id: 1,
            name: format!("player-{id}"),
            current_score: 0,
            consecutive_misses: 0,
            is_eliminated: eliminated,
            created_at: 0,
        }
    }

    #[test]
    fn penalty_starts_strictly_above_fifty() {
        for score in 0..=50 {
            assert!(!check_penalty_rule(score));
        }
        for score in 51..=62 {
            assert!(check_penalty_rule(score));
        }
        assert!(!check_penalty_rule(50.0));
        assert!(check_penalty_rule(50.0001));
    }

    #[test]
    fn elimination_after_three_misses() {
        assert!(!check_elimination(0));
        assert!(!check_elimination(2));
        assert!(check_elimination(3));
        assert!(check_elimination(7));
    }

    #[test]
    fn win_requires_exactly_fifty() {
        assert!(check_win_condition(50));
        assert!(!check_win_condition(49));
        assert!(!check_win_condition(51));
        assert!(!check_win_condition(49.9999));
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(calculate_score(&[], EntryType::SingleBlock), 0);
        assert_eq!(calculate_score(&[], EntryType::MultipleBlocks), 0);
    }

    #[test]
    fn single_block_takes_first_valid_value() {
        assert_eq!(calculate_score(&[12.0], EntryType::SingleBlock), 12);
        assert_eq!(
            calculate_score(&[12.0, 15.0, 20.0], EntryType::SingleBlock),
            12
        );
        assert_eq!(
            calculate_score(&[-1.0, -2.0, 5.0], EntryType::SingleBlock),
            5
        );
        assert_eq!(
            calculate_score(&[-1.0, -2.0, f64::NAN], EntryType::SingleBlock),
            0
        );
        assert_eq!(calculate_score(&[0.0, 7.0], EntryType::SingleBlock), 7);
    }

    #[test]
    fn multiple_blocks_counts_valid_entries() {
        assert_eq!(
            calculate_score(&[5.0, 10.0, 15.0], EntryType::MultipleBlocks),
            3
        );
        assert_eq!(
            calculate_score(&[0.0, 0.0, 0.0], EntryType::MultipleBlocks),
            3
        );
        assert_eq!(
            calculate_score(&[1.0, f64::INFINITY, -3.0], EntryType::MultipleBlocks),
            1
        );
    }

    #[test]
    fn calculate_score_leaves_input_untouched() {
        let blocks = vec![-1.0, 4.0, 9.0];
        let before = blocks.clone();
        calculate_score(&blocks, EntryType::SingleBlock);
        calculate_score(&blocks, EntryType::MultipleBlocks);
        assert_eq!(blocks.len(), before.len());
        assert_eq!(blocks, before);
    }

    #[test]
    fn round_completion_needs_every_player_accounted_for() {
        assert!(!check_round_completion(&[], &BTreeSet::new()));
        assert!(!check_round_completion(&[], &BTreeSet::from([1])));

        let players = vec![player(1, false), player(2, false)];
        let mut scored = BTreeSet::from([1]);
        assert!(!check_round_completion(&players, &scored));
        scored.insert(2);
        assert!(check_round_completion(&players, &scored));

        let players = vec![player(1, false), player(2, true)];
        assert!(check_round_completion(&players, &BTreeSet::from([1])));
    }

    #[test]
    fn overshoot_resets_to_twenty_five() {
        let change = apply_points(0, 55);
        assert_eq!(change.total, 25);
        assert_eq!(change.delta, 25);
        assert!(change.penalized);

        let change = apply_points(48, 5);
        assert_eq!(change.total, 25);
        assert_eq!(change.delta, -23);

        let change = apply_points(38, 12);
        assert_eq!(change.total, 50);
        assert_eq!(change.delta, 12);
        assert!(!change.penalized);
    }
}
