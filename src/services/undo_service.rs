//! Reversal of the most recent throw of the current round.
//!
//! The ledger only records raw throw values, so the pre-throw player state is
//! reconstructed rather than replayed. Two pieces of information cannot be
//! recovered exactly:
//!
//! * A player sitting at 25 whose undone throw would have pushed them past 50
//!   is assumed to have been reset by the overshoot penalty, even if they
//!   reached 25 some other way.
//! * Undoing a scoring throw always restores a miss streak of 0.

use tracing::{info, warn};

use crate::{
    dao::{
        models::{GameUpdate, PlayerUpdate, ScoreEntryEntity},
        score_store::ScoreStore,
    },
    dto::score::UndoOutcome,
    error::ServiceError,
    rules::{PENALTY_RESET_SCORE, WINNING_SCORE},
    state::{
        GameAction, SharedState,
        game::{GameId, GameStatus, Player},
    },
};

/// Player fields as they were before a ledger entry was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconstructed {
    /// Score before the throw.
    pub score: i32,
    /// Miss streak before the throw.
    pub consecutive_misses: u32,
    /// Whether the throw was treated as having triggered the overshoot reset.
    pub penalty_reversed: bool,
}

/// Work out the player's state before `entry` was recorded.
pub fn reconstruct(entry: &ScoreEntryEntity, player: &Player) -> Reconstructed {
    let value = entry.score_value;
    let penalty_reversed =
        player.current_score == PENALTY_RESET_SCORE && value + PENALTY_RESET_SCORE > WINNING_SCORE;

    let score = if penalty_reversed {
        PENALTY_RESET_SCORE + value
    } else {
        player.current_score - value
    };
    let consecutive_misses = if value == 0 {
        player.consecutive_misses.saturating_sub(1)
    } else {
        0
    };

    Reconstructed {
        score,
        consecutive_misses,
        penalty_reversed,
    }
}

/// Whether the undo control should be offered.
pub async fn can_undo(
    store: &dyn ScoreStore,
    game_id: GameId,
    round: u32,
    status: GameStatus,
) -> Result<bool, ServiceError> {
    if status != GameStatus::Active {
        return Ok(false);
    }
    Ok(store
        .get_last_score_entry_for_round(game_id, round)
        .await?
        .is_some())
}

/// Reverse the last ledger entry of the current round.
///
/// A completed game is accepted as well so the winning throw can be taken
/// back; doing so reopens the game.
pub async fn undo(state: &SharedState) -> Result<UndoOutcome, ServiceError> {
    let _gate = state.lock_mutations().await;
    let snapshot = state.session().snapshot();
    let Some(game) = snapshot.game.as_ref() else {
        return Err(ServiceError::InvalidState("no game in progress".into()));
    };
    if !matches!(game.status, GameStatus::Active | GameStatus::Completed) {
        return Err(ServiceError::InvalidState(format!(
            "game {} is {}, nothing can be undone",
            game.id, game.status
        )));
    }
    let round = snapshot.current_round;
    let store = state.store();

    let Some(entry) = store.get_last_score_entry_for_round(game.id, round).await? else {
        return Err(ServiceError::Consistency(format!(
            "nothing to undo in round {round}"
        )));
    };
    let Some(player) = snapshot.player(entry.player_id) else {
        warn!(
            game_id = game.id,
            entry_id = entry.id,
            player_id = entry.player_id,
            "ledger entry points at a player missing from the roster"
        );
        return Err(ServiceError::Consistency(format!(
            "player `{}` not found",
            entry.player_id
        )));
    };

    let previous = reconstruct(&entry, player);
    let game_was_completed = game.status == GameStatus::Completed;

    store.delete_score_entry(entry.id).await?;
    store
        .update_player(
            player.id,
            PlayerUpdate {
                current_score: Some(previous.score),
                consecutive_misses: Some(previous.consecutive_misses),
                is_eliminated: Some(false),
            },
        )
        .await?;
    if game_was_completed {
        store
            .update_game(game.id, GameUpdate::status(GameStatus::Active))
            .await?;
    }

    state.session().dispatch(GameAction::UndoLastScore {
        player_id: player.id,
        prev_score: previous.score,
        prev_misses: previous.consecutive_misses,
        prev_eliminated: false,
        game_was_completed,
    });
    info!(
        game_id = game.id,
        entry_id = entry.id,
        player_id = player.id,
        restored_score = previous.score,
        penalty_reversed = previous.penalty_reversed,
        game_was_completed,
        "last throw undone"
    );

    Ok(UndoOutcome {
        entry_id: entry.id,
        player_id: player.id,
        restored_score: previous.score,
        restored_misses: previous.consecutive_misses,
        penalty_reversed: previous.penalty_reversed,
        game_reopened: game_was_completed,
    })
}
