//! Score submission: validate, decide with the rule engine, persist, dispatch.

use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    dao::models::{GameUpdate, NewScoreEntry, PlayerUpdate},
    dto::{
        score::{ScoreOutcome, SubmitScoreRequest},
        validation::{InputLimits, ParsedThrow, field_error, parse_throw},
    },
    error::ServiceError,
    rules,
    services::game_service::require_active_game,
    state::{
        GameAction, SharedState,
        game::{EntryType, Game, GameStatus, Player},
    },
};

/// Record one throw for a player.
///
/// Input and eligibility are checked before anything else, so a rejected
/// submission leaves storage, the session and the debounce window untouched.
/// Every write is awaited before the session store is updated.
pub async fn submit_score(
    state: &SharedState,
    request: SubmitScoreRequest,
) -> Result<ScoreOutcome, ServiceError> {
    request.validate()?;
    let limits = InputLimits {
        max_block_number: state.config().max_block_number,
        max_blocks_per_throw: state.config().max_blocks_per_throw,
    };
    let throw = parse_throw(&request.input, request.entry_type, limits).map_err(|err| {
        debug!(player_id = request.player_id, input = %request.input, "rejected score input");
        ServiceError::from(field_error("input", err))
    })?;

    let _gate = state.lock_mutations().await;
    let snapshot = state.session().snapshot();
    let game = require_active_game(&snapshot)?.clone();
    let Some(player) = snapshot.player(request.player_id).cloned() else {
        return Err(ServiceError::NotFound(format!(
            "player `{}` is not part of this game",
            request.player_id
        )));
    };
    if player.is_eliminated {
        return Err(ServiceError::InvalidState(format!(
            "{} is eliminated until the next round",
            player.name
        )));
    }
    if snapshot.scored_this_round.contains(&player.id) {
        return Err(ServiceError::InvalidState(format!(
            "{} has already scored this round",
            player.name
        )));
    }

    if let Err(err) = state.check_submission_debounce().await {
        warn!(player_id = player.id, "debounced score submission");
        return Err(err);
    }

    if throw.is_miss() {
        record_miss(state, &game, player, snapshot.current_round, request.entry_type).await
    } else {
        record_hit(
            state,
            &game,
            player,
            snapshot.current_round,
            request.entry_type,
            &throw,
        )
        .await
    }
}

async fn record_miss(
    state: &SharedState,
    game: &Game,
    player: Player,
    round: u32,
    entry_type: EntryType,
) -> Result<ScoreOutcome, ServiceError> {
    let consecutive_misses = player.consecutive_misses + 1;

    state
        .store()
        .insert_score_entry(NewScoreEntry {
            player_id: player.id,
            game_id: game.id,
            score_value: 0,
            entry_type,
            round_number: round,
        })
        .await?;
    state
        .store()
        .update_player(
            player.id,
            PlayerUpdate {
                consecutive_misses: Some(consecutive_misses),
                ..PlayerUpdate::default()
            },
        )
        .await?;

    let player_id = player.id;
    state.session().dispatch(GameAction::UpdatePlayer(Player {
        consecutive_misses,
        ..player
    }));

    if rules::check_elimination(consecutive_misses) {
        state
            .session()
            .dispatch(GameAction::EliminatePlayer(player_id));
        info!(game_id = game.id, player_id, round, "player eliminated for the round");
        return Ok(ScoreOutcome::Eliminated {
            player_id,
            consecutive_misses,
        });
    }

    debug!(game_id = game.id, player_id, consecutive_misses, "miss recorded");
    Ok(ScoreOutcome::Missed {
        player_id,
        consecutive_misses,
    })
}

async fn record_hit(
    state: &SharedState,
    game: &Game,
    player: Player,
    round: u32,
    entry_type: EntryType,
    throw: &ParsedThrow,
) -> Result<ScoreOutcome, ServiceError> {
    let points = rules::calculate_score(&throw.as_values(), entry_type);
    let change = rules::apply_points(player.current_score, points);

    state
        .store()
        .insert_score_entry(NewScoreEntry {
            player_id: player.id,
            game_id: game.id,
            score_value: points,
            entry_type,
            round_number: round,
        })
        .await?;
    state
        .store()
        .update_player(
            player.id,
            PlayerUpdate {
                current_score: Some(change.total),
                consecutive_misses: Some(0),
                is_eliminated: Some(false),
            },
        )
        .await?;

    state.session().dispatch(GameAction::AddScore {
        player_id: player.id,
        score: change.delta,
    });
    debug!(
        game_id = game.id,
        player_id = player.id,
        round,
        points,
        delta = change.delta,
        total = change.total,
        "score recorded"
    );

    if rules::check_win_condition(change.total) {
        let completed = state
            .store()
            .update_game(game.id, GameUpdate::status(GameStatus::Completed))
            .await?;
        state.session().dispatch(GameAction::CompleteGame {
            winner: Some(player.id),
            at: completed.updated_at,
        });
        info!(game_id = game.id, player_id = player.id, "game won");
        return Ok(ScoreOutcome::Won {
            player_id: player.id,
            points,
        });
    }

    if change.penalized {
        info!(
            game_id = game.id,
            player_id = player.id,
            points,
            "overshot 50; score reset to 25"
        );
        return Ok(ScoreOutcome::PenaltyReset {
            player_id: player.id,
            points,
            delta: change.delta,
            new_score: change.total,
        });
    }

    Ok(ScoreOutcome::Scored {
        player_id: player.id,
        points,
        new_score: change.total,
    })
}
