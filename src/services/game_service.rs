//! Session lifecycle: starting, pausing, resuming games and managing rounds.

use tracing::{info, warn};
use validator::Validate;

use crate::{
    dao::models::{GameUpdate, PlayerUpdate},
    dto::game::{AddPlayerRequest, GameView},
    error::ServiceError,
    services::undo_service,
    state::{
        GameAction, GameState, SharedState,
        game::{Game, GameId, GameStatus, Player},
    },
};

/// Require a current game in `active` status.
pub(crate) fn require_active_game(snapshot: &GameState) -> Result<&Game, ServiceError> {
    match &snapshot.game {
        Some(game) if game.status == GameStatus::Active => Ok(game),
        Some(game) => Err(ServiceError::InvalidState(format!(
            "game {} is {}, not active",
            game.id, game.status
        ))),
        None => Err(ServiceError::InvalidState("no game in progress".into())),
    }
}

/// Start a fresh game, retiring any game that was left live.
pub async fn start_game(state: &SharedState) -> Result<Game, ServiceError> {
    let _gate = state.lock_mutations().await;
    let store = state.store();

    if let Some(previous) = store.find_resumable_game().await? {
        store
            .update_game(previous.id, GameUpdate::status(GameStatus::NotCompleted))
            .await?;
        info!(game_id = previous.id, from = %previous.status, "superseded live game");
    }

    let game: Game = store.create_game().await?.into();
    state.session().dispatch(GameAction::StartGame(game.clone()));
    info!(game_id = game.id, "game started");
    Ok(game)
}

/// Register a player in the current game.
pub async fn add_player(
    state: &SharedState,
    request: AddPlayerRequest,
) -> Result<Player, ServiceError> {
    request.validate()?;
    let name = request.name.trim().to_owned();

    let _gate = state.lock_mutations().await;
    let snapshot = state.session().snapshot();
    let game_id = require_active_game(&snapshot)?.id;

    if snapshot
        .players
        .iter()
        .any(|player| player.name.eq_ignore_ascii_case(&name))
    {
        return Err(ServiceError::Validation(format!(
            "A player named `{name}` is already in this game"
        )));
    }

    let player: Player = state.store().add_player(game_id, name).await?.into();
    state.session().dispatch(GameAction::AddPlayer(player.clone()));
    info!(game_id, player_id = player.id, name = %player.name, "player added");
    Ok(player)
}

/// Persist the current game as paused and leave the session.
///
/// Round progress is not persisted, so the session store is reset and a
/// later resume starts again at round 1.
pub async fn pause_game(state: &SharedState) -> Result<Game, ServiceError> {
    let _gate = state.lock_mutations().await;
    let snapshot = state.session().snapshot();
    let game_id = require_active_game(&snapshot)?.id;

    let paused: Game = state
        .store()
        .update_game(game_id, GameUpdate::status(GameStatus::Paused))
        .await?
        .into();
    state.session().dispatch(GameAction::ResetGame);
    info!(game_id, round = snapshot.current_round, "game paused");
    Ok(paused)
}

/// Give up on the current game: it is stored as `notcompleted` and the
/// session is cleared.
pub async fn abandon_game(state: &SharedState) -> Result<Game, ServiceError> {
    let _gate = state.lock_mutations().await;
    let snapshot = state.session().snapshot();
    let Some(game) = snapshot.game.as_ref().filter(|game| game.status.is_live()) else {
        return Err(ServiceError::InvalidState("no live game to abandon".into()));
    };

    let abandoned: Game = state
        .store()
        .update_game(game.id, GameUpdate::status(GameStatus::NotCompleted))
        .await?
        .into();
    state.session().dispatch(GameAction::ResetGame);
    info!(game_id = game.id, round = snapshot.current_round, "game abandoned");
    Ok(abandoned)
}

/// Resume the most recent game that is still active or paused.
pub async fn resume_latest_game(state: &SharedState) -> Result<GameState, ServiceError> {
    let Some(game) = state.store().find_resumable_game().await? else {
        return Err(ServiceError::NotFound("there is no game to resume".into()));
    };
    resume_game(state, game.id).await
}

/// Load a live game and its roster into the session store.
pub async fn resume_game(state: &SharedState, id: GameId) -> Result<GameState, ServiceError> {
    let _gate = state.lock_mutations().await;
    let store = state.store();

    let Some(game) = store.get_game(id).await? else {
        return Err(ServiceError::NotFound(format!("game `{id}` not found")));
    };
    if !game.status.is_live() {
        return Err(ServiceError::InvalidState(format!(
            "game `{id}` is {} and cannot be resumed",
            game.status
        )));
    }

    let game = if game.status == GameStatus::Paused {
        store
            .update_game(id, GameUpdate::status(GameStatus::Active))
            .await?
    } else {
        game
    };

    let players = store
        .get_players_for_game(id)
        .await?
        .into_iter()
        .map(Player::from)
        .collect::<Vec<_>>();
    if players.is_empty() {
        warn!(game_id = id, "resuming a game without players");
    }

    let next = state.session().dispatch(GameAction::ResumeGame {
        game: game.into(),
        players,
    });
    info!(game_id = id, players = next.players.len(), "game resumed");
    Ok(next)
}

/// Close the current round and open the next one.
///
/// Miss streaks and eliminations do not carry over, so the durable rows are
/// cleared before the session store moves on.
pub async fn start_new_round(state: &SharedState) -> Result<GameState, ServiceError> {
    let _gate = state.lock_mutations().await;
    let snapshot = state.session().snapshot();
    let game_id = require_active_game(&snapshot)?.id;

    for player in &snapshot.players {
        if player.consecutive_misses == 0 && !player.is_eliminated {
            continue;
        }
        state
            .store()
            .update_player(
                player.id,
                PlayerUpdate {
                    consecutive_misses: Some(0),
                    is_eliminated: Some(false),
                    ..PlayerUpdate::default()
                },
            )
            .await?;
    }

    let next = state.session().dispatch(GameAction::StartNewRound);
    info!(game_id, round = next.current_round, "new round started");
    Ok(next)
}

/// Drop the in-memory session without touching storage.
pub async fn reset(state: &SharedState) -> GameState {
    let _gate = state.lock_mutations().await;
    state.session().dispatch(GameAction::ResetGame)
}

/// Scoreboard view of the current session.
pub async fn current_view(state: &SharedState) -> Result<GameView, ServiceError> {
    let snapshot = state.session().snapshot();
    let can_undo = match &snapshot.game {
        Some(game) => {
            undo_service::can_undo(
                state.store().as_ref(),
                game.id,
                snapshot.current_round,
                game.status,
            )
            .await?
        }
        None => false,
    };
    Ok(GameView::from_state(&snapshot, can_undo))
}

#[cfg(all(test, feature = "sqlite-store"))]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, services::test_support::test_state};

    fn named(name: &str) -> AddPlayerRequest {
        AddPlayerRequest { name: name.into() }
    }

    #[tokio::test]
    async fn start_game_opens_round_one() {
        let state = test_state().await;
        let game = start_game(&state).await.unwrap();

        let snapshot = state.session().snapshot();
        assert_eq!(snapshot.game, Some(game.clone()));
        assert_eq!(snapshot.current_round, 1);
        assert_eq!(game.status, GameStatus::Active);
    }

    #[tokio::test]
    async fn players_are_trimmed_and_unique() {
        let state = test_state().await;
        start_game(&state).await.unwrap();

        let aino = add_player(&state, named("  Aino ")).await.unwrap();
        assert_eq!(aino.name, "Aino");

        let err = add_player(&state, named("aino")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = add_player(&state, named("")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(state.session().snapshot().players.len(), 1);
    }

    #[tokio::test]
    async fn adding_players_requires_a_game() {
        let state = test_state().await;
        let err = add_player(&state, named("Aino")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn pause_then_resume_restores_roster() {
        let state = test_state().await;
        let game = start_game(&state).await.unwrap();
        add_player(&state, named("Aino")).await.unwrap();
        add_player(&state, named("Bea")).await.unwrap();

        let paused = pause_game(&state).await.unwrap();
        assert_eq!(paused.status, GameStatus::Paused);
        assert!(state.session().snapshot().game.is_none());

        let resumed = resume_latest_game(&state).await.unwrap();
        let resumed_game = resumed.game.unwrap();
        assert_eq!(resumed_game.id, game.id);
        assert_eq!(resumed_game.status, GameStatus::Active);
        assert_eq!(resumed.players.len(), 2);
        assert_eq!(resumed.current_round, 1);
    }

    #[tokio::test]
    async fn new_game_supersedes_paused_one() {
        let state = test_state().await;
        let first = start_game(&state).await.unwrap();
        pause_game(&state).await.unwrap();

        let second = start_game(&state).await.unwrap();
        let retired = state.store().get_game(first.id).await.unwrap().unwrap();
        assert_eq!(retired.status, GameStatus::NotCompleted);

        let err = resume_game(&state, first.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(state.session().snapshot().game.unwrap().id, second.id);
    }

    #[tokio::test]
    async fn abandoned_game_cannot_be_resumed() {
        let state = test_state().await;
        let game = start_game(&state).await.unwrap();

        let abandoned = abandon_game(&state).await.unwrap();
        assert_eq!(abandoned.status, GameStatus::NotCompleted);
        assert!(state.session().snapshot().game.is_none());

        let err = resume_game(&state, game.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        let err = abandon_game(&state).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn resume_without_games_is_not_found() {
        let state = test_state().await;
        let err = resume_latest_game(&state).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn view_reflects_session() {
        let state = test_state().await;
        assert_eq!(current_view(&state).await.unwrap().game, None);

        start_game(&state).await.unwrap();
        add_player(&state, named("Aino")).await.unwrap();
        let view = current_view(&state).await.unwrap();
        assert_eq!(view.players.len(), 1);
        assert!(!view.can_undo);
        assert!(!view.round_complete);
    }
}
