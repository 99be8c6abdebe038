//! Read-only views over the ledger and past games.

use futures::future::try_join_all;
use indexmap::IndexMap;

use crate::{
    dto::{game::GameHistoryItem, score::ScoreEntrySummary},
    error::ServiceError,
    state::SharedState,
};

/// Ledger entries of a round of the current game, oldest first.
///
/// Defaults to the round in progress when `round` is `None`.
pub async fn round_entries(
    state: &SharedState,
    round: Option<u32>,
) -> Result<Vec<ScoreEntrySummary>, ServiceError> {
    let snapshot = state.session().snapshot();
    let Some(game) = snapshot.game.as_ref() else {
        return Err(ServiceError::InvalidState("no game in progress".into()));
    };
    let round = round.unwrap_or(snapshot.current_round);

    let entries = state
        .store()
        .get_score_entries_by_round(game.id, round)
        .await?;
    Ok(entries.into_iter().map(Into::into).collect())
}

/// Every stored game with its final standings, newest first.
pub async fn game_history(state: &SharedState) -> Result<Vec<GameHistoryItem>, ServiceError> {
    let store = state.store();
    let games = store.list_games().await?;

    let rosters = try_join_all(
        games
            .iter()
            .map(|game| store.get_players_for_game(game.id)),
    )
    .await?;
    let rosters = games
        .iter()
        .map(|game| game.id)
        .zip(rosters)
        .collect::<IndexMap<_, _>>();

    Ok(GameHistoryItem::collect(games, rosters))
}
