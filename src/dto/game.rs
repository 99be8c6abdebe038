use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{GameEntity, PlayerEntity},
    dto::{format_epoch_seconds, validation::{field_error, validate_player_name}},
    state::{
        GameState,
        game::{Game, GameId, GameStatus, Player, PlayerId},
    },
};

/// Payload used to register a player in the current game.
#[derive(Debug, Clone, Deserialize)]
pub struct AddPlayerRequest {
    /// Display name; surrounding whitespace is trimmed.
    pub name: String,
}

impl Validate for AddPlayerRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_player_name(&self.name).map_err(|err| field_error("name", err))
    }
}

/// Game header exposed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    /// Game id.
    pub id: GameId,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Creation time (RFC 3339).
    pub created_at: String,
    /// Last status change (RFC 3339).
    pub updated_at: String,
}

impl From<&Game> for GameSummary {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id,
            status: game.status,
            created_at: format_epoch_seconds(game.created_at),
            updated_at: format_epoch_seconds(game.updated_at),
        }
    }
}

/// Public projection of a player on the scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSummary {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Score so far.
    pub current_score: i32,
    /// Misses in a row.
    pub consecutive_misses: u32,
    /// Out for the rest of the round.
    pub is_eliminated: bool,
    /// Already scored this round.
    pub scored_this_round: bool,
    /// Sole leader of the game.
    pub is_leader: bool,
}

/// Whole-scoreboard view rendered after every dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameView {
    /// Current game, if any.
    pub game: Option<GameSummary>,
    /// Roster in join order.
    pub players: Vec<PlayerSummary>,
    /// Sole leader; `None` on a tie.
    pub leader: Option<PlayerId>,
    /// Round in progress, starting at 1.
    pub current_round: u32,
    /// Players who scored this round.
    pub scored_this_round: Vec<PlayerId>,
    /// Everyone has scored or is eliminated.
    pub round_complete: bool,
    /// The undo control should be offered.
    pub can_undo: bool,
}

impl GameView {
    /// Project a session snapshot; `can_undo` comes from the ledger.
    pub fn from_state(state: &GameState, can_undo: bool) -> Self {
        let players = state
            .players
            .iter()
            .map(|player: &Player| PlayerSummary {
                id: player.id,
                name: player.name.clone(),
                current_score: player.current_score,
                consecutive_misses: player.consecutive_misses,
                is_eliminated: player.is_eliminated,
                scored_this_round: state.scored_this_round.contains(&player.id),
                is_leader: state.leader == Some(player.id),
            })
            .collect();

        Self {
            game: state.game.as_ref().map(Into::into),
            players,
            leader: state.leader,
            current_round: state.current_round,
            scored_this_round: state.scored_this_round.iter().copied().collect(),
            round_complete: state.round_complete(),
            can_undo,
        }
    }
}

/// Final standing of one player in a past game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerStanding {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Final (or latest) score.
    pub score: i32,
}

/// Entry of the game history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameHistoryItem {
    /// Game id.
    pub id: GameId,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Creation time (RFC 3339).
    pub created_at: String,
    /// Last status change (RFC 3339).
    pub updated_at: String,
    /// Standings in join order.
    pub players: Vec<PlayerStanding>,
    /// Player who reached 50, for completed games.
    pub winner: Option<PlayerId>,
}

impl GameHistoryItem {
    /// Assemble history rows from games (newest first) and their rosters.
    pub fn collect(
        games: Vec<GameEntity>,
        mut rosters: IndexMap<GameId, Vec<PlayerEntity>>,
    ) -> Vec<Self> {
        games
            .into_iter()
            .map(|game| {
                let players = rosters.shift_remove(&game.id).unwrap_or_default();
                let winner = (game.status == GameStatus::Completed)
                    .then(|| {
                        players
                            .iter()
                            .find(|player| crate::rules::check_win_condition(player.current_score))
                            .map(|player| player.id)
                    })
                    .flatten();
                Self {
                    id: game.id,
                    status: game.status,
                    created_at: format_epoch_seconds(game.created_at),
                    updated_at: format_epoch_seconds(game.updated_at),
                    players: players
                        .into_iter()
                        .map(|player| PlayerStanding {
                            id: player.id,
                            name: player.name,
                            score: player.current_score,
                        })
                        .collect(),
                    winner,
                }
            })
            .collect()
    }
}
