//! Pure transition function for the scoring session.
//!
//! [`apply`] never mutates its input: every transition clones the previous
//! snapshot, so snapshots handed out earlier stay valid for diffing.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    rules,
    state::{
        actions::GameAction,
        game::{Game, GameStatus, Player, PlayerId},
    },
};

/// In-memory session snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameState {
    /// Game being played, if any.
    pub game: Option<Game>,
    /// Roster in insertion order.
    pub players: Vec<Player>,
    /// Round counter, starting at 1.
    pub current_round: u32,
    /// Players who recorded a scoring throw this round.
    pub scored_this_round: BTreeSet<PlayerId>,
    /// Single non-eliminated player with the strictly highest score.
    pub leader: Option<PlayerId>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            game: None,
            players: Vec::new(),
            current_round: 1,
            scored_this_round: BTreeSet::new(),
            leader: None,
        }
    }
}

impl GameState {
    /// Look up a roster entry.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    /// Whether every player has scored or been eliminated this round.
    pub fn round_complete(&self) -> bool {
        rules::check_round_completion(&self.players, &self.scored_this_round)
    }

    fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    fn refresh_leader(mut self) -> Self {
        self.leader = compute_leader(&self.players);
        self
    }
}

/// Non-eliminated player holding the strictly highest score.
///
/// A tie for first place yields no leader.
pub fn compute_leader(players: &[Player]) -> Option<PlayerId> {
    let mut leader: Option<&Player> = None;
    let mut tied = false;

    for player in players.iter().filter(|player| !player.is_eliminated) {
        match leader {
            Some(best) if player.current_score == best.current_score => tied = true,
            Some(best) if player.current_score < best.current_score => {}
            _ => {
                leader = Some(player);
                tied = false;
            }
        }
    }

    if tied { None } else { leader.map(|player| player.id) }
}

/// Compute the snapshot that follows `state` once `action` is applied.
pub fn apply(state: &GameState, action: GameAction) -> GameState {
    let mut next = state.clone();

    match action {
        GameAction::StartGame(game) => GameState {
            game: Some(game),
            ..GameState::default()
        },
        GameAction::AddPlayer(player) => {
            next.players.push(player);
            next.refresh_leader()
        }
        GameAction::AddScore { player_id, score } => {
            let Some(player) = next.player_mut(player_id) else {
                return next;
            };
            player.current_score += score;
            player.consecutive_misses = 0;
            player.is_eliminated = false;
            next.scored_this_round.insert(player_id);
            next.refresh_leader()
        }
        GameAction::ApplyPenalty {
            player_id,
            penalty_delta,
        } => {
            if let Some(player) = next.player_mut(player_id) {
                player.current_score += penalty_delta;
            }
            next.refresh_leader()
        }
        GameAction::EliminatePlayer(player_id) => {
            if let Some(player) = next.player_mut(player_id) {
                player.is_eliminated = true;
            }
            next.refresh_leader()
        }
        GameAction::UpdatePlayer(updated) => {
            if let Some(player) = next.player_mut(updated.id) {
                *player = updated;
            }
            next.refresh_leader()
        }
        GameAction::CompleteGame { winner, at } => {
            if let Some(game) = next.game.as_mut() {
                game.status = GameStatus::Completed;
                game.updated_at = at;
            }
            next.leader = winner;
            next
        }
        GameAction::ResumeGame { game, players } => GameState {
            game: Some(game),
            players: players
                .into_iter()
                .map(|player| Player {
                    is_eliminated: false,
                    ..player
                })
                .collect(),
            ..GameState::default()
        }
        .refresh_leader(),
        GameAction::StartNewRound => {
            for player in &mut next.players {
                player.is_eliminated = false;
                player.consecutive_misses = 0;
            }
            next.current_round += 1;
            next.scored_this_round = BTreeSet::new();
            next.refresh_leader()
        }
        GameAction::UndoLastScore {
            player_id,
            prev_score,
            prev_misses,
            prev_eliminated,
            game_was_completed,
        } => {
            if let Some(player) = next.player_mut(player_id) {
                player.current_score = prev_score;
                player.consecutive_misses = prev_misses;
                player.is_eliminated = prev_eliminated;
            }
            next.scored_this_round.remove(&player_id);
            if game_was_completed {
                if let Some(game) = next.game.as_mut() {
                    game.status = GameStatus::Active;
                }
            }
            next.refresh_leader()
        }
        GameAction::ResetGame => GameState::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> Game {
        Game {
            id: 7,
            status: GameStatus::Active,
            created_at: 100,
            updated_at: 100,
        }
    }

    fn player(id: PlayerId, name: &str) -> Player {
        Player {
            id,
            game_id: 7,
            name: name.into(),
            current_score: 0,
            consecutive_misses: 0,
            is_eliminated: false,
            created_at: 100,
        }
    }

    fn started_with(players: &[Player]) -> GameState {
        players.iter().cloned().fold(
            apply(&GameState::default(), GameAction::StartGame(game())),
            |state, player| apply(&state, GameAction::AddPlayer(player)),
        )
    }

    fn score(state: &GameState, player_id: PlayerId, score: i32) -> GameState {
        apply(state, GameAction::AddScore { player_id, score })
    }

    #[test]
    fn start_game_resets_session() {
        let mut state = started_with(&[player(1, "Aino")]);
        state.current_round = 4;
        state.scored_this_round.insert(1);

        let next = apply(&state, GameAction::StartGame(game()));
        assert_eq!(next.game, Some(game()));
        assert!(next.players.is_empty());
        assert_eq!(next.current_round, 1);
        assert!(next.scored_this_round.is_empty());
        assert_eq!(next.leader, None);
    }

    #[test]
    fn transitions_leave_previous_snapshot_untouched() {
        let before = started_with(&[player(1, "Aino"), player(2, "Bea")]);
        let after = score(&before, 1, 9);

        assert_eq!(before.players[0].current_score, 0);
        assert!(before.scored_this_round.is_empty());
        assert_eq!(after.players[0].current_score, 9);
        assert!(after.scored_this_round.contains(&1));
    }

    #[test]
    fn add_score_clears_misses_and_elimination() {
        let mut state = started_with(&[player(1, "Aino")]);
        state.players[0].consecutive_misses = 2;
        state = apply(&state, GameAction::EliminatePlayer(1));
        assert!(state.players[0].is_eliminated);

        let next = score(&state, 1, 4);
        let aino = next.player(1).unwrap();
        assert_eq!(aino.current_score, 4);
        assert_eq!(aino.consecutive_misses, 0);
        assert!(!aino.is_eliminated);
    }

    #[test]
    fn add_score_for_unknown_player_is_a_no_op() {
        let state = started_with(&[player(1, "Aino")]);
        assert_eq!(score(&state, 99, 4), state);
    }

    #[test]
    fn tie_for_first_has_no_leader() {
        let state = started_with(&[player(1, "Aino"), player(2, "Bea")]);
        assert_eq!(state.leader, None);

        let state = score(&state, 1, 10);
        assert_eq!(state.leader, Some(1));

        let state = score(&state, 2, 10);
        assert_eq!(state.leader, None);
    }

    #[test]
    fn eliminated_player_cannot_lead() {
        let state = started_with(&[player(1, "Aino"), player(2, "Bea"), player(3, "Cai")]);
        let state = score(&state, 1, 30);
        let state = score(&state, 2, 12);
        let state = score(&state, 3, 8);
        assert_eq!(state.leader, Some(1));

        let state = apply(&state, GameAction::EliminatePlayer(1));
        assert_eq!(state.leader, Some(2));
    }

    #[test]
    fn penalty_delta_brings_score_to_twenty_five() {
        let state = score(&started_with(&[player(1, "Aino")]), 1, 48);
        let state = apply(
            &state,
            GameAction::ApplyPenalty {
                player_id: 1,
                penalty_delta: -23,
            },
        );
        assert_eq!(state.player(1).unwrap().current_score, 25);
    }

    #[test]
    fn update_player_replaces_record() {
        let state = started_with(&[player(1, "Aino"), player(2, "Bea")]);
        let replacement = Player {
            current_score: 17,
            consecutive_misses: 1,
            ..player(2, "Bea")
        };
        let state = apply(&state, GameAction::UpdatePlayer(replacement.clone()));
        assert_eq!(state.player(2), Some(&replacement));
        assert_eq!(state.leader, Some(2));
    }

    #[test]
    fn complete_game_sets_winner_as_leader() {
        let state = score(&started_with(&[player(1, "Aino")]), 1, 50);
        let state = apply(
            &state,
            GameAction::CompleteGame {
                winner: Some(1),
                at: 500,
            },
        );
        let game = state.game.unwrap();
        assert_eq!(game.status, GameStatus::Completed);
        assert_eq!(game.updated_at, 500);
        assert_eq!(state.leader, Some(1));
    }

    #[test]
    fn resume_drops_round_scoped_state() {
        let stored = vec![
            Player {
                current_score: 20,
                is_eliminated: true,
                ..player(1, "Aino")
            },
            Player {
                current_score: 11,
                ..player(2, "Bea")
            },
        ];
        let mut state = started_with(&[player(9, "Old")]);
        state.current_round = 6;
        state.scored_this_round.insert(9);

        let state = apply(
            &state,
            GameAction::ResumeGame {
                game: game(),
                players: stored,
            },
        );
        assert!(state.players.iter().all(|player| !player.is_eliminated));
        assert_eq!(state.current_round, 1);
        assert!(state.scored_this_round.is_empty());
        assert_eq!(state.leader, Some(1));
    }

    #[test]
    fn new_round_clears_eliminations() {
        let mut state = started_with(&[player(1, "Aino"), player(2, "Bea")]);
        state.players[1].consecutive_misses = 3;
        let state = score(&state, 1, 6);
        let state = apply(&state, GameAction::EliminatePlayer(2));
        assert!(state.round_complete());

        let state = apply(&state, GameAction::StartNewRound);
        assert_eq!(state.current_round, 2);
        assert!(state.scored_this_round.is_empty());
        assert!(state.players.iter().all(|player| !player.is_eliminated));
        assert!(state.players.iter().all(|player| player.consecutive_misses == 0));
        assert!(!state.round_complete());
    }

    #[test]
    fn undo_restores_player_and_reopens_game() {
        let state = score(&started_with(&[player(1, "Aino")]), 1, 10);
        let state = score(&state, 1, 40);
        let state = apply(
            &state,
            GameAction::CompleteGame {
                winner: Some(1),
                at: 200,
            },
        );

        let state = apply(
            &state,
            GameAction::UndoLastScore {
                player_id: 1,
                prev_score: 10,
                prev_misses: 0,
                prev_eliminated: false,
                game_was_completed: true,
            },
        );
        assert_eq!(state.player(1).unwrap().current_score, 10);
        assert!(!state.scored_this_round.contains(&1));
        assert_eq!(state.game.unwrap().status, GameStatus::Active);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let state = score(&started_with(&[player(1, "Aino")]), 1, 10);
        assert_eq!(apply(&state, GameAction::ResetGame), GameState::default());
    }
}
