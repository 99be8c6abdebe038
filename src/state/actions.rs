use crate::state::game::{Game, Player, PlayerId};

/// Every mutation the session store understands.
///
/// The reducer matches on this enum without a wildcard arm, so adding a
/// variant fails to compile until it is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameAction {
    /// A fresh game becomes current with an empty roster.
    StartGame(Game),
    /// Append a player to the roster.
    AddPlayer(Player),
    /// A scoring throw; `score` is the delta actually applied.
    AddScore {
        /// Player who threw.
        player_id: PlayerId,
        /// Effective delta, already corrected by the overshoot penalty.
        score: i32,
    },
    /// Signed correction bringing a score back to 25.
    ApplyPenalty {
        /// Player being corrected.
        player_id: PlayerId,
        /// Signed delta to add to the current score.
        penalty_delta: i32,
    },
    /// Knock a player out for the rest of the round.
    EliminatePlayer(PlayerId),
    /// Replace a player record wholesale.
    UpdatePlayer(Player),
    /// The game was won (or closed without a winner).
    CompleteGame {
        /// Winning player, if any.
        winner: Option<PlayerId>,
        /// Completion timestamp (epoch seconds).
        at: i64,
    },
    /// Load a persisted game and its roster.
    ResumeGame {
        /// Game record as stored.
        game: Game,
        /// Roster as stored.
        players: Vec<Player>,
    },
    /// Close the round and open the next one.
    StartNewRound,
    /// Restore a player to the state reconstructed from the ledger.
    UndoLastScore {
        /// Player whose last entry was removed.
        player_id: PlayerId,
        /// Score before the removed entry.
        prev_score: i32,
        /// Consecutive misses before the removed entry.
        prev_misses: u32,
        /// Elimination flag before the removed entry.
        prev_eliminated: bool,
        /// Whether the removed entry had completed the game.
        game_was_completed: bool,
    },
    /// Back to the initial empty state.
    ResetGame,
}

impl GameAction {
    /// Short label used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            GameAction::StartGame(_) => "start_game",
            GameAction::AddPlayer(_) => "add_player",
            GameAction::AddScore { .. } => "add_score",
            GameAction::ApplyPenalty { .. } => "apply_penalty",
            GameAction::EliminatePlayer(_) => "eliminate_player",
            GameAction::UpdatePlayer(_) => "update_player",
            GameAction::CompleteGame { .. } => "complete_game",
            GameAction::ResumeGame { .. } => "resume_game",
            GameAction::StartNewRound => "start_new_round",
            GameAction::UndoLastScore { .. } => "undo_last_score",
            GameAction::ResetGame => "reset_game",
        }
    }
}
