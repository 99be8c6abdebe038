use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::ScoreEntryEntity,
    dto::{format_epoch_seconds, validation::field_error},
    state::game::{EntryId, EntryType, PlayerId},
};

/// Raw throw submitted from the score modal.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitScoreRequest {
    /// Player who threw.
    pub player_id: PlayerId,
    /// Block numbers separated by spaces or commas; a lone `0` records a miss.
    pub input: String,
    /// How the blocks are counted.
    pub entry_type: EntryType,
}

impl Validate for SubmitScoreRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        if self.input.trim().is_empty() {
            let mut err = ValidationError::new("score_empty");
            err.message = Some("Enter the number of the knocked-down block, or 0 for a miss".into());
            return Err(field_error("input", err));
        }
        Ok(())
    }
}

/// What a successful submission did. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScoreOutcome {
    /// Points were added.
    Scored {
        /// Player who threw.
        player_id: PlayerId,
        /// Raw points of the throw.
        points: i32,
        /// Score after the throw.
        new_score: i32,
    },
    /// The throw overshot 50 and the player went back to 25.
    PenaltyReset {
        /// Player who threw.
        player_id: PlayerId,
        /// Raw points of the throw.
        points: i32,
        /// Signed change actually applied to the score.
        delta: i32,
        /// Score after the throw.
        new_score: i32,
    },
    /// Nothing fell.
    Missed {
        /// Player who threw.
        player_id: PlayerId,
        /// Misses in a row, this one included.
        consecutive_misses: u32,
    },
    /// Third miss in a row: out for the round.
    Eliminated {
        /// Player who threw.
        player_id: PlayerId,
        /// Misses in a row, this one included.
        consecutive_misses: u32,
    },
    /// Exactly 50: the game is over.
    Won {
        /// Player who reached 50.
        player_id: PlayerId,
        /// Raw points of the winning throw.
        points: i32,
    },
}

impl ScoreOutcome {
    /// Player the outcome is about.
    pub fn player_id(&self) -> PlayerId {
        match self {
            ScoreOutcome::Scored { player_id, .. }
            | ScoreOutcome::PenaltyReset { player_id, .. }
            | ScoreOutcome::Missed { player_id, .. }
            | ScoreOutcome::Eliminated { player_id, .. }
            | ScoreOutcome::Won { player_id, .. } => *player_id,
        }
    }
}

/// Result of reversing the last ledger entry of a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndoOutcome {
    /// Ledger entry that was removed.
    pub entry_id: EntryId,
    /// Player who was restored.
    pub player_id: PlayerId,
    /// Score after the undo.
    pub restored_score: i32,
    /// Miss streak after the undo.
    pub restored_misses: u32,
    /// The entry was assumed to have triggered the overshoot reset.
    pub penalty_reversed: bool,
    /// The game went from completed back to active.
    pub game_reopened: bool,
}

/// Ledger row as shown in the round audit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreEntrySummary {
    /// Ledger entry id.
    pub id: EntryId,
    /// Player who threw.
    pub player_id: PlayerId,
    /// Raw points of the throw.
    pub score_value: i32,
    /// How the throw was recorded.
    pub entry_type: EntryType,
    /// Round the throw happened in.
    pub round_number: u32,
    /// Nothing fell.
    pub is_miss: bool,
    /// Time of the throw (RFC 3339).
    pub created_at: String,
}

impl From<ScoreEntryEntity> for ScoreEntrySummary {
    fn from(entry: ScoreEntryEntity) -> Self {
        Self {
            id: entry.id,
            player_id: entry.player_id,
            score_value: entry.score_value,
            entry_type: entry.entry_type,
            round_number: entry.round_number,
            is_miss: entry.score_value == 0,
            created_at: format_epoch_seconds(entry.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_serialize_with_tag() {
        let json = serde_json::to_value(ScoreOutcome::PenaltyReset {
            player_id: 3,
            points: 55,
            delta: 25,
            new_score: 25,
        })
        .unwrap();
        assert_eq!(json["outcome"], "penalty_reset");
        assert_eq!(json["new_score"], 25);
    }

    #[test]
    fn blank_submission_fails_validation() {
        let request = SubmitScoreRequest {
            player_id: 1,
            input: " \t".into(),
            entry_type: EntryType::SingleBlock,
        };
        assert!(request.validate().is_err());
    }
}
