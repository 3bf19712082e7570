use crate::award::AwardState;
use crate::types::{DiceModifier, GameType, Participant, Phase, VoteChoice};

// Lightweight container for UI sync. One snapshot per tick carries everything
// a renderer needs; it never exposes mutable handles into the coordinator.

#[derive(Clone, Debug, PartialEq)]
pub enum VariantView {
    Survival {
        groups: Vec<Vec<String>>,
        my_lives: u32,
    },
    Dice {
        last_face: Option<u8>,
        display_value: Option<i64>,
        modifier: Option<DiceModifier>,
        eligible: bool,
    },
    Team {
        my_vote: Option<VoteChoice>,
        decided: Option<VoteChoice>,
        cleared_stages: u32,
        failed: bool,
    },
    Mind {
        representative: Option<String>,
        my_score: i64,
    },
    Quick {
        rounds_played: u32,
        my_correct: u32,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MatchSnapshot {
    pub room_code: Option<String>,
    pub game_type: Option<GameType>,
    pub phase: Option<Phase>,
    pub question_index: Option<u32>,
    pub remaining_seconds: u64,
    pub can_answer: bool,
    pub participants: Vec<Participant>,
    pub award_state: AwardState,
    pub variant: Option<VariantView>,
}
