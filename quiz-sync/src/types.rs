use crate::constants::AWARD_STORE_PREFIX;
use serde::{Deserialize, Serialize};

// Shared data types for match sessions, round phases, and reward records. These
// are kept lean so the coordinator can own the mutation logic elsewhere.

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum GameType {
    Survival,
    Dice,
    Team,
    Mind,
    Quick,
}

impl GameType {
    pub const ALL: [GameType; 5] = [
        GameType::Survival,
        GameType::Dice,
        GameType::Team,
        GameType::Mind,
        GameType::Quick,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GameType::Survival => "survival",
            GameType::Dice => "dice",
            GameType::Team => "team",
            GameType::Mind => "mind",
            GameType::Quick => "quick",
        }
    }

    /// Durable-store key for this variant's pending award. Namespaced per
    /// variant so different-mode matches on the same device do not collide.
    pub fn storage_key(&self) -> String {
        format!("{}:{}", AWARD_STORE_PREFIX, self.label())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Participant {
    pub connection_id: String,
    pub display_name: String,
    pub score: i64,
    /// Mirrored from the authoritative survival state; stays zero in other
    /// modes.
    pub lives: u32,
}

impl Participant {
    pub fn new(connection_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            display_name: display_name.into(),
            score: 0,
            lives: 0,
        }
    }
}

/// One multiplayer room. Exactly one is active per client; creating a new one
/// invalidates all in-flight phase state from the prior one.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct MatchSession {
    pub room_code: String,
    pub game_type: GameType,
    pub participants: Vec<Participant>,
    pub start_epoch_ms: Option<u64>,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Phase {
    Question,
    Result,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct AnswerVerdict {
    pub connection_id: String,
    pub is_correct: bool,
}

/// Transient per-round state, rebuilt on every question_start. The generation
/// tag ties it to the session epoch it was created under.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct QuestionPhase {
    pub phase: Phase,
    pub deadline_epoch_ms: Option<u64>,
    pub question_index: u32,
    pub has_answered: bool,
    pub results: Vec<AnswerVerdict>,
    pub generation: u64,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum VoteChoice {
    A,
    B,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum DiceModifier {
    ForceMax,
    Add(i64),
    Mul(i64),
}

/// One participant's slot draw in the representative-ordering step. The value
/// is server-issued; the commitment lets clients verify it after the fact.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SlotDraw {
    pub connection_id: String,
    pub value: u64,
    pub salt: String,
    pub commitment: String,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct LevelChange {
    pub old_level: u32,
    pub new_level: u32,
}

/// Bonus components of a payout, kept separate so audit entries can name them.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct AwardBreakdown {
    pub base_points: i64,
    pub placement_bonus: i64,
    pub stage_bonus: i64,
    pub score_bonus: i64,
}

impl AwardBreakdown {
    pub fn total(&self) -> i64 {
        self.base_points + self.placement_bonus + self.stage_bonus + self.score_bonus
    }
}

/// A durably persisted, not-yet-confirmed reward-credit intent. Immutable once
/// written; deleted only after the ledger confirms the credit.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct PendingAward {
    pub room_code: String,
    pub game_type: GameType,
    pub points: i64,
    pub exp: i64,
    pub correct_count: u32,
    pub finished_at_index: u32,
    pub breakdown: AwardBreakdown,
    pub created_at_ms: u64,
}

impl PendingAward {
    pub fn is_empty(&self) -> bool {
        self.points == 0 && self.exp == 0
    }
}
