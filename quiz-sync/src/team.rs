use crate::constants::TEAM_STAGE_BUDGET;
use crate::types::VoteChoice;

// Majority/team-consensus variant. Every participant votes A/B, but the
// team's committed answer is never computed locally; it is authoritative only
// once the server emits its decision (majority vote, random tie-break). One
// wrong team answer ends the match. Correct answers advance the shared
// cleared-stage counter that feeds the payout tier.

#[derive(Debug, Clone, Default)]
pub struct TeamState {
    my_vote: Option<VoteChoice>,
    decided: Option<VoteChoice>,
    cleared_stages: u32,
    failed: bool,
}

impl TeamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local echo of the player's own vote, for highlighting only.
    pub fn record_vote(&mut self, choice: VoteChoice) {
        self.my_vote = Some(choice);
    }

    pub fn my_vote(&self) -> Option<VoteChoice> {
        self.my_vote
    }

    pub fn decided(&self) -> Option<VoteChoice> {
        self.decided
    }

    pub fn cleared_stages(&self) -> u32 {
        self.cleared_stages
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn finished(&self) -> bool {
        self.failed || self.cleared_stages >= TEAM_STAGE_BUDGET
    }

    /// Apply the server's committed team answer for the current round.
    pub fn apply_decided(&mut self, choice: VoteChoice, is_correct: bool) {
        if self.finished() {
            return;
        }
        self.decided = Some(choice);
        self.my_vote = None;
        if is_correct {
            self.cleared_stages += 1;
        } else {
            self.failed = true;
        }
    }

    /// Payout tier for the stages the team cleared together.
    pub fn stage_bonus(&self) -> i64 {
        match self.cleared_stages {
            0 => 0,
            1..=2 => 20,
            3..=5 => 60,
            6..=9 => 120,
            _ => 200,
        }
    }
}
