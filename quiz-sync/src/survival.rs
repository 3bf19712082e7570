use crate::constants::SURVIVAL_STARTING_LIVES;
use crate::rank::{bonus_for, ranks_from_groups};
use crate::types::AnswerVerdict;
use std::collections::HashMap;

// Elimination/lives variant. Lives drop on authoritative wrong verdicts;
// players reaching zero in the same round form one elimination group. Groups
// are kept in elimination order (earliest first) and the survivors are
// appended as the final group when the match resolves.

#[derive(Debug, Clone)]
pub struct SurvivalState {
    lives: HashMap<String, u32>,
    groups: Vec<Vec<String>>,
    finished: bool,
}

impl SurvivalState {
    pub fn new(connection_ids: &[String]) -> Self {
        let lives = connection_ids
            .iter()
            .map(|id| (id.clone(), SURVIVAL_STARTING_LIVES))
            .collect();
        Self {
            lives,
            groups: Vec::new(),
            finished: false,
        }
    }

    pub fn lives(&self, connection_id: &str) -> u32 {
        self.lives.get(connection_id).copied().unwrap_or(0)
    }

    pub fn groups(&self) -> &[Vec<String>] {
        &self.groups
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    fn is_eliminated(&self, connection_id: &str) -> bool {
        self.groups.iter().any(|g| g.iter().any(|id| id == connection_id))
    }

    /// Apply a round's verdicts. Everyone who answered wrong loses a life;
    /// all players hitting zero this round are eliminated as one group.
    pub fn apply_round(&mut self, results: &[AnswerVerdict]) {
        if self.finished {
            return;
        }
        let mut newly_out = Vec::new();
        for verdict in results {
            if verdict.is_correct || self.is_eliminated(&verdict.connection_id) {
                continue;
            }
            if let Some(lives) = self.lives.get_mut(&verdict.connection_id) {
                *lives = lives.saturating_sub(1);
                if *lives == 0 {
                    newly_out.push(verdict.connection_id.clone());
                }
            }
        }
        if !newly_out.is_empty() {
            newly_out.sort();
            self.groups.push(newly_out);
        }
        self.check_finished();
    }

    /// Overwrite the group list with the server's authoritative view. The
    /// local prediction from apply_round is display-only; this is what feeds
    /// payout.
    pub fn apply_elimination_update(&mut self, groups: Vec<Vec<String>>) {
        self.groups = groups;
        self.check_finished();
    }

    fn survivors(&self) -> Vec<String> {
        let mut alive: Vec<String> = self
            .lives
            .keys()
            .filter(|id| !self.is_eliminated(id))
            .cloned()
            .collect();
        alive.sort();
        alive
    }

    fn check_finished(&mut self) {
        if self.finished {
            return;
        }
        let survivors = self.survivors();
        if survivors.len() <= 1 {
            if !survivors.is_empty() {
                self.groups.push(survivors);
            }
            self.finished = true;
        }
    }

    pub fn final_ranks(&self) -> Vec<(String, usize)> {
        ranks_from_groups(&self.groups)
    }

    pub fn bonus(&self, connection_id: &str) -> i64 {
        bonus_for(&self.final_ranks(), connection_id)
    }
}
