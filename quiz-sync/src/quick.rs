use crate::constants::QUICK_ROUND_BUDGET;
use crate::rank::{bonus_for, ranks_by_desc};
use crate::types::AnswerVerdict;
use std::collections::HashMap;

// Speed variant: a fixed round budget with short per-round deadlines. Ranking
// is by total correct-answer count, not raw score; ties share a rank and
// forfeit, last place forfeits, all through the shared bonus table.

#[derive(Debug, Clone)]
pub struct QuickState {
    correct_counts: HashMap<String, u32>,
    rounds_played: u32,
}

impl QuickState {
    pub fn new(connection_ids: &[String]) -> Self {
        let correct_counts = connection_ids.iter().map(|id| (id.clone(), 0)).collect();
        Self {
            correct_counts,
            rounds_played: 0,
        }
    }

    pub fn apply_round(&mut self, results: &[AnswerVerdict]) {
        if self.finished() {
            return;
        }
        for verdict in results {
            if verdict.is_correct {
                *self
                    .correct_counts
                    .entry(verdict.connection_id.clone())
                    .or_insert(0) += 1;
            }
        }
        self.rounds_played += 1;
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    pub fn correct_count(&self, connection_id: &str) -> u32 {
        self.correct_counts.get(connection_id).copied().unwrap_or(0)
    }

    pub fn finished(&self) -> bool {
        self.rounds_played >= QUICK_ROUND_BUDGET
    }

    pub fn final_ranks(&self) -> Vec<(String, usize)> {
        let entries: Vec<(String, i64)> = self
            .correct_counts
            .iter()
            .map(|(id, count)| (id.clone(), i64::from(*count)))
            .collect();
        ranks_by_desc(&entries)
    }

    pub fn bonus(&self, connection_id: &str) -> i64 {
        bonus_for(&self.final_ranks(), connection_id)
    }
}
