use crate::constants::MIND_GUESS_POINTS;
use crate::crypto::slot_commitment;
use crate::rank::{bonus_for, ranks_by_desc};
use crate::types::{AnswerVerdict, SlotDraw, VoteChoice};
use std::collections::HashMap;

// Psychological-prediction variant. One rotating representative answers
// privately each round; everyone else guesses that choice. The rotation order
// comes from a server-confirmed slot draw (highest value goes first), which
// the client verifies against the per-participant commitments before trusting
// it. Payout is rank-based on accumulated correct-guess score, through the
// shared placement table.

#[derive(Debug, Clone, Default)]
pub struct MindState {
    order: Vec<SlotDraw>,
    round: u32,
    guess_scores: HashMap<String, i64>,
    my_private_choice: Option<VoteChoice>,
    finished: bool,
}

impl MindState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept the server's representative ordering after verifying that the
    /// values are sorted highest-first and each commitment matches its
    /// revealed value.
    pub fn apply_order(&mut self, order: Vec<SlotDraw>) -> Result<(), String> {
        if order.is_empty() {
            return Err("representative order is empty".into());
        }
        for window in order.windows(2) {
            if window[0].value < window[1].value {
                return Err("representative order is not sorted by slot value".into());
            }
        }
        for draw in &order {
            if slot_commitment(draw.value, &draw.salt) != draw.commitment {
                return Err(format!(
                    "slot commitment mismatch for {}",
                    draw.connection_id
                ));
            }
        }
        for draw in &order {
            self.guess_scores.entry(draw.connection_id.clone()).or_insert(0);
        }
        self.order = order;
        Ok(())
    }

    /// The representative for the current round; rotation is one full pass
    /// through the confirmed order.
    pub fn representative(&self) -> Option<&str> {
        if self.order.is_empty() {
            return None;
        }
        let index = (self.round as usize) % self.order.len();
        Some(self.order[index].connection_id.as_str())
    }

    /// Local echo of this player's private choice while representative.
    pub fn record_private_choice(&mut self, choice: VoteChoice) {
        self.my_private_choice = Some(choice);
    }

    pub fn my_private_choice(&self) -> Option<VoteChoice> {
        self.my_private_choice
    }

    /// Apply a round's verdicts: is_correct means the guesser predicted the
    /// representative's choice. The representative earns nothing for their
    /// own round.
    pub fn apply_round(&mut self, results: &[AnswerVerdict]) {
        if self.finished || self.order.is_empty() {
            return;
        }
        let representative = self.representative().map(str::to_string);
        for verdict in results {
            if Some(verdict.connection_id.as_str()) == representative.as_deref() {
                continue;
            }
            if verdict.is_correct {
                *self
                    .guess_scores
                    .entry(verdict.connection_id.clone())
                    .or_insert(0) += MIND_GUESS_POINTS;
            }
        }
        self.my_private_choice = None;
        self.round += 1;
        if self.round as usize >= self.order.len() {
            self.finished = true;
        }
    }

    /// Whether any round has been scored against the confirmed order. Once
    /// true, a late or redelivered order event must not replace the rotation.
    pub fn rotation_started(&self) -> bool {
        self.round > 0 || self.finished
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn score(&self, connection_id: &str) -> i64 {
        self.guess_scores.get(connection_id).copied().unwrap_or(0)
    }

    pub fn final_ranks(&self) -> Vec<(String, usize)> {
        let entries: Vec<(String, i64)> = self
            .guess_scores
            .iter()
            .map(|(id, score)| (id.clone(), *score))
            .collect();
        ranks_by_desc(&entries)
    }

    pub fn bonus(&self, connection_id: &str) -> i64 {
        bonus_for(&self.final_ranks(), connection_id)
    }
}
