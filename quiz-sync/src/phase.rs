use crate::clock::Countdown;
use crate::types::{AnswerVerdict, Phase, QuestionPhase};

// Server-gated question/result state machine. Transitions happen only in
// response to inbound events; the generation token invalidates anything still
// in flight from before a reset (new match, rematch, leave).

#[derive(Debug, Default)]
pub struct PhaseMachine {
    generation: u64,
    current: Option<QuestionPhase>,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a captured generation still refers to the live session epoch.
    /// Deferred callbacks check this and no-op when it fails.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Invalidate all in-flight round state. Every timer callback or late
    /// packet tagged with an earlier generation becomes a no-op.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.current = None;
    }

    /// Enter the question phase for a new round. Returns the generation the
    /// round belongs to, for the caller to attach to deferred work.
    pub fn question_start(&mut self, deadline_epoch_ms: u64, question_index: u32) -> u64 {
        self.current = Some(QuestionPhase {
            phase: Phase::Question,
            deadline_epoch_ms: Some(deadline_epoch_ms),
            question_index,
            has_answered: false,
            results: Vec::new(),
            generation: self.generation,
        });
        self.generation
    }

    /// Enter the result phase, recording the round's verdicts. Returns true
    /// only for the first Question -> Result transition of the round; a
    /// duplicate delivery overwrites the stored verdicts but reports false so
    /// callers do not re-apply scoring. A result tagged with a stale
    /// generation is discarded outright rather than merged; this is what
    /// keeps a late packet from an abandoned round out of the next match's
    /// state.
    pub fn answer_result(&mut self, generation: u64, results: Vec<AnswerVerdict>) -> bool {
        if !self.is_current(generation) {
            log::debug!(
                "dropping stale answer_result (generation {} != {})",
                generation,
                self.generation
            );
            return false;
        }
        match self.current.as_mut() {
            Some(round) => {
                let first_delivery = round.phase != Phase::Result;
                round.phase = Phase::Result;
                round.results = results;
                first_delivery
            }
            None => {
                // No question_start was seen for this epoch; stay waiting
                // rather than synthesizing a phase.
                log::debug!("answer_result with no open round, ignoring");
                false
            }
        }
    }

    pub fn mark_answered(&mut self) {
        if let Some(round) = self.current.as_mut() {
            round.has_answered = true;
        }
    }

    /// can_answer holds iff the round is in the question phase, the epoch
    /// deadline has not passed, and no answer was sent yet. Always an epoch
    /// comparison, never an elapsed-time counter.
    pub fn can_answer(&self, now_ms: u64) -> bool {
        match &self.current {
            Some(round) => {
                round.phase == Phase::Question
                    && !round.has_answered
                    && matches!(round.deadline_epoch_ms, Some(deadline) if now_ms < deadline)
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<&QuestionPhase> {
        self.current.as_ref()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.current.as_ref().map(|round| round.phase)
    }

    pub fn question_index(&self) -> Option<u32> {
        self.current.as_ref().map(|round| round.question_index)
    }

    pub fn countdown(&self) -> Countdown {
        match self.current.as_ref().and_then(|round| round.deadline_epoch_ms) {
            Some(deadline) => Countdown::until(deadline),
            None => Countdown::idle(),
        }
    }
}
