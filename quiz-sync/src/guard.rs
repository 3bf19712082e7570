use std::collections::HashSet;

// Local dedup of answer intent: at most one outbound answer per
// (room, question-index) pair, no matter how many UI paths race to submit.
// Delivery is the transport's problem; this only suppresses duplicates.

#[derive(Debug, Default)]
pub struct SubmitGuard {
    sent: HashSet<String>,
}

impl SubmitGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(room_code: &str, question_index: u32) -> String {
        format!("{}:{}", room_code, question_index)
    }

    /// Returns true if the caller may send, false if an identical submission
    /// was already recorded.
    pub fn try_submit(&mut self, room_code: &str, question_index: u32) -> bool {
        self.sent.insert(Self::key(room_code, question_index))
    }

    pub fn has_submitted(&self, room_code: &str, question_index: u32) -> bool {
        self.sent.contains(&Self::key(room_code, question_index))
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}
