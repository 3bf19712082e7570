// Countdown reconciliation against a server-issued epoch deadline. The
// remaining time is recomputed from wall clock on every tick, never
// decremented, so a backgrounded tab self-corrects on the next tick.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Countdown {
    deadline_epoch_ms: Option<u64>,
}

impl Countdown {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn until(deadline_epoch_ms: u64) -> Self {
        Self {
            deadline_epoch_ms: Some(deadline_epoch_ms),
        }
    }

    pub fn arm(&mut self, deadline_epoch_ms: u64) {
        self.deadline_epoch_ms = Some(deadline_epoch_ms);
    }

    pub fn clear(&mut self) {
        self.deadline_epoch_ms = None;
    }

    pub fn deadline_epoch_ms(&self) -> Option<u64> {
        self.deadline_epoch_ms
    }

    /// Seconds left until the deadline, rounded up, clamped at zero. Pure in
    /// the supplied wall-clock time.
    pub fn remaining_seconds(&self, now_ms: u64) -> u64 {
        match self.deadline_epoch_ms {
            Some(deadline) if deadline > now_ms => (deadline - now_ms).div_ceil(1000),
            _ => 0,
        }
    }

    pub fn expired(&self, now_ms: u64) -> bool {
        matches!(self.deadline_epoch_ms, Some(deadline) if now_ms >= deadline)
    }
}
