use crate::clock::Countdown;
use crate::rng::RollStream;
use crate::types::DiceModifier;
use std::collections::HashSet;

// Dice-augmented variant. Only players with a correct answer this round may
// roll; a roll resolves either when the player stops it or when the server's
// deadline passes. The client always reports the raw face value. The one-shot
// modifier is consumed when the roll resolves and transforms the value for
// display only; the score that counts is whatever the server echoes back in
// score_update.

#[derive(Debug)]
pub struct DiceState {
    eligible: HashSet<String>,
    roll_deadline: Countdown,
    stream: Option<RollStream>,
    modifier: Option<DiceModifier>,
    last_face: Option<u8>,
    last_display: Option<i64>,
    resolved: bool,
}

impl DiceState {
    pub fn new() -> Self {
        Self {
            eligible: HashSet::new(),
            roll_deadline: Countdown::idle(),
            stream: None,
            modifier: None,
            last_face: None,
            last_display: None,
            resolved: false,
        }
    }

    /// Arm a modifier chosen earlier in the match. A second selection
    /// replaces an unused one; a consumed modifier is gone for good.
    pub fn select_modifier(&mut self, modifier: DiceModifier) {
        self.modifier = Some(modifier);
    }

    pub fn modifier(&self) -> Option<DiceModifier> {
        self.modifier
    }

    pub fn is_eligible(&self, connection_id: &str) -> bool {
        self.eligible.contains(connection_id)
    }

    pub fn last_face(&self) -> Option<u8> {
        self.last_face
    }

    /// Advisory display value for the latest roll, with the one-shot modifier
    /// already applied. The submitted face stays raw either way.
    pub fn display_value(&self) -> Option<i64> {
        self.last_display
    }

    /// Begin a roll window for the given round.
    pub fn roll_start(
        &mut self,
        room_code: &str,
        question_index: u32,
        deadline_epoch_ms: u64,
        eligible: Vec<String>,
    ) {
        self.eligible = eligible.into_iter().collect();
        self.roll_deadline = Countdown::until(deadline_epoch_ms);
        self.stream = Some(RollStream::new(room_code, question_index));
        self.last_face = None;
        self.last_display = None;
        self.resolved = false;
    }

    /// User-stopped roll. Returns the raw face to submit, or None when the
    /// player is not eligible or the roll already resolved.
    pub fn stop_roll(&mut self, connection_id: &str) -> Option<u8> {
        if self.resolved || !self.is_eligible(connection_id) {
            return None;
        }
        self.resolve()
    }

    /// Deadline-driven resolution, called from the tick loop. Returns the
    /// auto-rolled face once the server deadline has passed.
    pub fn auto_resolve(&mut self, connection_id: &str, now_ms: u64) -> Option<u8> {
        if self.resolved || !self.is_eligible(connection_id) {
            return None;
        }
        if !self.roll_deadline.expired(now_ms) {
            return None;
        }
        self.resolve()
    }

    fn resolve(&mut self) -> Option<u8> {
        let face = self.stream.as_mut()?.next_face();
        self.last_face = Some(face);
        self.last_display = Some(self.apply_modifier(face));
        self.resolved = true;
        Some(face)
    }

    fn apply_modifier(&mut self, face: u8) -> i64 {
        let face = i64::from(face);
        match self.modifier.take() {
            Some(DiceModifier::ForceMax) => i64::from(crate::constants::DICE_FACES),
            Some(DiceModifier::Add(n)) => face + n,
            Some(DiceModifier::Mul(n)) => face * n,
            None => face,
        }
    }
}

impl Default for DiceState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DICE_FACES;

    fn rolling_state() -> DiceState {
        let mut state = DiceState::new();
        state.roll_start("room-9", 2, 50_000, vec!["me".into(), "p2".into()]);
        state
    }

    #[test]
    fn ineligible_player_cannot_roll() {
        let mut state = rolling_state();
        assert_eq!(state.stop_roll("p3"), None);
    }

    #[test]
    fn roll_resolves_once_per_round() {
        let mut state = rolling_state();
        let face = state.stop_roll("me").unwrap();
        assert!((1..=DICE_FACES).contains(&face));
        assert_eq!(state.stop_roll("me"), None);
        assert_eq!(state.auto_resolve("me", 60_000), None);
    }

    #[test]
    fn auto_resolve_waits_for_the_deadline() {
        let mut state = rolling_state();
        assert_eq!(state.auto_resolve("me", 49_999), None);
        let face = state.auto_resolve("me", 50_000).unwrap();
        assert!((1..=DICE_FACES).contains(&face));
    }

    #[test]
    fn modifier_changes_display_value_not_submitted_face() {
        let mut state = rolling_state();
        state.select_modifier(DiceModifier::Mul(3));
        let face = state.stop_roll("me").unwrap();
        assert_eq!(state.display_value(), Some(i64::from(face) * 3));
        assert_eq!(state.modifier(), None, "modifier is consumed at resolve");
        // One-shot: the next round shows the raw face again.
        state.roll_start("room-9", 3, 80_000, vec!["me".into()]);
        assert_eq!(state.display_value(), None);
        let next = state.stop_roll("me").unwrap();
        assert_eq!(state.display_value(), Some(i64::from(next)));
    }

    #[test]
    fn force_max_displays_the_top_face() {
        let mut state = rolling_state();
        state.select_modifier(DiceModifier::ForceMax);
        state.stop_roll("me").unwrap();
        assert_eq!(state.display_value(), Some(i64::from(DICE_FACES)));
    }

    #[test]
    fn next_round_rolls_again() {
        let mut state = rolling_state();
        state.stop_roll("me").unwrap();
        state.roll_start("room-9", 3, 80_000, vec!["me".into()]);
        assert!(state.stop_roll("me").is_some());
    }
}
