use crate::award::{AwardState, Notice, RewardEngine};
use crate::constants::{DICE_ROUND_BUDGET, EXP_PER_CORRECT, POINTS_PER_CORRECT};
use crate::dice::DiceState;
use crate::guard::SubmitGuard;
use crate::mind::MindState;
use crate::net::{ClientMessage, ServerEvent};
use crate::phase::PhaseMachine;
use crate::quick::QuickState;
use crate::snapshot::{MatchSnapshot, VariantView};
use crate::survival::SurvivalState;
use crate::team::TeamState;
use crate::types::{
    AwardBreakdown, DiceModifier, GameType, MatchSession, Participant, PendingAward, VoteChoice,
};

// Match coordinator: the one owner of session, phase, and variant state.
// Every inbound server event funnels through apply(); every player intent
// goes through an explicit method that queues a typed outbound message. Page
// modules read snapshots instead of wiring their own listeners.

pub enum VariantState {
    Survival(SurvivalState),
    Dice(DiceState),
    Team(TeamState),
    Mind(MindState),
    Quick(QuickState),
}

impl VariantState {
    fn new_for(game_type: GameType, participants: &[Participant]) -> Self {
        let ids: Vec<String> = participants
            .iter()
            .map(|p| p.connection_id.clone())
            .collect();
        match game_type {
            GameType::Survival => VariantState::Survival(SurvivalState::new(&ids)),
            GameType::Dice => VariantState::Dice(DiceState::new()),
            GameType::Team => VariantState::Team(TeamState::new()),
            GameType::Mind => VariantState::Mind(MindState::new()),
            GameType::Quick => VariantState::Quick(QuickState::new(&ids)),
        }
    }
}

pub struct MatchClient {
    me: String,
    session: Option<MatchSession>,
    phase: PhaseMachine,
    guard: SubmitGuard,
    round_gen: u64,
    variant: Option<VariantState>,
    outbound: Vec<ClientMessage>,
    award: RewardEngine,
    settled: bool,
    my_correct: u32,
    dice_rounds: u32,
}

impl MatchClient {
    pub fn new(connection_id: impl Into<String>, award: RewardEngine) -> Self {
        Self {
            me: connection_id.into(),
            session: None,
            phase: PhaseMachine::new(),
            guard: SubmitGuard::new(),
            round_gen: 0,
            variant: None,
            outbound: Vec::new(),
            award,
            settled: false,
            my_correct: 0,
            dice_rounds: 0,
        }
    }

    pub fn connection_id(&self) -> &str {
        &self.me
    }

    pub fn session(&self) -> Option<&MatchSession> {
        self.session.as_ref()
    }

    pub fn award_state(&self) -> AwardState {
        self.award.state()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.award.take_notices()
    }

    pub fn drain_outbound(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outbound)
    }

    /// Enter a room. Invalidates everything from the previous session.
    pub fn join(&mut self, room_code: String, game_type: GameType, participants: Vec<Participant>) {
        self.phase.reset();
        self.guard.clear();
        self.variant = Some(VariantState::new_for(game_type, &participants));
        self.session = Some(MatchSession {
            room_code,
            game_type,
            participants,
            start_epoch_ms: None,
        });
        self.settled = false;
        self.my_correct = 0;
        self.dice_rounds = 0;
        self.sync_lives();
    }

    pub fn leave(&mut self) {
        self.phase.reset();
        self.guard.clear();
        self.session = None;
        self.variant = None;
    }

    /// Single dispatch point for inbound server events.
    pub fn apply(&mut self, event: ServerEvent, now_ms: u64) -> Result<(), String> {
        if self.session.is_none() {
            return Err("no active session".into());
        }
        match event {
            ServerEvent::QuestionStart {
                deadline_epoch_ms,
                question_index,
            } => {
                self.round_gen = self.phase.question_start(deadline_epoch_ms, question_index);
                Ok(())
            }
            ServerEvent::AnswerResult { results } => {
                if !self.phase.answer_result(self.round_gen, results.clone()) {
                    // Stale, duplicate, or out-of-round result; scoring for
                    // this round either already ran or never will.
                    return Ok(());
                }
                if results
                    .iter()
                    .any(|v| v.connection_id == self.me && v.is_correct)
                {
                    self.my_correct += 1;
                }
                match self.variant.as_mut() {
                    Some(VariantState::Survival(survival)) => survival.apply_round(&results),
                    Some(VariantState::Mind(mind)) => mind.apply_round(&results),
                    Some(VariantState::Quick(quick)) => quick.apply_round(&results),
                    Some(VariantState::Dice(_)) => self.dice_rounds += 1,
                    Some(VariantState::Team(_)) | None => {}
                }
                self.sync_lives();
                self.finish_if_done(now_ms);
                Ok(())
            }
            ServerEvent::ScoreUpdate {
                connection_id,
                score,
                extra: _,
            } => {
                if let Some(session) = self.session.as_mut() {
                    if let Some(participant) = session
                        .participants
                        .iter_mut()
                        .find(|p| p.connection_id == connection_id)
                    {
                        participant.score = score;
                    }
                }
                Ok(())
            }
            ServerEvent::TeamAnswerDecided { choice, is_correct } => {
                if self.phase.current().is_none() {
                    // The round this decision belongs to was invalidated by a
                    // reset; it must not touch the fresh match.
                    log::debug!("team_answer_decided with no open round, ignoring");
                    return Ok(());
                }
                match self.variant.as_mut() {
                    Some(VariantState::Team(team)) => {
                        team.apply_decided(choice, is_correct);
                        self.finish_if_done(now_ms);
                    }
                    _ => log::debug!("team_answer_decided outside team mode, ignoring"),
                }
                Ok(())
            }
            ServerEvent::RepresentativeOrder { order } => match self.variant.as_mut() {
                Some(VariantState::Mind(mind)) => {
                    if mind.rotation_started() {
                        // A late redelivery must not replace the order the
                        // rotation is already scoring against.
                        log::debug!("representative_order after rotation began, ignoring");
                        Ok(())
                    } else {
                        mind.apply_order(order)
                    }
                }
                _ => {
                    log::debug!("representative_order outside mind mode, ignoring");
                    Ok(())
                }
            },
            ServerEvent::EliminationUpdate { groups } => {
                if self.phase.current().is_none() {
                    log::debug!("elimination_update with no open round, ignoring");
                    return Ok(());
                }
                match self.variant.as_mut() {
                    Some(VariantState::Survival(survival)) => {
                        survival.apply_elimination_update(groups);
                        self.sync_lives();
                        self.finish_if_done(now_ms);
                    }
                    _ => log::debug!("elimination_update outside survival mode, ignoring"),
                }
                Ok(())
            }
            ServerEvent::DiceRollStart {
                deadline_epoch_ms,
                eligible,
            } => {
                if self.phase.current().is_none() {
                    log::debug!("dice_roll_start with no open round, ignoring");
                    return Ok(());
                }
                let room_code = self
                    .session
                    .as_ref()
                    .map(|s| s.room_code.clone())
                    .unwrap_or_default();
                let question_index = self.phase.question_index().unwrap_or(0);
                match self.variant.as_mut() {
                    Some(VariantState::Dice(dice)) => {
                        dice.roll_start(&room_code, question_index, deadline_epoch_ms, eligible);
                    }
                    _ => log::debug!("dice_roll_start outside dice mode, ignoring"),
                }
                Ok(())
            }
            ServerEvent::BothReadyStart {
                start_epoch_ms,
                question_ids: _,
                participants,
            }
            | ServerEvent::RematchStart {
                start_epoch_ms,
                question_ids: _,
                participants,
            } => {
                self.restart(start_epoch_ms, participants);
                Ok(())
            }
        }
    }

    /// Rebuild the session for a fresh start: participants replaced
    /// wholesale, scores reset at round zero, prior phase state invalidated.
    fn restart(&mut self, start_epoch_ms: u64, participants: Vec<Participant>) {
        self.phase.reset();
        self.guard.clear();
        let fresh: Vec<Participant> = participants
            .into_iter()
            .map(|p| Participant::new(p.connection_id, p.display_name))
            .collect();
        if let Some(session) = self.session.as_mut() {
            session.participants = fresh.clone();
            session.start_epoch_ms = Some(start_epoch_ms);
            self.variant = Some(VariantState::new_for(session.game_type, &fresh));
        }
        self.settled = false;
        self.my_correct = 0;
        self.dice_rounds = 0;
        self.sync_lives();
    }

    /// Mirror the authoritative survival lives onto the roster so snapshots
    /// carry them. No-op in other modes, where lives stay zero.
    fn sync_lives(&mut self) {
        let survival = match &self.variant {
            Some(VariantState::Survival(survival)) => survival,
            _ => return,
        };
        if let Some(session) = self.session.as_mut() {
            for participant in &mut session.participants {
                participant.lives = survival.lives(&participant.connection_id);
            }
        }
    }

    /// Submit the player's answer for the current round. Returns true if the
    /// message was queued; duplicate or out-of-window calls are no-ops.
    pub fn submit_answer(&mut self, is_correct: bool, now_ms: u64) -> bool {
        let room_code = match &self.session {
            Some(session) => session.room_code.clone(),
            None => return false,
        };
        let question_index = match self.phase.question_index() {
            Some(index) => index,
            None => return false,
        };
        if !self.phase.can_answer(now_ms) {
            return false;
        }
        if !self.guard.try_submit(&room_code, question_index) {
            return false;
        }
        self.phase.mark_answered();
        self.outbound.push(ClientMessage::SubmitAnswer {
            room_code,
            is_correct,
        });
        true
    }

    pub fn ready(&mut self, handicap: i64) {
        if let Some(session) = &self.session {
            self.outbound.push(ClientMessage::PlayerReady {
                room_code: session.room_code.clone(),
                connection_id: self.me.clone(),
                handicap,
            });
        }
    }

    /// Team mode: record the local echo and queue the vote. The committed
    /// team answer still only comes from the server's decision event.
    pub fn vote(&mut self, choice: VoteChoice) {
        let room_code = match &self.session {
            Some(session) => session.room_code.clone(),
            None => return,
        };
        if let Some(VariantState::Team(team)) = self.variant.as_mut() {
            team.record_vote(choice);
            self.outbound.push(ClientMessage::SubmitVote { room_code, choice });
        }
    }

    /// Dice mode: player-stopped roll. The raw face goes out; any modifier
    /// only shapes the displayed value.
    pub fn stop_dice(&mut self) -> Option<u8> {
        let room_code = match &self.session {
            Some(session) => session.room_code.clone(),
            None => return None,
        };
        if let Some(VariantState::Dice(dice)) = self.variant.as_mut() {
            let face = dice.stop_roll(&self.me)?;
            self.outbound
                .push(ClientMessage::SubmitDice { room_code, face });
            return Some(face);
        }
        None
    }

    pub fn select_modifier(&mut self, modifier: DiceModifier) {
        let room_code = match &self.session {
            Some(session) => session.room_code.clone(),
            None => return,
        };
        if let Some(VariantState::Dice(dice)) = self.variant.as_mut() {
            dice.select_modifier(modifier);
            self.outbound
                .push(ClientMessage::SelectModifier { room_code, modifier });
        }
    }

    /// Mind mode: the representative's private choice.
    pub fn answer_as_representative(&mut self, choice: VoteChoice) -> bool {
        let room_code = match &self.session {
            Some(session) => session.room_code.clone(),
            None => return false,
        };
        if let Some(VariantState::Mind(mind)) = self.variant.as_mut() {
            if mind.representative() != Some(self.me.as_str()) {
                return false;
            }
            mind.record_private_choice(choice);
            self.outbound
                .push(ClientMessage::SubmitRepresentativeAnswer { room_code, choice });
            return true;
        }
        false
    }

    /// Mind mode: a guess at the representative's choice.
    pub fn guess(&mut self, choice: VoteChoice) -> bool {
        let room_code = match &self.session {
            Some(session) => session.room_code.clone(),
            None => return false,
        };
        if let Some(VariantState::Mind(mind)) = self.variant.as_ref() {
            if mind.representative() == Some(self.me.as_str()) {
                return false;
            }
            self.outbound
                .push(ClientMessage::SubmitGuess { room_code, choice });
            return true;
        }
        false
    }

    /// Timer tick. Recomputes nothing itself (countdowns are pure reads) but
    /// drives deadline-gated work like the dice auto-resolve.
    pub fn tick(&mut self, now_ms: u64) {
        let room_code = match &self.session {
            Some(session) => session.room_code.clone(),
            None => return,
        };
        if let Some(VariantState::Dice(dice)) = self.variant.as_mut() {
            if let Some(face) = dice.auto_resolve(&self.me, now_ms) {
                self.outbound
                    .push(ClientMessage::SubmitDice { room_code, face });
            }
        }
    }

    pub fn on_mount(&mut self) -> AwardState {
        self.award.recover()
    }

    pub fn on_focus(&mut self) -> AwardState {
        self.award.recover()
    }

    pub fn on_visibility_restore(&mut self) -> AwardState {
        self.award.recover()
    }

    fn variant_finished(&self) -> bool {
        match &self.variant {
            Some(VariantState::Survival(survival)) => survival.finished(),
            Some(VariantState::Team(team)) => team.finished(),
            Some(VariantState::Mind(mind)) => mind.finished(),
            Some(VariantState::Quick(quick)) => quick.finished(),
            Some(VariantState::Dice(_)) => self.dice_rounds >= DICE_ROUND_BUDGET,
            None => false,
        }
    }

    fn finish_if_done(&mut self, now_ms: u64) {
        if self.settled || !self.variant_finished() {
            return;
        }
        let award = match self.compute_award(now_ms) {
            Some(award) => award,
            None => return,
        };
        // At most one pending award per finished match.
        self.settled = true;
        self.award.settle(award);
    }

    fn compute_award(&self, now_ms: u64) -> Option<PendingAward> {
        let session = self.session.as_ref()?;
        let variant = self.variant.as_ref()?;
        let mut breakdown = AwardBreakdown {
            base_points: i64::from(self.my_correct) * POINTS_PER_CORRECT,
            ..AwardBreakdown::default()
        };
        match variant {
            VariantState::Survival(survival) => {
                breakdown.placement_bonus = survival.bonus(&self.me);
            }
            VariantState::Mind(mind) => {
                breakdown.placement_bonus = mind.bonus(&self.me);
            }
            VariantState::Quick(quick) => {
                breakdown.placement_bonus = quick.bonus(&self.me);
            }
            VariantState::Team(team) => {
                breakdown.stage_bonus = team.stage_bonus();
            }
            VariantState::Dice(_) => {
                let my_score = session
                    .participants
                    .iter()
                    .find(|p| p.connection_id == self.me)
                    .map(|p| p.score)
                    .unwrap_or(0);
                breakdown.score_bonus =
                    my_score.max(0) / crate::constants::DICE_SCORE_BONUS_DIVISOR;
            }
        }
        Some(PendingAward {
            room_code: session.room_code.clone(),
            game_type: session.game_type,
            points: breakdown.total(),
            exp: i64::from(self.my_correct) * EXP_PER_CORRECT,
            correct_count: self.my_correct,
            finished_at_index: self.phase.question_index().unwrap_or(0),
            breakdown,
            created_at_ms: now_ms,
        })
    }

    pub fn snapshot(&self, now_ms: u64) -> MatchSnapshot {
        let variant = self.variant.as_ref().map(|variant| match variant {
            VariantState::Survival(survival) => VariantView::Survival {
                groups: survival.groups().to_vec(),
                my_lives: survival.lives(&self.me),
            },
            VariantState::Dice(dice) => VariantView::Dice {
                last_face: dice.last_face(),
                display_value: dice.display_value(),
                modifier: dice.modifier(),
                eligible: dice.is_eligible(&self.me),
            },
            VariantState::Team(team) => VariantView::Team {
                my_vote: team.my_vote(),
                decided: team.decided(),
                cleared_stages: team.cleared_stages(),
                failed: team.failed(),
            },
            VariantState::Mind(mind) => VariantView::Mind {
                representative: mind.representative().map(str::to_string),
                my_score: mind.score(&self.me),
            },
            VariantState::Quick(quick) => VariantView::Quick {
                rounds_played: quick.rounds_played(),
                my_correct: quick.correct_count(&self.me),
            },
        });
        MatchSnapshot {
            room_code: self.session.as_ref().map(|s| s.room_code.clone()),
            game_type: self.session.as_ref().map(|s| s.game_type),
            phase: self.phase.phase(),
            question_index: self.phase.question_index(),
            remaining_seconds: self.phase.countdown().remaining_seconds(now_ms),
            can_answer: self.phase.can_answer(now_ms),
            participants: self
                .session
                .as_ref()
                .map(|s| s.participants.clone())
                .unwrap_or_default(),
            award_state: self.award.state(),
            variant,
        }
    }
}
