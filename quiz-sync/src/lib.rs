//! Client core for a real-time multiplayer quiz site: keeps every
//! participant's view in lock-step with the server-authoritative round
//! timeline and guarantees that a finished match's payout is credited to the
//! account exactly once, across crashes, tab switches, expired sessions, and
//! retries. UI-framework independent; the transport and renderer sit outside.

pub mod award;
pub mod client;
pub mod clock;
pub mod constants;
pub mod crypto;
pub mod dice;
pub mod guard;
pub mod mind;
pub mod net;
pub mod phase;
pub mod quick;
pub mod rank;
pub mod rng;
pub mod snapshot;
pub mod survival;
pub mod team;
pub mod types;

pub use award::{AwardState, AwardStore, FileStore, Ledger, LedgerError, MemoryStore, Notice, RewardEngine};
pub use client::MatchClient;
pub use clock::Countdown;
pub use net::{ClientMessage, ServerEvent};
pub use snapshot::{MatchSnapshot, VariantView};
pub use types::{
    AnswerVerdict, AwardBreakdown, GameType, LevelChange, MatchSession, Participant, PendingAward,
    Phase, QuestionPhase, SlotDraw, VoteChoice,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::award::testkit::{MockAudit, MockIdentity, MockLedger, SharedStore};
    use crate::constants::{
        DICE_ROUND_BUDGET, EXP_PER_CORRECT, POINTS_PER_CORRECT, QUICK_ROUND_BUDGET,
    };
    use crate::crypto::slot_commitment;
    use crate::types::DiceModifier;

    struct Rig {
        client: MatchClient,
        store: SharedStore,
        ledger: MockLedger,
        identity: MockIdentity,
    }

    fn rig(me: &str, session: Option<&str>) -> Rig {
        let store = SharedStore::default();
        let ledger = MockLedger::default();
        let identity = MockIdentity::default();
        identity.0.borrow_mut().session = session.map(str::to_string);
        let engine = RewardEngine::new(
            Box::new(store.clone()),
            Box::new(ledger.clone()),
            Box::new(identity.clone()),
            Box::new(MockAudit::default()),
        );
        Rig {
            client: MatchClient::new(me, engine),
            store,
            ledger,
            identity,
        }
    }

    fn participants(names: &[&str]) -> Vec<Participant> {
        names.iter().map(|n| Participant::new(*n, *n)).collect()
    }

    fn verdicts(pairs: &[(&str, bool)]) -> Vec<AnswerVerdict> {
        pairs
            .iter()
            .map(|(id, correct)| AnswerVerdict {
                connection_id: id.to_string(),
                is_correct: *correct,
            })
            .collect()
    }

    fn play_round(client: &mut MatchClient, index: u32, now_ms: u64, results: Vec<AnswerVerdict>) {
        client
            .apply(
                ServerEvent::QuestionStart {
                    deadline_epoch_ms: now_ms + 8_000,
                    question_index: index,
                },
                now_ms,
            )
            .unwrap();
        client
            .apply(ServerEvent::AnswerResult { results }, now_ms + 8_500)
            .unwrap();
    }

    #[test]
    fn quick_match_pays_base_plus_placement_once() {
        let mut rig = rig("me", Some("user-1"));
        rig.client
            .join("room-1".into(), GameType::Quick, participants(&["me", "p2", "p3"]));

        let mut now = 1_000_000;
        for index in 0..QUICK_ROUND_BUDGET {
            // "me" answers correctly every round, the others never.
            play_round(
                &mut rig.client,
                index,
                now,
                verdicts(&[("me", true), ("p2", false), ("p3", false)]),
            );
            now += 10_000;
        }

        assert_eq!(rig.client.award_state(), AwardState::Awarded);
        let calls = rig.ledger.0.borrow().calls.clone();
        assert_eq!(calls.len(), 1);
        let expected_points = i64::from(QUICK_ROUND_BUDGET) * POINTS_PER_CORRECT
            + rank::placement_bonus(3, 1);
        assert_eq!(calls[0].1, expected_points);
        assert_eq!(calls[0].2, i64::from(QUICK_ROUND_BUDGET) * EXP_PER_CORRECT);
        assert!(rig.store.load(&GameType::Quick.storage_key()).is_none());

        // Extra result events after the match change nothing.
        let _ = rig.client.apply(
            ServerEvent::AnswerResult {
                results: verdicts(&[("me", true)]),
            },
            now,
        );
        assert_eq!(rig.ledger.0.borrow().calls.len(), 1);
    }

    #[test]
    fn duplicate_submission_sends_one_message() {
        let mut rig = rig("me", Some("user-1"));
        rig.client
            .join("room-2".into(), GameType::Quick, participants(&["me", "p2"]));
        rig.client
            .apply(
                ServerEvent::QuestionStart {
                    deadline_epoch_ms: 20_000,
                    question_index: 0,
                },
                10_000,
            )
            .unwrap();

        assert!(rig.client.submit_answer(true, 11_000));
        // Rapid double-tap and a racing code path.
        assert!(!rig.client.submit_answer(true, 11_050));
        assert!(!rig.client.submit_answer(false, 11_100));

        let outbound = rig.client.drain_outbound();
        assert_eq!(outbound.len(), 1);
        assert!(matches!(
            outbound[0],
            ClientMessage::SubmitAnswer { is_correct: true, .. }
        ));

        // Past the deadline nothing goes out either.
        rig.client
            .apply(
                ServerEvent::QuestionStart {
                    deadline_epoch_ms: 30_000,
                    question_index: 1,
                },
                21_000,
            )
            .unwrap();
        assert!(!rig.client.submit_answer(true, 30_000));
        assert!(rig.client.drain_outbound().is_empty());
    }

    #[test]
    fn duplicate_result_deliveries_count_once_for_payout() {
        let mut rig = rig("me", Some("user-1"));
        rig.client
            .join("room-11".into(), GameType::Quick, participants(&["me", "p2"]));

        let mut now = 1_000_000;
        for index in 0..QUICK_ROUND_BUDGET {
            rig.client
                .apply(
                    ServerEvent::QuestionStart {
                        deadline_epoch_ms: now + 8_000,
                        question_index: index,
                    },
                    now,
                )
                .unwrap();
            // The transport redelivers every round's result once.
            for _ in 0..2 {
                rig.client
                    .apply(
                        ServerEvent::AnswerResult {
                            results: verdicts(&[("me", true), ("p2", false)]),
                        },
                        now + 8_500,
                    )
                    .unwrap();
            }
            now += 10_000;
        }

        assert_eq!(rig.client.award_state(), AwardState::Awarded);
        let calls = rig.ledger.0.borrow().calls.clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].1,
            i64::from(QUICK_ROUND_BUDGET) * POINTS_PER_CORRECT + rank::placement_bonus(2, 1)
        );
    }

    #[test]
    fn repeated_result_delivery_removes_a_single_life() {
        let mut rig = rig("me", Some("user-1"));
        rig.client.join(
            "room-12".into(),
            GameType::Survival,
            participants(&["me", "p2", "p3"]),
        );
        rig.client
            .apply(
                ServerEvent::QuestionStart {
                    deadline_epoch_ms: 20_000,
                    question_index: 0,
                },
                10_000,
            )
            .unwrap();
        for _ in 0..3 {
            rig.client
                .apply(
                    ServerEvent::AnswerResult {
                        results: verdicts(&[("me", true), ("p2", true), ("p3", false)]),
                    },
                    18_500,
                )
                .unwrap();
        }

        let snapshot = rig.client.snapshot(19_000);
        // One wrong answer, one life: p3 is nowhere near eliminated.
        assert!(matches!(
            snapshot.variant,
            Some(VariantView::Survival { ref groups, .. }) if groups.is_empty()
        ));
        let lives_of = |id: &str| {
            snapshot
                .participants
                .iter()
                .find(|p| p.connection_id == id)
                .map(|p| p.lives)
                .unwrap()
        };
        assert_eq!(lives_of("p3"), 2);
        assert_eq!(lives_of("me"), 3);
    }

    #[test]
    fn late_team_decision_after_rematch_is_discarded() {
        let mut rig = rig("me", Some("user-1"));
        rig.client
            .join("room-13".into(), GameType::Team, participants(&["me", "p2"]));
        rig.client
            .apply(
                ServerEvent::QuestionStart {
                    deadline_epoch_ms: 20_000,
                    question_index: 6,
                },
                10_000,
            )
            .unwrap();
        rig.client.vote(VoteChoice::A);

        rig.client
            .apply(
                ServerEvent::RematchStart {
                    start_epoch_ms: 30_000,
                    question_ids: vec!["q1".into()],
                    participants: participants(&["me", "p2"]),
                },
                11_000,
            )
            .unwrap();

        // The abandoned round's decision lands after the rematch began; it
        // must not fail the fresh match or burn its one payout.
        rig.client
            .apply(
                ServerEvent::TeamAnswerDecided {
                    choice: VoteChoice::A,
                    is_correct: false,
                },
                11_200,
            )
            .unwrap();
        let snapshot = rig.client.snapshot(11_300);
        assert!(matches!(
            snapshot.variant,
            Some(VariantView::Team {
                failed: false,
                cleared_stages: 0,
                ..
            })
        ));
        assert_eq!(snapshot.award_state, AwardState::Idle);

        // The fresh match still progresses normally.
        rig.client
            .apply(
                ServerEvent::QuestionStart {
                    deadline_epoch_ms: 40_000,
                    question_index: 0,
                },
                31_000,
            )
            .unwrap();
        rig.client
            .apply(
                ServerEvent::TeamAnswerDecided {
                    choice: VoteChoice::B,
                    is_correct: true,
                },
                32_000,
            )
            .unwrap();
        assert!(matches!(
            rig.client.snapshot(32_500).variant,
            Some(VariantView::Team {
                cleared_stages: 1,
                failed: false,
                ..
            })
        ));
    }

    #[test]
    fn rematch_discards_stale_results_and_resets_scores() {
        let mut rig = rig("me", Some("user-1"));
        rig.client
            .join("room-3".into(), GameType::Quick, participants(&["me", "p2"]));
        rig.client
            .apply(
                ServerEvent::QuestionStart {
                    deadline_epoch_ms: 20_000,
                    question_index: 7,
                },
                10_000,
            )
            .unwrap();
        rig.client
            .apply(
                ServerEvent::ScoreUpdate {
                    connection_id: "me".into(),
                    score: 40,
                    extra: None,
                },
                10_500,
            )
            .unwrap();

        // Rematch begins before the round-7 result arrives.
        rig.client
            .apply(
                ServerEvent::RematchStart {
                    start_epoch_ms: 30_000,
                    question_ids: vec!["q1".into()],
                    participants: participants(&["me", "p2"]),
                },
                11_000,
            )
            .unwrap();

        // The late result from the abandoned round must not leak in.
        rig.client
            .apply(
                ServerEvent::AnswerResult {
                    results: verdicts(&[("me", true), ("p2", false)]),
                },
                11_200,
            )
            .unwrap();

        let snapshot = rig.client.snapshot(11_300);
        assert_eq!(snapshot.phase, None);
        assert!(matches!(
            snapshot.variant,
            Some(VariantView::Quick { rounds_played: 0, my_correct: 0 })
        ));
        assert!(snapshot.participants.iter().all(|p| p.score == 0));
    }

    #[test]
    fn survival_match_credits_the_sole_winner() {
        let mut rig = rig("me", Some("user-1"));
        rig.client.join(
            "room-4".into(),
            GameType::Survival,
            participants(&["me", "p2", "p3"]),
        );

        let mut now = 1_000_000;
        let mut index = 0;
        // p3 out first, then p2; "me" survives.
        for _ in 0..3 {
            play_round(
                &mut rig.client,
                index,
                now,
                verdicts(&[("me", true), ("p2", true), ("p3", false)]),
            );
            index += 1;
            now += 10_000;
        }
        for _ in 0..3 {
            play_round(
                &mut rig.client,
                index,
                now,
                verdicts(&[("me", true), ("p2", false)]),
            );
            index += 1;
            now += 10_000;
        }

        assert_eq!(rig.client.award_state(), AwardState::Awarded);
        let calls = rig.ledger.0.borrow().calls.clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].1,
            6 * POINTS_PER_CORRECT + rank::placement_bonus(3, 1)
        );
    }

    #[test]
    fn team_wipe_settles_with_stage_bonus() {
        let mut rig = rig("me", Some("user-1"));
        rig.client
            .join("room-5".into(), GameType::Team, participants(&["me", "p2"]));

        let mut now = 1_000_000;
        for index in 0..4u32 {
            rig.client
                .apply(
                    ServerEvent::QuestionStart {
                        deadline_epoch_ms: now + 8_000,
                        question_index: index,
                    },
                    now,
                )
                .unwrap();
            rig.client.vote(VoteChoice::A);
            rig.client
                .apply(
                    ServerEvent::AnswerResult {
                        results: verdicts(&[("me", true), ("p2", true)]),
                    },
                    now + 8_200,
                )
                .unwrap();
            rig.client
                .apply(
                    ServerEvent::TeamAnswerDecided {
                        choice: VoteChoice::A,
                        is_correct: index < 3,
                    },
                    now + 8_500,
                )
                .unwrap();
            now += 10_000;
        }

        // Three cleared stages, then a wrong team answer ends the match.
        assert_eq!(rig.client.award_state(), AwardState::Awarded);
        let calls = rig.ledger.0.borrow().calls.clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, 4 * POINTS_PER_CORRECT + 60);

        let outbound = rig.client.drain_outbound();
        let votes = outbound
            .iter()
            .filter(|m| matches!(m, ClientMessage::SubmitVote { .. }))
            .count();
        assert_eq!(votes, 4);
    }

    #[test]
    fn dice_round_submits_raw_face_and_score_stays_server_owned() {
        let mut rig = rig("me", Some("user-1"));
        rig.client
            .join("room-6".into(), GameType::Dice, participants(&["me", "p2"]));

        rig.client
            .apply(
                ServerEvent::QuestionStart {
                    deadline_epoch_ms: 20_000,
                    question_index: 0,
                },
                10_000,
            )
            .unwrap();
        rig.client.select_modifier(DiceModifier::Mul(2));
        rig.client
            .apply(
                ServerEvent::DiceRollStart {
                    deadline_epoch_ms: 25_000,
                    eligible: vec!["me".into()],
                },
                21_000,
            )
            .unwrap();

        // Tick before the deadline does nothing; after it, the roll
        // auto-resolves and the raw face is queued.
        rig.client.tick(24_000);
        rig.client.tick(25_100);
        let outbound = rig.client.drain_outbound();
        let faces: Vec<u8> = outbound
            .iter()
            .filter_map(|m| match m {
                ClientMessage::SubmitDice { face, .. } => Some(*face),
                _ => None,
            })
            .collect();
        assert_eq!(faces.len(), 1);
        assert!((1..=constants::DICE_FACES).contains(&faces[0]));

        // The snapshot shows the doubled display value and the consumed
        // modifier, while the submitted face above stayed raw.
        let snapshot = rig.client.snapshot(25_500);
        assert!(matches!(
            snapshot.variant,
            Some(VariantView::Dice {
                display_value: Some(display),
                modifier: None,
                ..
            }) if display == i64::from(faces[0]) * 2
        ));

        // The authoritative score arrives from the server echo.
        rig.client
            .apply(
                ServerEvent::ScoreUpdate {
                    connection_id: "me".into(),
                    score: 24,
                    extra: Some(i64::from(faces[0])),
                },
                26_000,
            )
            .unwrap();
        let snapshot = rig.client.snapshot(26_500);
        assert_eq!(snapshot.participants[0].score, 24);
    }

    #[test]
    fn dice_match_pays_score_bonus_from_the_ledgered_score() {
        let mut rig = rig("me", Some("user-1"));
        rig.client
            .join("room-7".into(), GameType::Dice, participants(&["me", "p2"]));

        let mut now = 1_000_000;
        for index in 0..DICE_ROUND_BUDGET {
            play_round(
                &mut rig.client,
                index,
                now,
                verdicts(&[("me", index % 2 == 0), ("p2", true)]),
            );
            now += 10_000;
        }
        // 5 correct answers; no score_update arrived, so the score bonus
        // contributes nothing.
        let calls = rig.ledger.0.borrow().calls.clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, 5 * POINTS_PER_CORRECT);
    }

    #[test]
    fn mind_match_rotates_and_pays_by_guess_rank() {
        let mut rig = rig("me", Some("user-1"));
        rig.client.join(
            "room-8".into(),
            GameType::Mind,
            participants(&["me", "p2", "p3"]),
        );

        let draw = |id: &str, value: u64| {
            let salt = format!("slot-{}", id);
            SlotDraw {
                connection_id: id.into(),
                value,
                commitment: slot_commitment(value, &salt),
                salt,
            }
        };
        rig.client
            .apply(
                ServerEvent::RepresentativeOrder {
                    order: vec![draw("p2", 800), draw("me", 450), draw("p3", 90)],
                },
                1_000_000,
            )
            .unwrap();

        let snapshot = rig.client.snapshot(1_000_100);
        assert!(matches!(
            snapshot.variant,
            Some(VariantView::Mind { ref representative, .. }) if representative.as_deref() == Some("p2")
        ));

        // Round 1: p2 is representative, "me" guesses right.
        assert!(!rig.client.answer_as_representative(VoteChoice::A));
        assert!(rig.client.guess(VoteChoice::A));
        play_round(
            &mut rig.client,
            0,
            1_000_000,
            verdicts(&[("me", true), ("p3", false)]),
        );
        // Round 2: "me" is representative and answers privately.
        assert!(rig.client.answer_as_representative(VoteChoice::B));
        assert!(!rig.client.guess(VoteChoice::B));
        play_round(
            &mut rig.client,
            1,
            1_010_000,
            verdicts(&[("p2", false), ("p3", false)]),
        );
        // Round 3: p3 is representative, "me" guesses right again.
        play_round(
            &mut rig.client,
            2,
            1_020_000,
            verdicts(&[("me", true), ("p2", true)]),
        );

        assert_eq!(rig.client.award_state(), AwardState::Awarded);
        let calls = rig.ledger.0.borrow().calls.clone();
        assert_eq!(calls.len(), 1);
        // Two correct guesses, sole top guess-score rank.
        assert_eq!(
            calls[0].1,
            2 * POINTS_PER_CORRECT + rank::placement_bonus(3, 1)
        );
    }

    #[test]
    fn expired_session_parks_the_award_until_focus_after_login() {
        let mut rig = rig("me", None);
        rig.client
            .join("room-9".into(), GameType::Quick, participants(&["me", "p2"]));

        let mut now = 1_000_000;
        for index in 0..QUICK_ROUND_BUDGET {
            play_round(
                &mut rig.client,
                index,
                now,
                verdicts(&[("me", true), ("p2", false)]),
            );
            now += 10_000;
        }

        assert_eq!(rig.client.award_state(), AwardState::NeedLogin);
        assert!(rig.store.load(&GameType::Quick.storage_key()).is_some());
        assert!(rig.ledger.0.borrow().calls.is_empty());

        // User signs back in; the next focus event retries and credits.
        rig.identity.0.borrow_mut().session = Some("user-1".into());
        assert_eq!(rig.client.on_focus(), AwardState::Awarded);
        assert_eq!(rig.ledger.0.borrow().calls.len(), 1);
        assert!(rig.store.load(&GameType::Quick.storage_key()).is_none());

        // Further triggers, in any order, are no-ops.
        assert_eq!(rig.client.on_visibility_restore(), AwardState::Awarded);
        assert_eq!(rig.client.on_mount(), AwardState::Awarded);
        assert_eq!(rig.ledger.0.borrow().calls.len(), 1);
    }

    #[test]
    fn countdown_in_snapshot_tracks_the_epoch_deadline() {
        let mut rig = rig("me", Some("user-1"));
        rig.client
            .join("room-10".into(), GameType::Quick, participants(&["me"]));
        rig.client
            .apply(
                ServerEvent::QuestionStart {
                    deadline_epoch_ms: 30_000,
                    question_index: 0,
                },
                10_000,
            )
            .unwrap();

        assert_eq!(rig.client.snapshot(10_000).remaining_seconds, 20);
        // Tab slept for 18 seconds; the next snapshot self-corrects.
        assert_eq!(rig.client.snapshot(28_000).remaining_seconds, 2);
        assert_eq!(rig.client.snapshot(31_000).remaining_seconds, 0);
        assert!(!rig.client.snapshot(31_000).can_answer);
    }

    #[test]
    fn events_without_a_session_are_rejected() {
        let mut rig = rig("me", Some("user-1"));
        let err = rig.client.apply(
            ServerEvent::QuestionStart {
                deadline_epoch_ms: 10_000,
                question_index: 0,
            },
            5_000,
        );
        assert!(err.is_err());
    }
}
