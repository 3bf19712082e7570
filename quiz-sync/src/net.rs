use crate::types::{AnswerVerdict, DiceModifier, Participant, SlotDraw, VoteChoice};
use serde::{Deserialize, Serialize};

// Wire-level message shapes for the match channel. A closed tagged union on
// both directions so the transport boundary validates event names instead of
// dispatching on raw strings.

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum ServerEvent {
    QuestionStart {
        deadline_epoch_ms: u64,
        question_index: u32,
    },
    AnswerResult {
        results: Vec<AnswerVerdict>,
    },
    ScoreUpdate {
        connection_id: String,
        score: i64,
        extra: Option<i64>,
    },
    TeamAnswerDecided {
        choice: VoteChoice,
        is_correct: bool,
    },
    RepresentativeOrder {
        order: Vec<SlotDraw>,
    },
    EliminationUpdate {
        groups: Vec<Vec<String>>,
    },
    DiceRollStart {
        deadline_epoch_ms: u64,
        eligible: Vec<String>,
    },
    BothReadyStart {
        start_epoch_ms: u64,
        question_ids: Vec<String>,
        participants: Vec<Participant>,
    },
    RematchStart {
        start_epoch_ms: u64,
        question_ids: Vec<String>,
        participants: Vec<Participant>,
    },
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    SubmitAnswer {
        room_code: String,
        is_correct: bool,
    },
    PlayerReady {
        room_code: String,
        connection_id: String,
        handicap: i64,
    },
    SubmitVote {
        room_code: String,
        choice: VoteChoice,
    },
    SubmitDice {
        room_code: String,
        face: u8,
    },
    SelectModifier {
        room_code: String,
        modifier: DiceModifier,
    },
    SubmitRepresentativeAnswer {
        room_code: String,
        choice: VoteChoice,
    },
    SubmitGuess {
        room_code: String,
        choice: VoteChoice,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_events_use_tagged_encoding() {
        let event = ServerEvent::QuestionStart {
            deadline_epoch_ms: 1_700_000_010_000,
            question_index: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "QuestionStart");
        assert_eq!(json["data"]["question_index"], 3);
        let back: ServerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn unknown_event_names_fail_to_parse() {
        let raw = r#"{"type":"MysteryEvent","data":{}}"#;
        assert!(serde_json::from_str::<ServerEvent>(raw).is_err());
    }
}
