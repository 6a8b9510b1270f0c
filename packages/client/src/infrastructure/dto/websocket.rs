//! WebSocket message DTOs.
//!
//! Inbound frames are either the literal heartbeat acknowledgment or a JSON
//! object discriminated by its `type` field. Anything else is unrecognized
//! and dropped by the caller.

use serde::{Deserialize, Deserializer};

use crate::domain::HEARTBEAT_PONG;

/// Identifier that the server may send as a string or as an integer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Text(String),
    Number(i64),
}

impl From<IdValue> for String {
    fn from(value: IdValue) -> Self {
        match value {
            IdValue::Text(text) => text,
            IdValue::Number(number) => number.to_string(),
        }
    }
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    IdValue::deserialize(deserializer).map(String::from)
}

/// Time limit in seconds from any JSON number. Floats are rounded, values
/// outside `u32` saturate, and non-numbers read as absent.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .map(|seconds| seconds.round() as u32))
}

/// Quiz body, shared by the push message and the catch-up response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuizPayload {
    #[serde(rename = "questionId", deserialize_with = "id_string")]
    pub question_id: String,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(rename = "timeLimit", default, deserialize_with = "lenient_seconds")]
    pub time_limit: Option<u32>,
}

/// Roster change payload; fields vary by server version.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RosterPayload {
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl RosterPayload {
    /// First non-empty of the usual name/id fields.
    pub fn participant_label(&self) -> Option<String> {
        [
            "participant_name",
            "participantName",
            "name",
            "participant_id",
            "participantId",
        ]
        .iter()
        .filter_map(|field| self.fields.get(*field))
        .find_map(|value| match value {
            serde_json::Value::String(text) if !text.is_empty() => Some(text.clone()),
            serde_json::Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
    }
}

/// Typed inbound message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Quiz(QuizPayload),
    MeetingEnded,
    ParticipantJoined(RosterPayload),
    ParticipantLeft(RosterPayload),
}

/// One inbound text frame, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Pong,
    Message(InboundMessage),
    Unrecognized,
}

/// Classify an inbound text frame. Never fails; bad input is `Unrecognized`.
pub fn parse_inbound(text: &str) -> InboundFrame {
    if text.trim() == HEARTBEAT_PONG {
        return InboundFrame::Pong;
    }

    match serde_json::from_str::<InboundMessage>(text) {
        Ok(message) => InboundFrame::Message(message),
        Err(e) => {
            tracing::debug!("Ignoring unrecognized inbound message: {}", e);
            InboundFrame::Unrecognized
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pong() {
        // テスト項目: "pong" はハートビート応答として解釈される
        // given (前提条件):
        let text = "pong";

        // when (操作):
        let frame = parse_inbound(text);

        // then (期待する結果):
        assert_eq!(frame, InboundFrame::Pong);
    }

    #[test]
    fn test_parse_quiz_message() {
        // テスト項目: quiz メッセージが QuizPayload に変換される
        // given (前提条件):
        let text = r#"{"type":"quiz","questionId":"q1","question":"2+2?","options":["3","4"],"timeLimit":20,"extra":true}"#;

        // when (操作):
        let frame = parse_inbound(text);

        // then (期待する結果):
        assert_eq!(
            frame,
            InboundFrame::Message(InboundMessage::Quiz(QuizPayload {
                question_id: "q1".to_string(),
                question: "2+2?".to_string(),
                options: vec!["3".to_string(), "4".to_string()],
                time_limit: Some(20),
            }))
        );
    }

    #[test]
    fn test_parse_quiz_with_numeric_id_and_defaults() {
        // テスト項目: 数値の questionId を受け付け、省略されたフィールドはデフォルト値になる
        // given (前提条件):
        let text = r#"{"type":"quiz","questionId":42,"question":"Ready?"}"#;

        // when (操作):
        let frame = parse_inbound(text);

        // then (期待する結果):
        let InboundFrame::Message(InboundMessage::Quiz(payload)) = frame else {
            panic!("expected quiz, got {frame:?}");
        };
        assert_eq!(payload.question_id, "42");
        assert!(payload.options.is_empty());
        assert_eq!(payload.time_limit, None);
    }

    #[test]
    fn test_parse_quiz_with_float_time_limit() {
        // テスト項目: 小数の timeLimit でも quiz として解釈され、秒数は丸められる
        // given (前提条件):
        let text = r#"{"type":"quiz","questionId":"q1","question":"x","options":["a"],"timeLimit":30.0}"#;
        let rounded = r#"{"type":"quiz","questionId":"q2","question":"x","timeLimit":12.6}"#;

        // when (操作):
        let frame = parse_inbound(text);
        let rounded = parse_inbound(rounded);

        // then (期待する結果):
        let InboundFrame::Message(InboundMessage::Quiz(payload)) = frame else {
            panic!("expected quiz, got {frame:?}");
        };
        assert_eq!(payload.time_limit, Some(30));
        let InboundFrame::Message(InboundMessage::Quiz(payload)) = rounded else {
            panic!("expected quiz, got {rounded:?}");
        };
        assert_eq!(payload.time_limit, Some(13));
    }

    #[test]
    fn test_parse_quiz_with_out_of_range_or_non_numeric_time_limit() {
        // テスト項目: 負の timeLimit は 0 に丸められ、数値以外は未指定扱いになる
        // given (前提条件):
        let cases = [
            (r#"{"type":"quiz","questionId":"q1","question":"x","timeLimit":-5}"#, Some(0)),
            (r#"{"type":"quiz","questionId":"q1","question":"x","timeLimit":-2.5}"#, Some(0)),
            (r#"{"type":"quiz","questionId":"q1","question":"x","timeLimit":"30"}"#, None),
            (r#"{"type":"quiz","questionId":"q1","question":"x","timeLimit":null}"#, None),
        ];

        for (text, expected) in cases {
            // when (操作):
            let frame = parse_inbound(text);

            // then (期待する結果):
            let InboundFrame::Message(InboundMessage::Quiz(payload)) = frame else {
                panic!("expected quiz for {text}, got {frame:?}");
            };
            assert_eq!(payload.time_limit, expected, "{text}");
        }
    }

    #[test]
    fn test_parse_meeting_ended_ignores_extra_fields() {
        // テスト項目: meeting_ended は余分なフィールドがあっても解釈される
        // given (前提条件):
        let text = r#"{"type":"meeting_ended","reason":"host ended"}"#;

        // when (操作):
        let frame = parse_inbound(text);

        // then (期待する結果):
        assert_eq!(frame, InboundFrame::Message(InboundMessage::MeetingEnded));
    }

    #[test]
    fn test_parse_participant_joined_label() {
        // テスト項目: participant_joined から参加者名を取り出せる
        // given (前提条件):
        let text = r#"{"type":"participant_joined","participant_id":"s-9","participant_name":"Bob"}"#;

        // when (操作):
        let frame = parse_inbound(text);

        // then (期待する結果):
        let InboundFrame::Message(InboundMessage::ParticipantJoined(payload)) = frame else {
            panic!("expected participant_joined, got {frame:?}");
        };
        assert_eq!(payload.participant_label(), Some("Bob".to_string()));
    }

    #[test]
    fn test_parse_unknown_type_is_unrecognized() {
        // テスト項目: 未知の type は Unrecognized になる
        // given (前提条件):
        let text = r#"{"type":"chat","content":"hi"}"#;

        // when (操作):
        let frame = parse_inbound(text);

        // then (期待する結果):
        assert_eq!(frame, InboundFrame::Unrecognized);
    }

    #[test]
    fn test_parse_garbage_is_unrecognized() {
        // テスト項目: JSON でない文字列は Unrecognized になる
        // given (前提条件):
        let inputs = ["", "{not json", "ping", r#"{"type":"quiz"}"#];

        // when (操作) / then (期待する結果):
        for input in inputs {
            assert_eq!(parse_inbound(input), InboundFrame::Unrecognized, "{input}");
        }
    }
}
