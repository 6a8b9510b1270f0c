//! Quiz prompts as delivered to a participant.

use std::fmt;

use super::value_object::SessionKey;

/// A quiz question pushed to the participant.
///
/// Identity is `question_id`: two events with the same id are the same
/// logical quiz regardless of which delivery path produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizEvent {
    pub question_id: String,
    pub text: String,
    pub options: Vec<String>,
    pub time_limit_seconds: u32,
    pub source_session_key: SessionKey,
}

/// Delivery path that produced a quiz event. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizSource {
    /// Realtime channel push
    Push,
    /// Periodic poll of the active quiz
    Poll,
    /// One-shot catch-up fetch (e.g. window regained focus)
    CatchUp,
    /// Any other producer outside the engine
    External,
}

impl fmt::Display for QuizSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuizSource::Push => "push",
            QuizSource::Poll => "poll",
            QuizSource::CatchUp => "catch-up",
            QuizSource::External => "external",
        };
        f.write_str(label)
    }
}
