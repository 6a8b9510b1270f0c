//! Message formatting utilities for client display.

use classpulse_shared::time::millis_to_rfc3339;

use crate::{
    domain::{ConnectionState, OfferOutcome, QualityStats, QuizEvent, RosterChange, RosterUpdate},
    engine::EngineEvent,
};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

fn timestamp(millis: i64) -> String {
    millis_to_rfc3339(millis).unwrap_or_else(|| "-".to_string())
}

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format an engine event
    ///
    /// # Arguments
    ///
    /// * `event` - The event to display
    /// * `received_at` - Unix timestamp when the event was received (milliseconds)
    pub fn format_event(event: &EngineEvent, received_at: i64) -> String {
        match event {
            EngineEvent::Joined { session_key } => {
                format!("\n+ joined session {} at {}\n", session_key, timestamp(received_at))
            }
            EngineEvent::Left { session_key } => match session_key {
                Some(key) => format!("\n- left session {} at {}\n", key, timestamp(received_at)),
                None => "\n- not in a session\n".to_string(),
            },
            EngineEvent::QuizSurfaced { quiz, source } => {
                let mut output = Self::format_quiz(quiz, received_at);
                output.push_str(&format!("(delivered via {})\n", source));
                output
            }
            EngineEvent::StatsInvalidated { question_id, .. } => {
                format!("\n✓ answer recorded for {}\n", question_id)
            }
            EngineEvent::ConnectionFailed {
                session_key,
                reason,
            } => format!(
                "\n! could not connect to session {}: {}\n  type /join {} to retry\n",
                session_key, reason, session_key
            ),
            EngineEvent::ConnectionError { reason } => {
                format!("\n! connection error: {}\n", reason)
            }
            EngineEvent::ConnectionLost { session_key } => format!(
                "\n! connection to session {} lost at {}\n  type /join {} to reconnect\n",
                session_key,
                timestamp(received_at),
                session_key
            ),
            EngineEvent::MeetingEnded { session_key } => format!(
                "\n{}\nThe meeting for session {} has ended.\n{}\n",
                RULE, session_key, RULE
            ),
            EngineEvent::Roster(update) => Self::format_roster(update),
        }
    }

    /// Format a quiz prompt with its numbered options
    pub fn format_quiz(quiz: &QuizEvent, received_at: i64) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", THIN_RULE));
        output.push_str(&format!("Quiz {}: {}\n", quiz.question_id, quiz.text));
        for (index, option) in quiz.options.iter().enumerate() {
            output.push_str(&format!("  {}. {}\n", index + 1, option));
        }
        if quiz.time_limit_seconds > 0 {
            output.push_str(&format!("time limit: {}s\n", quiz.time_limit_seconds));
        }
        output.push_str(&format!("received at {}\n", timestamp(received_at)));
        output.push_str(&format!("{}\n", THIN_RULE));
        output
    }

    pub fn format_roster(update: &RosterUpdate) -> String {
        let who = update.participant.as_deref().unwrap_or("someone");
        match update.change {
            RosterChange::Joined => format!("\n+ {} entered\n", who),
            RosterChange::Left => format!("\n- {} left\n", who),
        }
    }

    /// Format network statistics, or a placeholder when there are none
    pub fn format_stats(stats: Option<&QualityStats>) -> String {
        let Some(stats) = stats else {
            return "No latency samples yet.\n".to_string();
        };

        format!(
            "Network: {} ({})\n  \
             rtt avg {:.0}ms / min {:.0}ms / max {:.0}ms\n  \
             jitter {:.1}ms, stability {:.0}/100, {} sample(s)\n",
            stats.band,
            if stats.is_stable { "stable" } else { "unstable" },
            stats.avg_rtt,
            stats.min_rtt,
            stats.max_rtt,
            stats.jitter,
            stats.stability_score,
            stats.sample_count
        )
    }

    pub fn format_status(state: &ConnectionState, current_quiz: Option<&QuizEvent>) -> String {
        let mut output = format!("Connection: {}", state.status());
        if let Some(key) = state.session_key() {
            output.push_str(&format!(" (session {})", key));
        }
        output.push('\n');
        match current_quiz {
            Some(quiz) => output.push_str(&format!("Current quiz: {}\n", quiz.question_id)),
            None => output.push_str("Current quiz: none\n"),
        }
        output
    }

    /// Format the result of a catch-up fetch
    pub fn format_sync_result(outcome: Option<OfferOutcome>) -> String {
        match outcome {
            Some(OfferOutcome::Surfaced) => "Found a new quiz.\n".to_string(),
            Some(OfferOutcome::AlreadySurfaced) => "The active quiz is already shown.\n".to_string(),
            Some(OfferOutcome::AlreadyAnswered) => "The active quiz is already answered.\n".to_string(),
            Some(OfferOutcome::NotConnected) | Some(OfferOutcome::SessionMismatch) => {
                "Not connected to the quiz's session.\n".to_string()
            }
            None => "No active quiz.\n".to_string(),
        }
    }

    pub fn format_help() -> String {
        [
            "Commands:",
            "  /join <session>   connect to a session",
            "  /leave            leave the current session",
            "  /answer [id]      mark a question (default: the shown one) as answered",
            "  /dismiss          hide the shown quiz",
            "  /sync             check the server for an active quiz",
            "  /ping             measure round-trip time once",
            "  /stats            show network quality",
            "  /status           show connection status",
            "  /help             show this help",
            "  /quit             exit",
            "",
        ]
        .join("\n")
    }
}
