//! Conversion logic between DTOs and domain types.

use crate::domain::{
    LatencyReport, ProbeEcho, QuizEvent, RosterChange, RosterUpdate, SessionKey,
};

use super::{
    http::{LatencyReportDto, ProbeResponseDto},
    websocket::{QuizPayload, RosterPayload},
};

// ========================================
// DTO → Domain
// ========================================

impl QuizPayload {
    /// Quiz payloads do not carry the session; the caller supplies the one
    /// the payload was received for.
    pub fn into_event(self, session_key: &SessionKey) -> QuizEvent {
        QuizEvent {
            question_id: self.question_id,
            text: self.question,
            options: self.options,
            time_limit_seconds: self.time_limit.unwrap_or(0),
            source_session_key: session_key.clone(),
        }
    }
}

impl RosterPayload {
    pub fn into_update(self, change: RosterChange, raw: &str) -> RosterUpdate {
        RosterUpdate {
            change,
            participant: self.participant_label(),
            raw: raw.to_string(),
        }
    }
}

impl From<ProbeResponseDto> for ProbeEcho {
    fn from(dto: ProbeResponseDto) -> Self {
        Self {
            server_timestamp: dto.server_timestamp,
            connection_quality: dto.connection_quality.map(|value| match value {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            }),
        }
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<LatencyReport> for LatencyReportDto {
    fn from(report: LatencyReport) -> Self {
        Self {
            session_id: report.session_key.into_string(),
            student_id: report.participant_id.into_string(),
            student_name: report.display_name,
            user_role: report.role.as_str().to_string(),
            rtt_ms: report.rtt_ms,
            jitter_ms: report.jitter_ms,
            samples_count: report.samples_count,
        }
    }
}
