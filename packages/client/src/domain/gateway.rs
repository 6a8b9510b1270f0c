//! HTTP ゲートウェイ trait 定義
//!
//! latency 計測・報告と、quiz の補完取得（poll / catch-up / 回答済み一覧）の
//! インターフェース。UseCase 相当のエンジン層はこの trait にのみ依存します。

use async_trait::async_trait;

use super::{
    error::GatewayError,
    identity::Role,
    latency::QualityStats,
    quiz::QuizEvent,
    value_object::{ParticipantId, SessionKey},
};

/// Probe endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEcho {
    /// Server wall-clock time when the probe was handled (Unix milliseconds)
    pub server_timestamp: i64,
    /// The server's own quality estimate. Informational only.
    pub connection_quality: Option<String>,
}

/// Quality report pushed to the server for aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyReport {
    pub session_key: SessionKey,
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub role: Role,
    pub rtt_ms: f64,
    pub jitter_ms: f64,
    pub samples_count: usize,
}

impl LatencyReport {
    /// Build a report from the current stats; no stats yields an empty report.
    pub fn new(
        session_key: SessionKey,
        participant_id: ParticipantId,
        display_name: String,
        role: Role,
        stats: Option<&QualityStats>,
    ) -> Self {
        Self {
            session_key,
            participant_id,
            display_name,
            role,
            rtt_ms: stats.map_or(0.0, |s| s.avg_rtt),
            jitter_ms: stats.map_or(0.0, |s| s.jitter),
            samples_count: stats.map_or(0, |s| s.sample_count),
        }
    }
}

/// Latency probe and report endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LatencyApi: Send + Sync {
    /// Send one timestamped probe.
    async fn probe(
        &self,
        session_key: &SessionKey,
        participant_id: &ParticipantId,
        client_timestamp: i64,
    ) -> Result<ProbeEcho, GatewayError>;

    /// Push the current quality stats. Fire-and-forget from the caller's view.
    async fn report(&self, report: LatencyReport) -> Result<(), GatewayError>;
}

/// Quiz endpoints used outside the realtime channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// Question ids this participant has already answered in the session.
    async fn answered_question_ids(
        &self,
        session_key: &SessionKey,
        participant_id: &ParticipantId,
    ) -> Result<Vec<String>, GatewayError>;

    /// The quiz currently open in the session, if any.
    async fn active_quiz(
        &self,
        session_key: &SessionKey,
        participant_id: &ParticipantId,
    ) -> Result<Option<QuizEvent>, GatewayError>;
}
