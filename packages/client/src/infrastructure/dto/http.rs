//! HTTP API request / response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::{IdValue, QuizPayload};

/// `POST /api/latency/ping` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeRequestDto {
    pub client_timestamp: i64,
    pub session_id: String,
    pub student_id: String,
}

/// `POST /api/latency/ping` response body
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProbeResponseDto {
    #[serde(default)]
    pub server_timestamp: i64,
    #[serde(default)]
    pub connection_quality: Option<serde_json::Value>,
}

/// `POST /api/latency/report` request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyReportDto {
    pub session_id: String,
    pub student_id: String,
    pub student_name: String,
    pub user_role: String,
    pub rtt_ms: f64,
    pub jitter_ms: f64,
    pub samples_count: usize,
}

/// `GET /api/sessions/{key}/active-quiz` response body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActiveQuizResponseDto {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub quiz: Option<QuizPayload>,
}

/// `GET /api/sessions/{key}/answers` response body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnsweredQuestionsResponseDto {
    #[serde(default)]
    pub answered_question_ids: Vec<IdValue>,
}
