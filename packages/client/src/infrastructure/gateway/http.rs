//! reqwest を使った HTTP ゲートウェイ実装
//!
//! ## 責務
//!
//! - latency probe / report エンドポイントの呼び出し
//! - quiz の補完取得（active quiz / 回答済み一覧）
//!
//! ## 設計ノート
//!
//! リトライはしません。失敗はすべて `GatewayError` として呼び出し側に返し、
//! 呼び出し側（エンジン層）が「次の tick で上書きされる」ものとして破棄します。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::domain::{
    GatewayError, LatencyApi, LatencyReport, ParticipantId, ProbeEcho, QuizApi, QuizEvent,
    SessionKey,
};
use crate::infrastructure::dto::http::{
    ActiveQuizResponseDto, AnsweredQuestionsResponseDto, LatencyReportDto, ProbeRequestDto,
    ProbeResponseDto,
};

/// デフォルトのリクエストタイムアウト
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// 授業サーバーの HTTP API クライアント
#[derive(Debug, Clone)]
pub struct HttpClassroomApi {
    client: Client,
    base_url: Url,
}

impl HttpClassroomApi {
    /// 新しい HttpClassroomApi を作成
    ///
    /// # Arguments
    ///
    /// * `base_url` - API のベース URL（例: `http://127.0.0.1:8080`）
    /// * `timeout` - 1 リクエストあたりのタイムアウト
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url =
            Url::parse(base_url).map_err(|e| GatewayError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// ベース URL にパスセグメントを追加した URL を作る
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T>(&self, url: Url) -> Result<T, GatewayError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;
        decode(response).await
    }
}

async fn decode<T>(response: reqwest::Response) -> Result<T, GatewayError>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::Status(status.as_u16()));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

#[async_trait]
impl LatencyApi for HttpClassroomApi {
    async fn probe(
        &self,
        session_key: &SessionKey,
        participant_id: &ParticipantId,
        client_timestamp: i64,
    ) -> Result<ProbeEcho, GatewayError> {
        let url = self.endpoint(&["api", "latency", "ping"])?;
        let body = ProbeRequestDto {
            client_timestamp,
            session_id: session_key.as_str().to_string(),
            student_id: participant_id.as_str().to_string(),
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;
        let dto: ProbeResponseDto = decode(response).await?;
        Ok(dto.into())
    }

    async fn report(&self, report: LatencyReport) -> Result<(), GatewayError> {
        let url = self.endpoint(&["api", "latency", "report"])?;
        let body = LatencyReportDto::from(report);

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(GatewayError::Status(status.as_u16()))
        }
    }
}

#[async_trait]
impl QuizApi for HttpClassroomApi {
    async fn answered_question_ids(
        &self,
        session_key: &SessionKey,
        participant_id: &ParticipantId,
    ) -> Result<Vec<String>, GatewayError> {
        let mut url = self.endpoint(&["api", "sessions", session_key.as_str(), "answers"])?;
        url.query_pairs_mut()
            .append_pair("student_id", participant_id.as_str());

        let dto: AnsweredQuestionsResponseDto = self.get_json(url).await?;
        Ok(dto
            .answered_question_ids
            .into_iter()
            .map(String::from)
            .collect())
    }

    async fn active_quiz(
        &self,
        session_key: &SessionKey,
        participant_id: &ParticipantId,
    ) -> Result<Option<QuizEvent>, GatewayError> {
        let mut url = self.endpoint(&["api", "sessions", session_key.as_str(), "active-quiz"])?;
        url.query_pairs_mut()
            .append_pair("student_id", participant_id.as_str());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;
        // 404 は「進行中の quiz なし」として扱う
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let dto: ActiveQuizResponseDto = decode(response).await?;
        if !dto.success {
            return Ok(None);
        }
        Ok(dto.quiz.map(|payload| payload.into_event(session_key)))
    }
}
