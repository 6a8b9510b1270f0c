//! ドメイン層のエラー型
//!
//! ポート（Repository / Gateway / Transport）ごとにエラーを分け、
//! 上位層が失敗の種類で振る舞いを変えられるようにします。

use thiserror::Error;

/// 値オブジェクトの生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// 空文字列（前後の空白を除いた後）
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// 最大長を超過
    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    /// 未知の値
    #[error("unknown {field}: '{value}'")]
    Unknown { field: &'static str, value: String },
}

/// 永続ストレージ（KeyValueStore）のエラー
#[derive(Debug, Error)]
pub enum StorageError {
    /// 読み書きの I/O エラー
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 保存内容の破損
    #[error("storage is corrupted: {0}")]
    Corrupted(String),

    /// ロックの取得失敗
    #[error("storage lock poisoned")]
    Poisoned,
}

/// HTTP ゲートウェイ（latency / quiz エンドポイント）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// リクエストの送信失敗（タイムアウト含む）
    #[error("request failed: {0}")]
    Request(String),

    /// サーバーが成功以外のステータスを返した
    #[error("unexpected status {0}")]
    Status(u16),

    /// レスポンスの形式が不正
    #[error("malformed response: {0}")]
    Decode(String),

    /// URL の組み立て失敗
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}

/// リアルタイムチャネル（Transport / Connector）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// 接続確立の失敗
    #[error("failed to connect: {0}")]
    Connect(String),

    /// 送信失敗
    #[error("failed to send: {0}")]
    Send(String),

    /// 受信失敗
    #[error("failed to receive: {0}")]
    Receive(String),

    /// URL の組み立て失敗
    #[error("invalid channel url: {0}")]
    InvalidUrl(String),
}
