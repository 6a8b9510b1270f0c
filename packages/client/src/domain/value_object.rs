//! 値オブジェクト
//!
//! セッションキーと参加者 ID は接続先 URL のパスに埋め込まれるため、
//! 生成時に検証して不正な値がチャネル層に流れないようにします。

use std::fmt;

use super::error::ValueObjectError;

/// 識別子の最大長
const MAX_IDENTIFIER_LENGTH: usize = 128;

fn validate_identifier(field: &'static str, value: String) -> Result<String, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValueObjectError::Empty(field));
    }

    let length = trimmed.chars().count();
    if length > MAX_IDENTIFIER_LENGTH {
        return Err(ValueObjectError::TooLong {
            field,
            max: MAX_IDENTIFIER_LENGTH,
            actual: length,
        });
    }

    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}

/// セッションキー（授業セッションの識別子）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    /// 新しい SessionKey を作成（前後の空白は除去される）
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_identifier("session key", value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for SessionKey {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 参加者 ID（学生 ID / 講師 ID）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// 新しい ParticipantId を作成（前後の空白は除去される）
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_identifier("participant id", value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
