//! Participant identity as provided by the authenticated user context.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{error::ValueObjectError, value_object::ParticipantId};

/// Role of the participant within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }

    /// Only students re-establish presence automatically after a restart.
    pub fn auto_rejoins(&self) -> bool {
        matches!(self, Role::Student)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValueObjectError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "instructor" => Ok(Role::Instructor),
            "admin" => Ok(Role::Admin),
            other => Err(ValueObjectError::Unknown {
                field: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Who is connecting. Immutable for the lifetime of an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantIdentity {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub email: Option<String>,
    pub role: Role,
}

impl ParticipantIdentity {
    pub fn new(participant_id: ParticipantId, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            participant_id,
            display_name: display_name.into(),
            email: None,
            role,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str_is_case_insensitive() {
        // テスト項目: ロール名は大文字小文字を区別せずに解釈される
        // given (前提条件):
        let inputs = ["Student", "INSTRUCTOR", " admin "];

        // when (操作):
        let roles: Vec<Role> = inputs.iter().map(|s| s.parse().unwrap()).collect();

        // then (期待する結果):
        assert_eq!(roles, vec![Role::Student, Role::Instructor, Role::Admin]);
    }

    #[test]
    fn test_role_from_str_rejects_unknown() {
        // テスト項目: 未知のロール名はエラーになる
        // given (前提条件):
        let input = "ta";

        // when (操作):
        let result = input.parse::<Role>();

        // then (期待する結果):
        assert!(matches!(result, Err(ValueObjectError::Unknown { .. })));
    }

    #[test]
    fn test_only_students_auto_rejoin() {
        // テスト項目: 自動再参加の対象は student のみ
        // given (前提条件):
        let roles = [Role::Student, Role::Instructor, Role::Admin];

        // when (操作):
        let eligible: Vec<bool> = roles.iter().map(Role::auto_rejoins).collect();

        // then (期待する結果):
        assert_eq!(eligible, vec![true, false, false]);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        // テスト項目: ロールは小文字の文字列としてシリアライズされる
        // given (前提条件):
        let role = Role::Instructor;

        // when (操作):
        let json = serde_json::to_string(&role).unwrap();

        // then (期待する結果):
        assert_eq!(json, "\"instructor\"");
    }
}
