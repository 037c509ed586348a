use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// A user row without credentials.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// A user row as needed to check a password.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub role: String,
}

/// Both fields are optional on the wire so that a missing one yields the
/// same message as an empty one.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialsRequest {
    /// Returns the trimmed username and raw password when both are non-empty.
    pub fn parts(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().map(str::trim)?;
        let password = self.password.as_deref()?;
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some((username, password))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credentials_parts() {
        let req: CredentialsRequest =
            serde_json::from_value(json!({"username": " alice ", "password": "pw"})).unwrap();
        assert_eq!(req.parts(), Some(("alice", "pw")));

        let req: CredentialsRequest = serde_json::from_value(json!({"username": "alice"})).unwrap();
        assert_eq!(req.parts(), None);

        let req: CredentialsRequest =
            serde_json::from_value(json!({"username": "  ", "password": "pw"})).unwrap();
        assert_eq!(req.parts(), None);
    }

    #[test]
    fn test_token_pair_is_camel_case() {
        let value = serde_json::to_value(TokenPairResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
        })
        .unwrap();
        assert_eq!(value, json!({"accessToken": "a", "refreshToken": "r"}));
    }
}
