use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity record persisted next to the token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Bearer credentials issued by the auth endpoint
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl SessionTokens {
    /// Tokens within a minute of expiry count as expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - 60 <= Utc::now().timestamp(),
            None => false,
        }
    }
}

/// An authenticated session: identity plus bearer token
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: AuthUser,
    pub tokens: SessionTokens,
}

impl Session {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn access_token(&self) -> &str {
        &self.tokens.access_token
    }
}
