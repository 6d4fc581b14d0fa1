use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user visibility settings, row of the `user_profiles` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    #[serde(default)]
    pub is_public: bool,
}

impl UserProfile {
    /// Profile created on first sign-in
    pub fn private(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_public: false,
        }
    }
}

/// Partial row returned by `select=is_public`
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileVisibility {
    #[serde(default)]
    pub is_public: Option<bool>,
}
