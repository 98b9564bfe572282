//! User entity.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a user, locally assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Subscription tier, gating quotas outside the indexing pipeline itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserTier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

/// A user, created on first authenticated request linking a verified
/// external identity. Never destroyed; soft-delete is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct User {
    pub user_id: UserId,
    /// Opaque identifier from the identity provider. Unique across users.
    /// Nullable only during a transitional sync from a legacy identity.
    pub external_auth_id: Option<String>,
    pub email: String,
    pub email_verified: bool,
    pub tier: UserTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user from a verified external identity, as happens on
    /// first authenticated request.
    pub fn new_from_verified_identity(
        external_auth_id: impl Into<String>,
        email: impl Into<String>,
        email_verified: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            external_auth_id: Some(external_auth_id.into()),
            email: email.into(),
            email_verified,
            tier: UserTier::Free,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_defaults_to_free_tier() {
        let u = User::new_from_verified_identity("idp|abc123", "a@example.com", true);
        assert_eq!(u.tier, UserTier::Free);
        assert_eq!(u.external_auth_id.as_deref(), Some("idp|abc123"));
    }
}
