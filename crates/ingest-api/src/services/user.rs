//! User resolution: maps a verified external identity onto the domain
//! `User`, creating the row on first authenticated request.

use ingest_db::UserRepository;
use ingest_models::User;

use crate::auth::AuthUser;
use crate::error::ApiResult;

/// Thin wrapper around [`UserRepository`] for the identity-linking step
/// every authenticated request goes through.
#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
}

impl UserService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    /// Resolve the authenticated caller to a domain `User`, creating one
    /// if this is the first request from this external identity.
    pub async fn resolve(&self, auth: &AuthUser) -> ApiResult<User> {
        let candidate = User::new_from_verified_identity(
            auth.uid.clone(),
            email_or_placeholder(auth),
            auth.email_verified,
        );
        let user = self.users.get_or_create(&candidate).await?;
        Ok(user)
    }
}

/// Firebase ID tokens for phone-auth or anonymous identities may carry no
/// email; `User.email` is non-nullable, so such identities fall back to a
/// synthetic, per-identity placeholder rather than failing resolution.
fn email_or_placeholder(auth: &AuthUser) -> String {
    auth.email
        .clone()
        .unwrap_or_else(|| format!("{}@no-email.invalid", auth.uid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_email_is_deterministic_per_uid() {
        let auth = AuthUser {
            uid: "abc123".to_string(),
            email: None,
            email_verified: false,
        };
        assert_eq!(email_or_placeholder(&auth), "abc123@no-email.invalid");
    }
}
