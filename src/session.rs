use anyhow::{bail, Context, Result};
use tracing::info;

use crate::api::{Credentials, User};
use crate::data::IdentityService;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("not signed in: set auth.session_id (or BOOKCLUB_AUTH__SESSION_ID)")]
    NotSignedIn,
}

/// The authenticated caller. Passed explicitly to every call site that needs
/// the caller's identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user: User,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    /// Resolves the identity behind previously issued backend credentials.
    pub fn resume(credentials: &Credentials, identity: &dyn IdentityService) -> Result<Self> {
        if credentials.session_id.is_empty() {
            bail!(SessionError::NotSignedIn);
        }
        let user = identity.current_user().context("resume session")?;
        info!(username = %user.username, "session resumed");
        Ok(Self::new(user))
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }

    pub fn greeting(&self) -> String {
        format!("Welcome, {}!", self.user.username)
    }

    pub fn is_author(&self, author_name: &str) -> bool {
        !author_name.is_empty() && author_name == self.user.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error;

    struct FixedIdentity;

    impl IdentityService for FixedIdentity {
        fn current_user(&self) -> error::Result<User> {
            Ok(User {
                id: 1,
                username: "ana".into(),
                first_name: String::new(),
                last_name: String::new(),
            })
        }
    }

    #[test]
    fn resume_requires_session_cookie() {
        let err = Session::resume(&Credentials::default(), &FixedIdentity).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::NotSignedIn)
        ));
    }

    #[test]
    fn resume_uses_backend_identity() {
        let credentials = Credentials {
            session_id: "abc".into(),
            csrf_token: String::new(),
        };
        let session = Session::resume(&credentials, &FixedIdentity).unwrap();
        assert_eq!(session.username(), "ana");
        assert_eq!(session.greeting(), "Welcome, ana!");
        assert!(session.is_author("ana"));
        assert!(!session.is_author("bo"));
    }
}
