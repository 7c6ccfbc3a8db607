//! Structured login result.

use crate::error::AuthError;
use crate::net::types::User;

/// Result of `AuthSession::login`. Callers branch on `success`.
#[derive(Clone, Debug, PartialEq)]
pub struct LoginOutcome {
    pub success: bool,
    pub user: Option<User>,
    pub error: Option<AuthError>,
}

impl LoginOutcome {
    #[must_use]
    pub fn succeeded(user: User) -> Self {
        Self { success: true, user: Some(user), error: None }
    }

    #[must_use]
    pub fn failed(error: AuthError) -> Self {
        Self { success: false, user: None, error: Some(error) }
    }

    /// User-facing failure message, if any.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Convert to a `Result` for `?`-style callers.
    ///
    /// # Errors
    ///
    /// Returns the recorded `AuthError` for a failed outcome.
    pub fn into_result(self) -> Result<User, AuthError> {
        match (self.success, self.user) {
            (true, Some(user)) => Ok(user),
            _ => Err(self.error.unwrap_or(AuthError::MalformedResponse)),
        }
    }
}
