//! Auth session manager for the console process.
//!
//! DESIGN
//! ======
//! One `AuthSession` exists per running client and is injected (as an `Arc`)
//! into whatever needs it. Its state lives in a `watch` channel: readers take
//! synchronous snapshots, route guards subscribe to transitions, and every
//! mutation goes through the operations below.
//!
//! LIFECYCLE
//! =========
//! `Loading` at construction, then `check_auth` settles it to `Authenticated`
//! or `Anonymous`. `login` and `logout` move between the two; `clear_auth`
//! resets to `Anonymous` from anywhere.

pub mod outcome;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::AuthError;
use crate::net::types::{LoginRequest, User};
use crate::net::ApiClient;
use crate::storage::CredentialStore;

pub use outcome::LoginOutcome;

// =============================================================================
// SESSION STATE
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Authenticated,
    Anonymous,
}

/// Snapshot of the current user's authentication status.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl Session {
    #[must_use]
    pub fn loading() -> Self {
        Self { user: None, is_authenticated: false, is_loading: true }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self { user: None, is_authenticated: false, is_loading: false }
    }

    #[must_use]
    pub fn authenticated(user: User) -> Self {
        Self { user: Some(user), is_authenticated: true, is_loading: false }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            SessionPhase::Loading
        } else if self.is_authenticated && self.user.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }

    /// Authenticated with an admin account.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.phase() == SessionPhase::Authenticated && self.user.as_ref().is_some_and(User::is_admin)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::loading()
    }
}

// =============================================================================
// AUTH SESSION
// =============================================================================

pub struct AuthSession {
    api: ApiClient,
    credentials: CredentialStore,
    state: watch::Sender<Session>,
}

impl AuthSession {
    #[must_use]
    pub fn new(api: ApiClient, credentials: CredentialStore) -> Self {
        let (state, _) = watch::channel(Session::loading());
        Self { api, credentials, state }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Settle the session from persisted credentials. Idempotent.
    ///
    /// A corrupt stored user record is cleared by the credential store and
    /// the session degrades to anonymous.
    pub fn check_auth(&self) -> Session {
        let next = match self.credentials.load() {
            Some(record) => Session::authenticated(record.user),
            None => Session::anonymous(),
        };
        self.publish(next.clone());
        next
    }

    /// Log in with email and password. Only admin accounts are accepted.
    ///
    /// Never fails outright: branch on `LoginOutcome::success`. On failure
    /// storage is untouched and the previous session is kept, except when
    /// persisting the new credentials fails: then the session is cleared.
    pub async fn login(&self, credentials: &LoginRequest) -> LoginOutcome {
        self.state.send_modify(|s| s.is_loading = true);

        match self.try_login(credentials).await {
            Ok(user) => {
                info!(user_id = %user.id, "login succeeded");
                self.publish(Session::authenticated(user.clone()));
                LoginOutcome::succeeded(user)
            }
            Err(err) => {
                warn!(email = %credentials.email, error = %err, "login failed");
                self.state.send_modify(|s| s.is_loading = false);
                LoginOutcome::failed(err)
            }
        }
    }

    async fn try_login(&self, credentials: &LoginRequest) -> Result<User, AuthError> {
        let grant = self.api.login(credentials).await?;
        if !grant.user.is_admin() {
            return Err(AuthError::AuthorizationDenied);
        }
        if let Err(e) = self
            .credentials
            .save(&grant.access_token, grant.refresh_token.as_deref(), &grant.user)
        {
            // A partial write may have replaced the previous token.
            self.clear_auth();
            return Err(e.into());
        }
        Ok(grant.user)
    }

    /// Log out. The backend is notified best-effort; the local session is
    /// cleared whether or not that call succeeds.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!(error = %e, "logout notification failed; clearing local session anyway");
        }
        self.clear_auth();
        info!("logged out");
    }

    /// Wipe stored credentials and reset to anonymous.
    pub fn clear_auth(&self) {
        self.credentials.clear_logged();
        self.publish(Session::anonymous());
    }

    /// Shallow-merge `partial` into the current user and re-persist it.
    /// The role is not re-validated.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` without a current user, `InvalidUserUpdate` if the
    /// merge yields an undecodable user, `Storage` if persisting fails.
    pub fn update_user(&self, partial: &Map<String, Value>) -> Result<User, AuthError> {
        let current = self.state.borrow().user.clone().ok_or(AuthError::NotAuthenticated)?;
        let merged = current
            .merged(partial)
            .map_err(|e| AuthError::InvalidUserUpdate(e.to_string()))?;
        self.credentials.save_user(&merged)?;
        self.state.send_modify(|s| s.user = Some(merged.clone()));
        Ok(merged)
    }

    fn publish(&self, next: Session) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
