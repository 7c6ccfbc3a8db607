//! Credential store: access token, optional refresh token, and user record.
//!
//! INVARIANTS
//! ==========
//! - The three keys are written and cleared together.
//! - Without an access token the user record is treated as absent.
//! - A user record or backend file that fails to parse clears all three keys on load.

use std::sync::Arc;

use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::StorageError;
use crate::net::types::User;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

/// A complete, consistent set of persisted credentials.
#[derive(Clone, Debug, PartialEq)]
pub struct CredentialRecord {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: User,
}

#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Persist a full credential record. A missing refresh token removes any
    /// previously stored one.
    ///
    /// # Errors
    ///
    /// Returns an error if the user cannot be serialized or the backend write fails.
    pub fn save(&self, access_token: &str, refresh_token: Option<&str>, user: &User) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(user)?;
        self.backend.set(ACCESS_TOKEN_KEY, access_token)?;
        match refresh_token {
            Some(token) => self.backend.set(REFRESH_TOKEN_KEY, token)?,
            None => self.backend.remove(REFRESH_TOKEN_KEY)?,
        }
        self.backend.set(USER_KEY, &user_json)?;
        debug!(user_id = %user.id, "credentials saved");
        Ok(())
    }

    /// Re-persist only the user record, leaving tokens untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the user cannot be serialized or the backend write fails.
    pub fn save_user(&self, user: &User) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(user)?;
        self.backend.set(USER_KEY, &user_json)
    }

    /// Load the persisted record, failing soft.
    ///
    /// Backend read failures and missing keys yield `None`. A corrupt user
    /// record or an unparseable backend also yields `None` and clears the store.
    #[must_use]
    pub fn load(&self) -> Option<CredentialRecord> {
        let user = match self.read_user() {
            Ok(user) => user,
            Err(LoadError::Corrupt(e)) => {
                warn!(error = %e, "stored credentials are corrupt; clearing them");
                self.clear_logged();
                return None;
            }
            Err(LoadError::Backend(e)) => {
                warn!(error = %e, "credential storage unreadable");
                return None;
            }
        };

        let access_token = match self.backend.get(ACCESS_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty())?,
            Err(e) => {
                warn!(error = %e, "credential storage unreadable");
                return None;
            }
        };

        let refresh_token = match self.backend.get(REFRESH_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "refresh token unreadable; ignoring");
                None
            }
        };

        Some(CredentialRecord { access_token, refresh_token, user: user? })
    }

    /// Current access token, if one is stored.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        match self.backend.get(ACCESS_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "access token unreadable");
                None
            }
        }
    }

    /// Remove all three keys. Every key is attempted even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns the first backend error encountered.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut first_err = None;
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.backend.remove(key) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// `clear`, with failures logged instead of returned.
    pub fn clear_logged(&self) {
        if let Err(e) = self.clear() {
            warn!(error = %e, "failed to clear credentials");
        }
    }

    fn read_user(&self) -> Result<Option<User>, LoadError> {
        let stored = self.backend.get(USER_KEY).map_err(|e| match e {
            // The backend file itself no longer parses.
            StorageError::Serialize(e) => LoadError::Corrupt(e),
            other => LoadError::Backend(other),
        })?;
        let Some(raw) = stored else {
            return Ok(None);
        };
        serde_json::from_str(&raw).map(Some).map_err(LoadError::Corrupt)
    }
}

enum LoadError {
    Backend(StorageError),
    Corrupt(serde_json::Error),
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
