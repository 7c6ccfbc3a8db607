//! Error taxonomy shared across the console client.
//!
//! ERROR HANDLING
//! ==============
//! Transport-level failures are `ApiError` (cloneable so one in-flight result
//! can be handed to every waiting caller). Session-level failures are
//! `AuthError`, which is what login outcomes and route redirects carry.
//! Nothing here is fatal to the process.

// =============================================================================
// ERROR CODES
// =============================================================================

/// Machine-readable classification for errors that cross a module boundary.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Failures of the key/value backend behind the credential store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_STORAGE_IO",
            Self::Serialize(_) => "E_STORAGE_SERIALIZE",
        }
    }
}

// =============================================================================
// API
// =============================================================================

/// Failures surfaced by the API client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The backend could not be reached or the connection broke mid-request.
    #[error("network request failed: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not valid JSON.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The response was valid JSON but lacked required fields.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// True when the backend rejected the bearer token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }

    /// True for 401 and 403. Query retries stop here.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_NETWORK",
            Self::Status { status: 401, .. } => "E_UNAUTHORIZED",
            Self::Status { status: 403, .. } => "E_FORBIDDEN",
            Self::Status { .. } => "E_STATUS",
            Self::Decode(_) => "E_DECODE",
            Self::MalformedResponse(_) => "E_MALFORMED_RESPONSE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Session-level failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Backend unreachable or returned a non-2xx status.
    #[error("{0}")]
    NetworkFailure(String),

    /// Login response lacked a token or a user record.
    #[error("Invalid login response")]
    MalformedResponse,

    /// Credentials were valid but the account is not an administrator.
    #[error("Access denied. Admin privileges required.")]
    AuthorizationDenied,

    /// The persisted user record could not be parsed.
    #[error("stored user record is corrupt")]
    StorageCorruption,

    /// Persisting credentials failed.
    #[error("credential storage failed: {0}")]
    Storage(String),

    /// An operation required a signed-in user.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A partial user update produced an invalid user record.
    #[error("invalid user update: {0}")]
    InvalidUserUpdate(String),
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NetworkFailure(_) => "E_NETWORK_FAILURE",
            Self::MalformedResponse => "E_MALFORMED_RESPONSE",
            Self::AuthorizationDenied => "E_AUTHORIZATION_DENIED",
            Self::StorageCorruption => "E_STORAGE_CORRUPTION",
            Self::Storage(_) => "E_STORAGE",
            Self::NotAuthenticated => "E_NOT_AUTHENTICATED",
            Self::InvalidUserUpdate(_) => "E_INVALID_USER_UPDATE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::NetworkFailure(_))
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::MalformedResponse(_) | ApiError::Decode(_) => Self::MalformedResponse,
            ApiError::Status { message, .. } | ApiError::Network(message) => Self::NetworkFailure(message),
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("http client setup failed: {0}")]
    HttpClient(String),
}

impl From<reqwest::Error> for ConfigError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpClient(err.to_string())
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
