//! Wire DTOs for the console backend.
//!
//! DESIGN
//! ======
//! `User` keeps unknown backend fields in `extra` so a shallow merge followed by
//! re-persistence never drops data the console does not model. The login
//! response is normalized here, at the boundary, into a `LoginGrant`.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

// =============================================================================
// ROLE
// =============================================================================

/// Account role. Only `Admin` may enter protected console views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    /// Any role string the console does not recognize, kept verbatim.
    Other(String),
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::Other(raw) => raw,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "admin" => Self::Admin,
            "teacher" => Self::Teacher,
            "student" => Self::Student,
            _ => Self::Other(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// USER
// =============================================================================

/// A console user as returned by the login endpoint and persisted locally.
///
/// Decoding reads `id` and falls back to `_id`; numeric ids are normalized to
/// strings. When both are present `_id` is kept in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct User {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Missing roles decode as an empty `Other`, which is never admin.
    pub role: Role,
    /// Backend fields the console does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for User {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_fields(fields).map_err(D::Error::custom)
    }
}

impl User {
    fn from_fields(mut fields: Map<String, Value>) -> Result<Self, String> {
        let id = match fields.remove("id") {
            Some(id) => id,
            None => fields.remove("_id").ok_or("missing field `id`")?,
        };
        let id = id_string(id)?;
        let name = optional_string(&mut fields, "name")?;
        let email = optional_string(&mut fields, "email")?;
        let role = optional_string(&mut fields, "role")?.map(Role::from).unwrap_or_default();
        Ok(Self { id, name, email, role, extra: fields })
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Shallow-merge `partial` over this user: top-level keys in `partial`
    /// replace the existing ones, everything else is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged object no longer decodes as a `User`
    /// (for example `id` set to `null`).
    pub fn merged(&self, partial: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut base = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in partial {
            base.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(base))
    }
}

fn id_string(value: Value) -> Result<String, String> {
    match value {
        Value::String(id) => Ok(id),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(format!("expected string or number id, got {other}")),
    }
}

fn optional_string(fields: &mut Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match fields.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(other) => Err(format!("invalid {key}: expected string, got {other}")),
    }
}

// =============================================================================
// LOGIN
// =============================================================================

/// Body of `POST /api/auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A normalized, complete login response.
#[derive(Clone, Debug, PartialEq)]
pub struct LoginGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: User,
}

#[derive(Default, Deserialize)]
struct LoginFields {
    #[serde(default, rename = "accessToken")]
    access_token: Option<String>,
    /// Older spelling of `accessToken`.
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "refreshToken")]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<Value>,
}

/// Decode a login response body into a `LoginGrant`.
///
/// The canonical envelope is top-level (`{accessToken, refreshToken?, user}`).
/// When the top level carries no token, a nested `{data: {...}}` envelope is
/// accepted as a compatibility shim. The two shapes are never mixed.
///
/// # Errors
///
/// Returns `ApiError::MalformedResponse` when the token or the user record is
/// missing, empty, or undecodable.
pub fn decode_login(body: Value) -> Result<LoginGrant, ApiError> {
    let fields = login_fields(body)?;

    let access_token = fields
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::MalformedResponse("missing accessToken".into()))?;

    let user_value = fields
        .user
        .filter(|user| !user.is_null())
        .ok_or_else(|| ApiError::MalformedResponse("missing user".into()))?;
    let user: User =
        serde_json::from_value(user_value).map_err(|e| ApiError::MalformedResponse(format!("invalid user: {e}")))?;

    let refresh_token = fields.refresh_token.filter(|token| !token.is_empty());

    Ok(LoginGrant { access_token, refresh_token, user })
}

fn login_fields(body: Value) -> Result<LoginFields, ApiError> {
    let Value::Object(mut top) = body else {
        return Err(ApiError::MalformedResponse("expected JSON object".into()));
    };

    let nested = top.remove("data");
    let top_fields = parse_fields(Value::Object(top))?;
    if top_fields.access_token.is_some() {
        return Ok(top_fields);
    }

    match nested {
        Some(data @ Value::Object(_)) => parse_fields(data),
        _ => Ok(top_fields),
    }
}

fn parse_fields(value: Value) -> Result<LoginFields, ApiError> {
    let mut fields: LoginFields =
        serde_json::from_value(value).map_err(|e| ApiError::MalformedResponse(e.to_string()))?;
    if fields.access_token.as_deref().is_none_or(str::is_empty) {
        fields.access_token = fields.token.take();
    }
    Ok(fields)
}
