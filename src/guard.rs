//! Route guard for console views.
//!
//! A pure decision over the current `Session` snapshot. Nothing protected is
//! rendered while the session is still loading.

use crate::session::{Session, SessionPhase};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// Paths reachable without an admin session.
const PUBLIC_PATHS: &[&str] = &[LOGIN_PATH];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardNotice {
    /// Signed in, but not with an admin account.
    AdminRequired,
}

impl GuardNotice {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::AdminRequired => "Access denied. Admin privileges required.",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not settled yet; show a loading placeholder.
    Placeholder,
    Render { path: String },
    Redirect { to: String, from: Option<String>, notice: Option<GuardNotice> },
}

impl GuardDecision {
    #[must_use]
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render { .. })
    }
}

#[must_use]
pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&normalize(path))
}

/// Decide what to show for `path` given the current session.
#[must_use]
pub fn guard(session: &Session, path: &str) -> GuardDecision {
    let phase = session.phase();
    if phase == SessionPhase::Loading {
        return GuardDecision::Placeholder;
    }

    if is_public(path) {
        if session.is_admin() {
            return redirect(HOME_PATH, None, None);
        }
        return GuardDecision::Render { path: path.to_owned() };
    }

    match phase {
        SessionPhase::Authenticated if session.is_admin() => GuardDecision::Render { path: path.to_owned() },
        SessionPhase::Authenticated => redirect(LOGIN_PATH, Some(path), Some(GuardNotice::AdminRequired)),
        _ => redirect(LOGIN_PATH, Some(path), None),
    }
}

fn redirect(to: &str, from: Option<&str>, notice: Option<GuardNotice>) -> GuardDecision {
    GuardDecision::Redirect { to: to.to_owned(), from: from.map(str::to_owned), notice }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => HOME_PATH,
        trimmed => trimmed,
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
