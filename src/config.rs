//! Console configuration parsed from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{CacheConfig, DEFAULT_RETRIES, DEFAULT_RETRY_BASE_MS, DEFAULT_STALE_SECS};
use crate::error::ConfigError;
use crate::net::Timeouts;
use crate::net::http::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_STORAGE_PATH: &str = ".console/credentials.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub storage_path: PathBuf,
    pub cache: CacheConfig,
    pub timeouts: Timeouts,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            cache: CacheConfig::default(),
            timeouts: Timeouts::default(),
        }
    }
}

impl ConsoleConfig {
    /// Build typed console config from environment variables.
    ///
    /// Optional:
    /// - `CONSOLE_API_URL`: default `http://localhost:5000`
    /// - `CONSOLE_STORAGE_PATH`: default `.console/credentials.json`
    /// - `CONSOLE_STALE_SECS`: default 300
    /// - `CONSOLE_QUERY_RETRIES`: default 1
    /// - `CONSOLE_RETRY_BASE_MS`: default 1000
    /// - `CONSOLE_REFETCH_ON_FOCUS`: default false
    /// - `CONSOLE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CONSOLE_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for any value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // An unset variable falls back to its default.
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for any value that does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("CONSOLE_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned())
            .trim()
            .trim_end_matches('/')
            .to_owned();
        let storage_path = lookup("CONSOLE_STORAGE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH), PathBuf::from);

        let cache = CacheConfig {
            stale_time: Duration::from_secs(env_parse(&lookup, "CONSOLE_STALE_SECS", DEFAULT_STALE_SECS)?),
            retries: env_parse(&lookup, "CONSOLE_QUERY_RETRIES", DEFAULT_RETRIES)?,
            retry_base: Duration::from_millis(env_parse(&lookup, "CONSOLE_RETRY_BASE_MS", DEFAULT_RETRY_BASE_MS)?),
            refetch_on_window_focus: env_bool(&lookup, "CONSOLE_REFETCH_ON_FOCUS", false)?,
        };
        let timeouts = Timeouts {
            request_secs: env_parse(&lookup, "CONSOLE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse(&lookup, "CONSOLE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };

        Ok(Self { api_url, storage_path, cache, timeouts })
    }
}

fn env_parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| invalid(key, &raw)),
    }
}

fn env_bool<F>(lookup: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, &raw)),
    }
}

fn invalid(key: &str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue { key: key.to_owned(), value: raw.to_owned() }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
