//! Runtime configuration for the sync layer.
//!
//! Values come from environment variables with the defaults the production
//! deployment uses. The console binary layers CLI flags on top.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://disasterresponseapi.onrender.com";
pub const DEFAULT_USER_ID: &str = "netrunnerX";
const DEFAULT_MIN_CALL_INTERVAL_MS: u64 = 2000;
const DEFAULT_DEBOUNCE_MS: u64 = 2000;

/// Endpoints, identity, and timing knobs for one client session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// HTTP origin of the REST API (no `/api` suffix).
    pub api_base_url: String,
    /// Origin of the push server; usually the same host as the API.
    pub push_url: String,
    /// Acting user sent in `X-User-ID` until the operator switches users.
    pub user_id: String,
    /// Minimum spacing between two fetches of the same view.
    pub min_call_interval: Duration,
    /// Trailing coalescing delay for push notifications.
    pub debounce: Duration,
}

impl SyncConfig {
    /// Load config from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config from an arbitrary key lookup (environment, test map, ...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_base_url = lookup("RELIEF_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());
        let push_url = lookup("RELIEF_PUSH_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| api_base_url.clone());
        let user_id = lookup("RELIEF_USER_ID")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USER_ID.to_owned());
        let interval_ms = parse_or(lookup("RELIEF_MIN_CALL_INTERVAL_MS"), DEFAULT_MIN_CALL_INTERVAL_MS);
        let debounce_ms = parse_or(lookup("RELIEF_DEBOUNCE_MS"), DEFAULT_DEBOUNCE_MS);

        Self {
            api_base_url,
            push_url,
            user_id,
            min_call_interval: Duration::from_millis(interval_ms),
            debounce: Duration::from_millis(debounce_ms),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T>(raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}
