//! Runtime configuration and fixed intervals

use std::time::Duration;

/// Default SQLite file for the local cache
pub const DEFAULT_DB_PATH: &str = "gymplanner.db";

/// Log file used while the dashboard owns the terminal
pub const TUI_LOG_PATH: &str = "gymplanner.log";

/// Background push period
pub const SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Upper bound for one remote request, connect to last byte
pub const REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Rest timer default and the range the UI allows
pub const DEFAULT_REST_SECS: u32 = 90;
pub const MIN_REST_SECS: u32 = 10;
pub const MAX_REST_SECS: u32 = 600;

/// Threshold for the "needs attention" muscle group list
pub const DEFAULT_INACTIVE_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    /// Pre-issued user token; without it the session is anonymous
    pub access_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// `None` runs against an in-memory remote store
    pub supabase: Option<SupabaseConfig>,
    pub notifications: bool,
    pub sound: bool,
    pub rest_secs: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            supabase: None,
            notifications: true,
            sound: true,
            rest_secs: DEFAULT_REST_SECS,
        }
    }
}

impl Config {
    /// Supabase settings are used only when both URL and key are present
    pub fn with_remote(mut self, url: Option<String>, anon_key: Option<String>, access_token: Option<String>) -> Self {
        self.supabase = match (url, anon_key) {
            (Some(url), Some(anon_key)) if !url.is_empty() && !anon_key.is_empty() => Some(SupabaseConfig {
                url,
                anon_key,
                access_token: access_token.filter(|t| !t.is_empty()),
            }),
            _ => None,
        };
        self
    }

    /// Clamp to what the timer UI accepts
    pub fn clamp_rest(secs: u32) -> u32 {
        secs.clamp(MIN_REST_SECS, MAX_REST_SECS)
    }
}
