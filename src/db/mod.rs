//! Local cache - SQLite key-value store for the plan and log documents

use anyhow::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::model::{ProgressLog, WeeklyPlan};

pub const PLAN_KEY: &str = "gp_weekly_plan_v1";
pub const LOGS_KEY: &str = "gp_progress_logs_v1";

/// JSON documents keyed by name, persisted on the device
pub struct LocalCache {
    conn: Connection,
}

impl LocalCache {
    /// Open or create the cache file
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Throwaway cache, used by tests and `--offline` dry runs
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Read and parse a document, falling back to `fallback` on any failure
    pub fn safe_get<T, F>(&self, key: &str, fallback: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.get_raw(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    debug!("Cache entry {} unreadable, using default: {}", key, e);
                    fallback()
                }
            },
            Ok(None) => fallback(),
            Err(e) => {
                debug!("Cache read for {} failed: {}", key, e);
                fallback()
            }
        }
    }

    /// Serialize and write a document; errors are swallowed
    pub fn safe_set<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.set_raw(key, &json));

        if let Err(e) = result {
            debug!("Cache write for {} failed: {}", key, e);
        }
    }

    pub fn load_plan(&self) -> WeeklyPlan {
        self.safe_get(PLAN_KEY, WeeklyPlan::default)
    }

    pub fn load_logs(&self) -> Vec<ProgressLog> {
        self.safe_get(LOGS_KEY, Vec::new)
    }

    pub fn save_plan(&self, plan: &WeeklyPlan) {
        self.safe_set(PLAN_KEY, plan);
    }

    pub fn save_logs(&self, logs: &[ProgressLog]) {
        self.safe_set(LOGS_KEY, &logs);
    }
}
