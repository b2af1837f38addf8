//! In-memory remote store for offline sessions and tests

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, anyhow, bail};

use super::{ANONYMOUS_USER, ExerciseRow, ProgressLogRow, RemoteStore};

type Key = (String, String);

/// Tables keyed by (user_id, id), so upserts replace in place
pub struct MemoryRemote {
    user: String,
    exercises: Mutex<BTreeMap<Key, ExerciseRow>>,
    logs: Mutex<BTreeMap<Key, ProgressLogRow>>,
    rejected_ids: Mutex<HashSet<String>>,
    unreachable: AtomicBool,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new(ANONYMOUS_USER)
    }
}

impl MemoryRemote {
    pub fn new(user: &str) -> Self {
        Self {
            user: user.to_string(),
            exercises: Mutex::new(BTreeMap::new()),
            logs: Mutex::new(BTreeMap::new()),
            rejected_ids: Mutex::new(HashSet::new()),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Make every call fail as if the network were down
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Make upserts of this item id fail
    pub fn reject_id(&self, id: &str) {
        if let Ok(mut ids) = self.rejected_ids.lock() {
            ids.insert(id.to_string());
        }
    }

    pub fn exercise_rows(&self) -> Vec<ExerciseRow> {
        self.exercises
            .lock()
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn log_rows(&self) -> Vec<ProgressLogRow> {
        self.logs
            .lock()
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    fn check(&self, id: Option<&str>) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            bail!("remote store unreachable");
        }
        if let Some(id) = id {
            let rejected = self
                .rejected_ids
                .lock()
                .map_err(|_| anyhow!("lock poisoned"))?
                .contains(id);
            if rejected {
                bail!("upsert of {} rejected", id);
            }
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemote {
    async fn current_user(&self) -> Result<String> {
        self.check(None)?;
        Ok(self.user.clone())
    }

    async fn upsert_exercise(&self, row: &ExerciseRow) -> Result<()> {
        self.check(Some(&row.id))?;
        let mut table = self.exercises.lock().map_err(|_| anyhow!("lock poisoned"))?;
        table.insert((row.user_id.clone(), row.id.clone()), row.clone());
        Ok(())
    }

    async fn upsert_progress_log(&self, row: &ProgressLogRow) -> Result<()> {
        self.check(Some(&row.id))?;
        let mut table = self.logs.lock().map_err(|_| anyhow!("lock poisoned"))?;
        table.insert((row.user_id.clone(), row.id.clone()), row.clone());
        Ok(())
    }

    async fn select_exercises(&self, user_id: &str) -> Result<Vec<ExerciseRow>> {
        self.check(None)?;
        let table = self.exercises.lock().map_err(|_| anyhow!("lock poisoned"))?;
        Ok(table
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn select_progress_logs(&self, user_id: &str) -> Result<Vec<ProgressLogRow>> {
        self.check(None)?;
        let table = self.logs.lock().map_err(|_| anyhow!("lock poisoned"))?;
        let mut rows: Vec<_> = table
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }
}
