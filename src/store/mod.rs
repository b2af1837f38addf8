//! Workout state manager
//!
//! Holds the weekly plan and progress logs, applies mutations through a pure
//! reducer and notifies observers (the local cache persister) of each change.
//! Remote traffic is either awaited (initial load) or fire-and-forget
//! (immediate log upserts, background sync).

pub mod clock;
pub mod observer;
pub mod session;
pub mod state;

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::caps::{CapabilityProvider, Toast};
use crate::db::LocalCache;
use crate::model::{Day, Exercise, ExerciseDraft, LogDraft, ProgressLog, new_id};
use crate::remote::{ExerciseRow, ProgressLogRow, RemoteStore};

pub use observer::{CachePersister, Change, StateObserver};
pub use session::Session;
pub use state::{Action, WorkoutState};

/// Everything the initial load reads from the remote store
#[derive(Debug, Default)]
pub struct RemoteSnapshot {
    pub user_id: String,
    pub exercises: Vec<(Option<Day>, Exercise)>,
    pub logs: Vec<ProgressLog>,
}

/// Items pushed by one background sync
#[derive(Debug, Clone, Default)]
pub struct SyncPayload {
    pub exercises: Vec<(Day, Exercise)>,
    pub logs: Vec<ProgressLog>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed: usize,
    pub failed: usize,
}

pub struct WorkoutStore<R> {
    state: WorkoutState,
    observers: Vec<Box<dyn StateObserver>>,
    remote: Arc<R>,
    caps: Arc<dyn CapabilityProvider>,
    pending: JoinSet<()>,
}

impl<R: RemoteStore + 'static> WorkoutStore<R> {
    /// Seed state from the cache and subscribe the cache persister
    pub fn new(cache: LocalCache, remote: Arc<R>, caps: Arc<dyn CapabilityProvider>, today: NaiveDate) -> Self {
        let state = WorkoutState::new(cache.load_plan(), cache.load_logs(), today);
        let mut store = Self {
            state,
            observers: Vec::new(),
            remote,
            caps,
            pending: JoinSet::new(),
        };
        store.subscribe(Box::new(CachePersister::new(cache)));
        store
    }

    pub fn state(&self) -> &WorkoutState {
        &self.state
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    pub fn subscribe(&mut self, observer: Box<dyn StateObserver>) {
        self.observers.push(observer);
    }

    fn dispatch(&mut self, action: Action) {
        let next = self.state.reduce(action);
        let change = Change::between(&self.state, &next);
        self.state = next;

        if !change.is_empty() {
            for observer in &mut self.observers {
                observer.on_change(&self.state, change);
            }
        }
    }

    pub fn add_exercise(&mut self, day: Day, draft: ExerciseDraft) -> String {
        let id = new_id();
        let exercise = draft.with_id(id.clone());
        debug!("Adding {} to {}", exercise.name, day);
        self.dispatch(Action::AddExercise { day, exercise });
        id
    }

    pub fn remove_exercise(&mut self, day: Day, id: &str) {
        self.dispatch(Action::RemoveExercise {
            day,
            id: id.to_string(),
        });
    }

    /// Prepend a log, push it to the remote store in the background and
    /// confirm to the user
    pub fn add_progress_log(&mut self, draft: LogDraft) -> String {
        let id = new_id();
        let log = draft.with_id(id.clone());
        self.dispatch(Action::AddProgressLog(log.clone()));
        self.spawn_upsert(log);
        self.caps.toast(Toast::success("Progress logged successfully!"));
        id
    }

    fn spawn_upsert(&mut self, log: ProgressLog) {
        while self.pending.try_join_next().is_some() {}

        if tokio::runtime::Handle::try_current().is_err() {
            warn!("No async runtime, log {} stays local until the next sync", log.id);
            return;
        }

        let remote = Arc::clone(&self.remote);
        self.pending.spawn(async move {
            push(remote.as_ref(), SyncPayload { exercises: Vec::new(), logs: vec![log] }).await;
        });
    }

    /// Wait for fire-and-forget upserts still in flight
    pub async fn flush(&mut self) {
        while let Some(result) = self.pending.join_next().await {
            if let Err(e) = result {
                error!("Background upsert task failed: {}", e);
            }
        }
    }

    /// Initial load: remote logs win when present, otherwise local ones stay
    pub async fn load(&mut self) {
        let result = fetch(self.remote.as_ref()).await;
        self.apply_remote(result, Utc::now());
    }

    pub fn apply_remote(&mut self, result: Result<RemoteSnapshot>, now: DateTime<Utc>) {
        match result {
            Ok(snapshot) => {
                if !snapshot.exercises.is_empty() {
                    // Remote exercises are not merged into the plan
                    warn!(
                        "Ignoring {} remote exercises for {}; the plan comes from the local cache",
                        snapshot.exercises.len(),
                        snapshot.user_id
                    );
                }
                if !snapshot.logs.is_empty() {
                    info!("Loaded {} progress logs from remote", snapshot.logs.len());
                    self.dispatch(Action::ReplaceLogs(snapshot.logs));
                }
                self.dispatch(Action::LoadFinished { synced_at: Some(now) });
            }
            Err(e) => {
                error!("Failed to load data: {:#}", e);
                self.caps.toast(Toast::error("Failed to sync with database"));
                self.dispatch(Action::LoadFinished { synced_at: None });
            }
        }
    }

    pub fn sync_payload(&self) -> SyncPayload {
        SyncPayload {
            exercises: self.state.plan.flatten(),
            logs: self.state.logs.clone(),
        }
    }

    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.dispatch(Action::Synced { at });
    }

    /// Midnight rollover
    pub fn advance_day(&mut self, today: NaiveDate) {
        self.dispatch(Action::DayTick { today });
        info!("New day: {} ({})", today, self.state.today_name());
        self.caps.toast(Toast::success("New day started! 🌅"));
    }

    /// Push everything now and record the attempt
    pub async fn sync_now(&mut self) -> SyncReport {
        let report = push(self.remote.as_ref(), self.sync_payload()).await;
        self.mark_synced(Utc::now());
        report
    }
}

/// Read identity, exercises and logs. Rows that do not parse are skipped.
pub async fn fetch<R: RemoteStore>(remote: &R) -> Result<RemoteSnapshot> {
    let user_id = remote.current_user().await?;
    let exercise_rows = remote.select_exercises(&user_id).await?;
    let log_rows = remote.select_progress_logs(&user_id).await?;

    let exercises = exercise_rows
        .iter()
        .filter_map(|row| match row.to_exercise() {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("Skipping remote exercise {}: {}", row.id, e);
                None
            }
        })
        .collect();

    let logs = log_rows
        .iter()
        .filter_map(|row| match row.to_log() {
            Ok(l) => Some(l),
            Err(e) => {
                warn!("Skipping remote log {}: {}", row.id, e);
                None
            }
        })
        .collect();

    Ok(RemoteSnapshot {
        user_id,
        exercises,
        logs,
    })
}

/// Per-item upserts; one failure never stops the rest
pub async fn push<R: RemoteStore>(remote: &R, payload: SyncPayload) -> SyncReport {
    let mut report = SyncReport::default();

    let user_id = match remote.current_user().await {
        Ok(id) => id,
        Err(e) => {
            error!("Database sync error: {:#}", e);
            report.failed = payload.exercises.len() + payload.logs.len();
            return report;
        }
    };

    for (day, exercise) in &payload.exercises {
        match remote.upsert_exercise(&ExerciseRow::new(exercise, *day, &user_id)).await {
            Ok(()) => report.pushed += 1,
            Err(e) => {
                error!("Error syncing exercise {}: {:#}", exercise.id, e);
                report.failed += 1;
            }
        }
    }

    for log in &payload.logs {
        match remote.upsert_progress_log(&ProgressLogRow::new(log, &user_id)).await {
            Ok(()) => report.pushed += 1,
            Err(e) => {
                error!("Error syncing progress log {}: {:#}", log.id, e);
                report.failed += 1;
            }
        }
    }

    debug!("Sync finished: {} pushed, {} failed", report.pushed, report.failed);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::testing::Recorder;
    use crate::model::{MuscleGroup, WeeklyPlan};
    use crate::remote::{ANONYMOUS_USER, MemoryRemote};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store_with(cache: LocalCache, remote: Arc<MemoryRemote>) -> (WorkoutStore<MemoryRemote>, Arc<Recorder>) {
        let caps = Arc::new(Recorder::new());
        let store = WorkoutStore::new(cache, remote, caps.clone(), date(2024, 1, 15));
        (store, caps)
    }

    fn squat() -> ExerciseDraft {
        ExerciseDraft {
            name: "Squat".into(),
            muscle_group: MuscleGroup::Legs,
            sets: 5,
            reps: 5,
            weight: Some(100.0),
        }
    }

    fn remote_log(id: &str, d: &str) -> ProgressLogRow {
        ProgressLogRow {
            id: id.into(),
            date: d.into(),
            muscle_group: "Back".into(),
            weight: None,
            reps: Some(10),
            notes: None,
            created_at: None,
            user_id: ANONYMOUS_USER.into(),
        }
    }

    #[test]
    fn test_seeds_from_cache() {
        let cache = LocalCache::open_in_memory().unwrap();
        let logs = vec![LogDraft::new(date(2024, 1, 1), MuscleGroup::Core).with_id("local".into())];
        cache.save_logs(&logs);

        let (store, _) = store_with(cache, Arc::new(MemoryRemote::default()));
        assert_eq!(store.state().logs, logs);
        assert_eq!(store.state().plan, WeeklyPlan::default());
        assert!(store.state().is_loading);
    }

    #[test]
    fn test_add_and_remove_exercise() {
        let (mut store, _) = store_with(LocalCache::open_in_memory().unwrap(), Arc::new(MemoryRemote::default()));
        let id = store.add_exercise(Day::Tuesday, squat());
        let second = store.add_exercise(Day::Tuesday, squat());
        assert_ne!(id, second);
        assert_eq!(store.state().plan.day(Day::Tuesday).exercises.len(), 2);

        store.remove_exercise(Day::Tuesday, "missing");
        assert_eq!(store.state().plan.day(Day::Tuesday).exercises.len(), 2);

        store.remove_exercise(Day::Tuesday, &id);
        let left = &store.state().plan.day(Day::Tuesday).exercises;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, second);
    }

    #[test]
    fn test_mutations_reach_cache() {
        let (mut store, _) = store_with(LocalCache::open_in_memory().unwrap(), Arc::new(MemoryRemote::default()));

        struct Snapshot(std::sync::Arc<std::sync::Mutex<Option<WorkoutState>>>);
        impl StateObserver for Snapshot {
            fn on_change(&mut self, state: &WorkoutState, _change: Change) {
                *self.0.lock().unwrap() = Some(state.clone());
            }
        }

        let seen = std::sync::Arc::new(std::sync::Mutex::new(None));
        store.subscribe(Box::new(Snapshot(seen.clone())));
        store.add_exercise(Day::Friday, squat());

        let observed = seen.lock().unwrap().clone().unwrap();
        assert_eq!(observed.plan, store.state().plan);
    }

    #[tokio::test]
    async fn test_add_progress_log_pushes_and_toasts() {
        let remote = Arc::new(MemoryRemote::default());
        let (mut store, caps) = store_with(LocalCache::open_in_memory().unwrap(), remote.clone());

        let first = store.add_progress_log(LogDraft::new(date(2024, 1, 10), MuscleGroup::Chest));
        let second = store.add_progress_log(LogDraft::new(date(2024, 1, 5), MuscleGroup::Chest));
        store.flush().await;

        assert_eq!(store.state().logs[0].id, second);
        assert_eq!(store.state().logs[1].id, first);
        assert_eq!(remote.log_rows().len(), 2);
        assert_eq!(caps.toast_messages(), vec!["Progress logged successfully!"; 2]);
    }

    #[tokio::test]
    async fn test_failed_immediate_upsert_keeps_log_locally() {
        let remote = Arc::new(MemoryRemote::default());
        remote.set_unreachable(true);
        let (mut store, _) = store_with(LocalCache::open_in_memory().unwrap(), remote.clone());

        store.add_progress_log(LogDraft::new(date(2024, 1, 10), MuscleGroup::Arms));
        store.flush().await;

        assert_eq!(store.state().logs.len(), 1);
        assert!(remote.log_rows().is_empty());
    }

    #[tokio::test]
    async fn test_load_prefers_remote_logs() {
        let cache = LocalCache::open_in_memory().unwrap();
        cache.save_logs(&[LogDraft::new(date(2023, 12, 1), MuscleGroup::Core).with_id("local".into())]);

        let remote = Arc::new(MemoryRemote::default());
        remote.upsert_progress_log(&remote_log("r1", "2024-01-02")).await.unwrap();
        remote.upsert_progress_log(&remote_log("r2", "2024-01-09")).await.unwrap();

        let (mut store, caps) = store_with(cache, remote);
        store.load().await;

        let ids: Vec<_> = store.state().logs.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r1"]);
        assert!(!store.state().is_loading);
        assert!(store.state().last_sync.is_some());
        assert!(caps.toast_messages().is_empty());
    }

    #[tokio::test]
    async fn test_load_keeps_local_logs_when_remote_empty() {
        let cache = LocalCache::open_in_memory().unwrap();
        let local = vec![LogDraft::new(date(2023, 12, 1), MuscleGroup::Core).with_id("local".into())];
        cache.save_logs(&local);

        let (mut store, _) = store_with(cache, Arc::new(MemoryRemote::default()));
        store.load().await;

        assert_eq!(store.state().logs, local);
        assert!(!store.state().is_loading);
    }

    #[tokio::test]
    async fn test_load_does_not_touch_plan_with_remote_exercises() {
        let remote = Arc::new(MemoryRemote::default());
        let exercise = squat().with_id("remote-ex".into());
        remote
            .upsert_exercise(&ExerciseRow::new(&exercise, Day::Monday, ANONYMOUS_USER))
            .await
            .unwrap();

        let (mut store, _) = store_with(LocalCache::open_in_memory().unwrap(), remote);
        store.load().await;

        assert_eq!(store.state().plan, WeeklyPlan::default());
    }

    #[tokio::test]
    async fn test_load_failure_surfaces_once_and_unblocks() {
        let remote = Arc::new(MemoryRemote::default());
        remote.set_unreachable(true);

        let (mut store, caps) = store_with(LocalCache::open_in_memory().unwrap(), remote);
        store.add_exercise(Day::Monday, squat());
        store.load().await;

        assert!(!store.state().is_loading);
        assert_eq!(store.state().last_sync, None);
        assert_eq!(store.state().plan.day(Day::Monday).exercises.len(), 1);
        assert_eq!(caps.toast_messages(), vec!["Failed to sync with database"]);
    }

    #[tokio::test]
    async fn test_sync_pushes_everything_despite_failures() {
        let remote = Arc::new(MemoryRemote::new("u1"));
        let (mut store, _) = store_with(LocalCache::open_in_memory().unwrap(), remote.clone());

        let bad = store.add_exercise(Day::Monday, squat());
        store.add_exercise(Day::Thursday, squat());
        store.add_progress_log(LogDraft::new(date(2024, 1, 14), MuscleGroup::Legs));
        store.flush().await;
        remote.reject_id(&bad);

        let report = store.sync_now().await;
        assert_eq!(report, SyncReport { pushed: 2, failed: 1 });
        assert!(store.state().last_sync.is_some());

        let rows = remote.exercise_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].day, "Thursday");
        assert_eq!(rows[0].user_id, "u1");
        assert_eq!(remote.log_rows().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_marks_attempt_even_when_unreachable() {
        let remote = Arc::new(MemoryRemote::default());
        let (mut store, _) = store_with(LocalCache::open_in_memory().unwrap(), remote.clone());
        store.add_exercise(Day::Monday, squat());
        remote.set_unreachable(true);

        let report = store.sync_now().await;
        assert_eq!(report, SyncReport { pushed: 0, failed: 1 });
        assert!(store.state().last_sync.is_some());
    }

    #[test]
    fn test_advance_day_toasts() {
        let (mut store, caps) = store_with(LocalCache::open_in_memory().unwrap(), Arc::new(MemoryRemote::default()));
        store.advance_day(date(2024, 1, 16));
        assert_eq!(store.state().today_name(), Day::Tuesday);
        assert_eq!(store.state().day_tick, 1);
        assert_eq!(caps.toast_messages().len(), 1);
    }
}
