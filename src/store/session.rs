//! Session - the store plus its background tasks

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{WorkoutStore, clock, fetch, push};
use crate::remote::RemoteStore;

pub type SharedStore<R> = Arc<Mutex<WorkoutStore<R>>>;

/// Owns the initial load, the periodic sync and the midnight tick.
/// Dropping the session aborts them; `shutdown` also waits for pending
/// log upserts.
pub struct Session<R: RemoteStore + 'static> {
    store: SharedStore<R>,
    tasks: Vec<JoinHandle<()>>,
}

impl<R: RemoteStore + 'static> Session<R> {
    /// Start the initial load and the background tasks. The store is usable
    /// right away; `is_loading` stays set until the load settles.
    pub fn start(store: WorkoutStore<R>, sync_every: Duration) -> Self {
        let store = Arc::new(Mutex::new(store));
        let tasks = vec![
            tokio::spawn(load_task(store.clone())),
            tokio::spawn(sync_task(store.clone(), sync_every)),
            tokio::spawn(midnight_task(store.clone())),
        ];

        Self { store, tasks }
    }

    pub fn store(&self) -> &SharedStore<R> {
        &self.store
    }

    pub async fn shutdown(mut self) {
        self.abort_tasks();
        self.store.lock().await.flush().await;
        info!("Session closed");
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl<R: RemoteStore + 'static> Drop for Session<R> {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// Initial fetch without holding the lock, then apply the result
async fn load_task<R: RemoteStore + 'static>(store: SharedStore<R>) {
    let remote = store.lock().await.remote().clone();
    let result = fetch(remote.as_ref()).await;
    store.lock().await.apply_remote(result, Utc::now());
}

/// Push the whole plan and log list every period. The lock is released
/// while requests are in flight.
async fn sync_task<R: RemoteStore + 'static>(store: SharedStore<R>, every: Duration) {
    info!("Sync task started (interval: {} seconds)", every.as_secs());

    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
    loop {
        interval.tick().await;

        let (remote, payload) = {
            let guard = store.lock().await;
            (guard.remote().clone(), guard.sync_payload())
        };

        let report = push(remote.as_ref(), payload).await;
        debug!("Background sync: {:?}", report);

        store.lock().await.mark_synced(Utc::now());
    }
}

/// Fire just after local midnight, then re-aim from the new wall clock
async fn midnight_task<R: RemoteStore + 'static>(store: SharedStore<R>) {
    loop {
        let wait = clock::until_next_midnight(&Local::now());
        debug!("Next day boundary in {:?}", wait);
        tokio::time::sleep(wait).await;

        let today = Local::now().date_naive();
        store.lock().await.advance_day(today);
    }
}
