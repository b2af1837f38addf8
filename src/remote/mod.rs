//! Remote store - hosted tables for exercises and progress logs
//!
//! Both tables are scoped by a `user_id` column. The store only needs
//! upsert and select; everything else about the backend is opaque.

pub mod memory;
pub mod supabase;

use std::future::Future;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Day, Exercise, MuscleGroup, ProgressLog};

pub use memory::MemoryRemote;
pub use supabase::SupabaseClient;

/// Identity used when no session exists
pub const ANONYMOUS_USER: &str = "anonymous";

pub const EXERCISES_TABLE: &str = "exercises";
pub const PROGRESS_LOGS_TABLE: &str = "progress_logs";

/// Row of the `exercises` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRow {
    pub id: String,
    pub name: String,
    pub muscle_group: String,
    pub sets: u32,
    pub reps: u32,
    pub weight: Option<f64>,
    pub day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub user_id: String,
}

impl ExerciseRow {
    pub fn new(exercise: &Exercise, day: Day, user_id: &str) -> Self {
        Self {
            id: exercise.id.clone(),
            name: exercise.name.clone(),
            muscle_group: exercise.muscle_group.label().to_string(),
            sets: exercise.sets,
            reps: exercise.reps,
            weight: exercise.weight,
            day: day.label().to_string(),
            created_at: None,
            user_id: user_id.to_string(),
        }
    }

    /// Back to the plan model; the day is `None` for rows pushed without one
    pub fn to_exercise(&self) -> Result<(Option<Day>, Exercise)> {
        let muscle_group: MuscleGroup = self.muscle_group.parse()?;
        let day = self.day.parse::<Day>().ok();
        Ok((
            day,
            Exercise {
                id: self.id.clone(),
                name: self.name.clone(),
                muscle_group,
                sets: self.sets,
                reps: self.reps,
                weight: self.weight,
            },
        ))
    }
}

/// Row of the `progress_logs` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressLogRow {
    pub id: String,
    pub date: String,
    pub muscle_group: String,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub user_id: String,
}

impl ProgressLogRow {
    pub fn new(log: &ProgressLog, user_id: &str) -> Self {
        Self {
            id: log.id.clone(),
            date: log.date.format("%Y-%m-%d").to_string(),
            muscle_group: log.muscle_group.label().to_string(),
            weight: log.weight,
            reps: log.reps,
            notes: log.notes.clone(),
            created_at: None,
            user_id: user_id.to_string(),
        }
    }

    pub fn to_log(&self) -> Result<ProgressLog> {
        // Timestamps are accepted too; only the calendar date matters
        let day_part = self.date.get(..10).unwrap_or(&self.date);
        let date = NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
            .with_context(|| format!("bad date {:?} on log {}", self.date, self.id))?;

        Ok(ProgressLog {
            id: self.id.clone(),
            date,
            muscle_group: self.muscle_group.parse()?,
            weight: self.weight,
            reps: self.reps,
            notes: self.notes.clone(),
        })
    }
}

/// Upsert/select interface of the hosted database.
///
/// Futures are `Send` so callers can hand them to `tokio::spawn`.
pub trait RemoteStore: Send + Sync {
    /// Current session's user id, or [`ANONYMOUS_USER`]
    fn current_user(&self) -> impl Future<Output = Result<String>> + Send;

    fn upsert_exercise(&self, row: &ExerciseRow) -> impl Future<Output = Result<()>> + Send;

    fn upsert_progress_log(&self, row: &ProgressLogRow) -> impl Future<Output = Result<()>> + Send;

    fn select_exercises(&self, user_id: &str) -> impl Future<Output = Result<Vec<ExerciseRow>>> + Send;

    /// Logs for `user_id`, newest date first
    fn select_progress_logs(&self, user_id: &str) -> impl Future<Output = Result<Vec<ProgressLogRow>>> + Send;
}
