//! Workout state, its reducer and the derived views

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};

use crate::model::{Day, DayPlan, Exercise, MuscleGroup, ProgressLog, WeeklyPlan};

/// State transitions. Ids are assigned before an action is built, so
/// reducing is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddExercise { day: Day, exercise: Exercise },
    RemoveExercise { day: Day, id: String },
    AddProgressLog(ProgressLog),
    ReplaceLogs(Vec<ProgressLog>),
    LoadFinished { synced_at: Option<DateTime<Utc>> },
    Synced { at: DateTime<Utc> },
    DayTick { today: NaiveDate },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutState {
    pub plan: WeeklyPlan,
    /// Most recently inserted first
    pub logs: Vec<ProgressLog>,
    pub is_loading: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub today: NaiveDate,
    pub day_tick: u64,
}

impl WorkoutState {
    pub fn new(plan: WeeklyPlan, logs: Vec<ProgressLog>, today: NaiveDate) -> Self {
        Self {
            plan,
            logs,
            is_loading: true,
            last_sync: None,
            today,
            day_tick: 0,
        }
    }

    pub fn reduce(&self, action: Action) -> WorkoutState {
        let mut next = self.clone();
        match action {
            Action::AddExercise { day, exercise } => {
                next.plan.exercises_mut(day).push(exercise);
            }
            Action::RemoveExercise { day, id } => {
                next.plan.exercises_mut(day).retain(|e| e.id != id);
            }
            Action::AddProgressLog(log) => {
                next.logs.insert(0, log);
            }
            Action::ReplaceLogs(logs) => {
                next.logs = logs;
            }
            Action::LoadFinished { synced_at } => {
                next.is_loading = false;
                if synced_at.is_some() {
                    next.last_sync = synced_at;
                }
            }
            Action::Synced { at } => {
                next.last_sync = Some(at);
            }
            Action::DayTick { today } => {
                next.today = today;
                next.day_tick += 1;
            }
        }
        next
    }

    pub fn today_name(&self) -> Day {
        Day::from_weekday(self.today.weekday())
    }

    pub fn todays_plan(&self) -> &DayPlan {
        self.plan.day(self.today_name())
    }

    /// Latest log date per group, by date rather than insertion order
    pub fn last_trained_by_group(&self) -> BTreeMap<MuscleGroup, NaiveDate> {
        let mut map = BTreeMap::new();
        for log in &self.logs {
            map.entry(log.muscle_group)
                .and_modify(|d: &mut NaiveDate| {
                    if log.date > *d {
                        *d = log.date;
                    }
                })
                .or_insert(log.date);
        }
        map
    }

    /// Groups never trained, or last trained before `now - threshold_days`.
    /// Log dates count as midnight UTC. A cutoff outside chrono's range
    /// means no logged group can be older than it.
    pub fn inactive_muscle_groups(&self, threshold_days: i64, now: DateTime<Utc>) -> Vec<MuscleGroup> {
        let cutoff = TimeDelta::try_days(threshold_days).and_then(|d| now.checked_sub_signed(d));
        let last = self.last_trained_by_group();

        MuscleGroup::all()
            .iter()
            .copied()
            .filter(|g| match (last.get(g), cutoff) {
                (None, _) => true,
                (Some(date), Some(cutoff)) => date.and_time(chrono::NaiveTime::MIN).and_utc() < cutoff,
                (Some(_), None) => false,
            })
            .collect()
    }

    pub fn progress_by_group(&self, group: MuscleGroup) -> Vec<ProgressLog> {
        let mut logs: Vec<_> = self
            .logs
            .iter()
            .filter(|l| l.muscle_group == group)
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.date);
        logs
    }
}
