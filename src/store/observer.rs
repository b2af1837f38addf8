//! State observers - persistence lives outside the reducer

use crate::db::LocalCache;

use super::state::WorkoutState;

/// Which slices of the state an action touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Change {
    pub plan: bool,
    pub logs: bool,
}

impl Change {
    pub fn between(prev: &WorkoutState, next: &WorkoutState) -> Self {
        Self {
            plan: prev.plan != next.plan,
            logs: prev.logs != next.logs,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.plan && !self.logs
    }
}

pub trait StateObserver: Send {
    fn on_change(&mut self, state: &WorkoutState, change: Change);
}

/// Writes the plan and log documents to the local cache when they change
pub struct CachePersister {
    cache: LocalCache,
}

impl CachePersister {
    pub fn new(cache: LocalCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }
}

impl StateObserver for CachePersister {
    fn on_change(&mut self, state: &WorkoutState, change: Change) {
        if change.plan {
            self.cache.save_plan(&state.plan);
        }
        if change.logs {
            self.cache.save_logs(&state.logs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Day, Exercise, MuscleGroup, WeeklyPlan};
    use crate::store::state::Action;
    use chrono::NaiveDate;

    #[test]
    fn test_persister_writes_only_changed_slice() {
        let cache = LocalCache::open_in_memory().unwrap();
        let mut persister = CachePersister::new(cache);

        let prev = WorkoutState::new(WeeklyPlan::default(), Vec::new(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let next = prev.reduce(Action::AddExercise {
            day: Day::Monday,
            exercise: Exercise {
                id: "e".into(),
                name: "Curl".into(),
                muscle_group: MuscleGroup::Arms,
                sets: 3,
                reps: 12,
                weight: Some(12.5),
            },
        });

        let change = Change::between(&prev, &next);
        assert_eq!(change, Change { plan: true, logs: false });
        persister.on_change(&next, change);

        assert_eq!(persister.cache().load_plan(), next.plan);
        assert_eq!(persister.cache().get_raw(crate::db::LOGS_KEY).unwrap(), None);
    }
}
