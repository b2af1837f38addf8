//! Domain model - days, muscle groups, weekly plan and progress logs

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Weekday labels, Monday first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }

    /// Slot of this day in a Monday-first week
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Calendar weekday to plan label (Sunday is the last slot)
    pub fn from_weekday(weekday: Weekday) -> Self {
        Day::ALL[weekday.num_days_from_monday() as usize]
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Day {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Day::ALL
            .iter()
            .copied()
            .find(|d| d.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| anyhow!("invalid day: {:?} (expected Monday..Sunday)", s))
    }
}

/// Muscle groups used to classify exercises and logs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MuscleGroup {
    Chest,
    Back,
    Legs,
    Shoulders,
    Arms,
    Core,
    Glutes,
    #[serde(rename = "Full Body")]
    FullBody,
}

impl MuscleGroup {
    pub fn label(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Back => "Back",
            MuscleGroup::Legs => "Legs",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Arms => "Arms",
            MuscleGroup::Core => "Core",
            MuscleGroup::Glutes => "Glutes",
            MuscleGroup::FullBody => "Full Body",
        }
    }

    /// All muscle groups for iteration
    pub fn all() -> &'static [MuscleGroup] {
        &[
            MuscleGroup::Chest,
            MuscleGroup::Back,
            MuscleGroup::Legs,
            MuscleGroup::Shoulders,
            MuscleGroup::Arms,
            MuscleGroup::Core,
            MuscleGroup::Glutes,
            MuscleGroup::FullBody,
        ]
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MuscleGroup {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect();

        MuscleGroup::all()
            .iter()
            .copied()
            .find(|g| g.label().replace(' ', "").eq_ignore_ascii_case(&compact))
            .ok_or_else(|| anyhow!("unknown muscle group: {:?}", s))
    }
}

/// Planned exercise inside a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub muscle_group: MuscleGroup,
    pub sets: u32,
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// Exercise fields supplied by the caller; the id is generated on insert
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseDraft {
    pub name: String,
    pub muscle_group: MuscleGroup,
    pub sets: u32,
    pub reps: u32,
    pub weight: Option<f64>,
}

impl ExerciseDraft {
    pub fn with_id(self, id: String) -> Exercise {
        Exercise {
            id,
            name: self.name,
            muscle_group: self.muscle_group,
            sets: self.sets,
            reps: self.reps,
            weight: self.weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: Day,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl DayPlan {
    pub fn empty(day: Day) -> Self {
        Self { day, exercises: Vec::new() }
    }
}

/// Seven day plans, one per label, always in Monday..Sunday order.
///
/// The slot layout is fixed at construction; only the exercise lists can be
/// mutated. On the wire it is a plain array of `{day, exercises}` objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DayPlan>", into = "Vec<DayPlan>")]
pub struct WeeklyPlan {
    days: Vec<DayPlan>,
}

impl Default for WeeklyPlan {
    fn default() -> Self {
        Self {
            days: Day::ALL.iter().copied().map(DayPlan::empty).collect(),
        }
    }
}

impl WeeklyPlan {
    pub fn day(&self, day: Day) -> &DayPlan {
        &self.days[day.index()]
    }

    pub fn exercises_mut(&mut self, day: Day) -> &mut Vec<Exercise> {
        &mut self.days[day.index()].exercises
    }

    pub fn days(&self) -> &[DayPlan] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// True when no day has anything planned
    pub fn has_no_exercises(&self) -> bool {
        self.days.iter().all(|d| d.exercises.is_empty())
    }

    /// Every exercise paired with the day it belongs to
    pub fn flatten(&self) -> Vec<(Day, Exercise)> {
        self.days
            .iter()
            .flat_map(|dp| dp.exercises.iter().map(move |e| (dp.day, e.clone())))
            .collect()
    }
}

impl TryFrom<Vec<DayPlan>> for WeeklyPlan {
    type Error = anyhow::Error;

    fn try_from(entries: Vec<DayPlan>) -> Result<Self> {
        let mut plan = WeeklyPlan::default();
        let mut seen = [false; 7];

        for entry in entries {
            let slot = entry.day.index();
            if seen[slot] {
                bail!("weekly plan lists {} twice", entry.day);
            }
            seen[slot] = true;
            plan.days[slot] = entry;
        }

        Ok(plan)
    }
}

impl From<WeeklyPlan> for Vec<DayPlan> {
    fn from(plan: WeeklyPlan) -> Self {
        plan.days
    }
}

/// Dated performance record for one muscle group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressLog {
    pub id: String,
    pub date: NaiveDate,
    pub muscle_group: MuscleGroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogDraft {
    pub date: NaiveDate,
    pub muscle_group: MuscleGroup,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub notes: Option<String>,
}

impl LogDraft {
    /// Minimal draft: date and group only
    pub fn new(date: NaiveDate, muscle_group: MuscleGroup) -> Self {
        Self {
            date,
            muscle_group,
            weight: None,
            reps: None,
            notes: None,
        }
    }

    pub fn with_id(self, id: String) -> ProgressLog {
        ProgressLog {
            id,
            date: self.date,
            muscle_group: self.muscle_group,
            weight: self.weight,
            reps: self.reps,
            notes: self.notes,
        }
    }
}

/// Fresh opaque identifier for exercises and logs
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bench() -> Exercise {
        Exercise {
            id: "e1".into(),
            name: "Bench Press".into(),
            muscle_group: MuscleGroup::Chest,
            sets: 3,
            reps: 10,
            weight: Some(60.0),
        }
    }

    #[test]
    fn test_day_parse_case_insensitive() {
        assert_eq!("tuesday".parse::<Day>().unwrap(), Day::Tuesday);
        assert_eq!(" SUNDAY ".parse::<Day>().unwrap(), Day::Sunday);
        assert!("Funday".parse::<Day>().is_err());
    }

    #[test]
    fn test_sunday_is_last_slot() {
        assert_eq!(Day::from_weekday(Weekday::Sun), Day::Sunday);
        assert_eq!(Day::from_weekday(Weekday::Mon), Day::Monday);
        assert_eq!(Day::Sunday.index(), 6);
    }

    #[test]
    fn test_muscle_group_full_body_label() {
        let json = serde_json::to_string(&MuscleGroup::FullBody).unwrap();
        assert_eq!(json, "\"Full Body\"");
        assert_eq!("full-body".parse::<MuscleGroup>().unwrap(), MuscleGroup::FullBody);
        assert_eq!("Full Body".parse::<MuscleGroup>().unwrap(), MuscleGroup::FullBody);
        assert_eq!("arms".parse::<MuscleGroup>().unwrap(), MuscleGroup::Arms);
        assert!("neck".parse::<MuscleGroup>().is_err());
        assert_eq!(MuscleGroup::all().len(), 8);
    }

    #[test]
    fn test_default_plan_has_all_days() {
        let plan = WeeklyPlan::default();
        assert_eq!(plan.len(), 7);
        let labels: Vec<Day> = plan.days().iter().map(|d| d.day).collect();
        assert_eq!(labels, Day::ALL.to_vec());
        assert!(plan.has_no_exercises());
    }

    #[test]
    fn test_exercise_json_uses_camel_case() {
        let value = serde_json::to_value(bench()).unwrap();
        assert_eq!(value["muscleGroup"], "Chest");
        assert_eq!(value["weight"], 60.0);

        let mut no_weight = bench();
        no_weight.weight = None;
        let value = serde_json::to_value(no_weight).unwrap();
        assert!(value.get("weight").is_none());
    }

    #[test]
    fn test_plan_fills_missing_days() {
        let json = r#"[{"day":"Friday","exercises":[]},{"day":"Monday","exercises":[]}]"#;
        let plan: WeeklyPlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.len(), 7);
        assert_eq!(plan.days()[0].day, Day::Monday);
        assert_eq!(plan.days()[4].day, Day::Friday);
    }

    #[test]
    fn test_plan_rejects_duplicate_day() {
        let json = r#"[{"day":"Monday","exercises":[]},{"day":"Monday","exercises":[]}]"#;
        assert!(serde_json::from_str::<WeeklyPlan>(json).is_err());
    }

    #[test]
    fn test_plan_roundtrip() {
        let mut plan = WeeklyPlan::default();
        plan.exercises_mut(Day::Wednesday).push(bench());

        let json = serde_json::to_string(&plan).unwrap();
        let back: WeeklyPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }

    #[test]
    fn test_flatten_keeps_day() {
        let mut plan = WeeklyPlan::default();
        plan.exercises_mut(Day::Saturday).push(bench());
        let flat = plan.flatten();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].0, Day::Saturday);
    }

    #[test]
    fn test_log_date_is_iso() {
        let log = LogDraft::new(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(), MuscleGroup::Chest)
            .with_id("l1".into());
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["date"], "2024-01-10");
        assert_eq!(value["muscleGroup"], "Chest");
    }
}
