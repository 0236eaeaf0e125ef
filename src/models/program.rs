//! Canonical program model
//!
//! Every import dialect converges on the same Plan -> Block -> Day -> Workout
//! shape. Parsers hand these values back unattached: ids and parent ids stay
//! `None` until the store assigns them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Day Type: Training vs recovery
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    #[default]
    Working,
    Rest,
}

impl std::fmt::Display for DayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Working => write!(f, "working"),
            Self::Rest => write!(f, "rest"),
        }
    }
}

impl std::str::FromStr for DayType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "working" => Ok(Self::Working),
            "rest" => Ok(Self::Rest),
            _ => Err(format!("Unknown day type: {}", s)),
        }
    }
}

/// ---------------------------------------------------------------------------
/// Plan / Block / Day
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: Option<i64>,
    pub name: String,
    /// At most one plan is primary; the store enforces it
    pub is_primary: bool,
    pub notes: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Plan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            is_primary: false,
            notes: Vec::new(),
            created_at: None,
        }
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: Option<i64>,
    pub plan_id: Option<i64>,
    pub name: String,
    /// Block goals, in source order
    pub notes: Vec<String>,
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    pub id: Option<i64>,
    pub plan_id: Option<i64>,
    pub block_id: Option<i64>,
    pub name: String,
    pub day_type: DayType,
    /// Explicit position within a flattened block (multi-week imports)
    pub day: Option<u32>,
    pub is_completed: bool,
}

impl Day {
    pub fn new(name: impl Into<String>, day_type: DayType) -> Self {
        Self {
            id: None,
            plan_id: None,
            block_id: None,
            name: name.into(),
            day_type,
            day: None,
            is_completed: false,
        }
    }

    pub fn working(name: impl Into<String>) -> Self {
        Self::new(name, DayType::Working)
    }

    pub fn rest(name: impl Into<String>) -> Self {
        Self::new(name, DayType::Rest)
    }

    pub fn with_sequence(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }

    pub fn is_rest(&self) -> bool {
        self.day_type == DayType::Rest
    }
}

/// ---------------------------------------------------------------------------
/// Workout: one prescribed lift
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: Option<i64>,
    pub day_id: Option<i64>,
    /// Free text as written in the source, not yet resolved
    pub exercise_name: String,
    pub sets: u32,
    pub warm_up_sets: u32,
    pub working_sets: u32,
    /// Rep target; never set together with `time`
    pub reps: Option<u32>,
    /// Timed sets such as "0:30"
    pub time: Option<String>,
    /// `None` = unspecified (estimate it), `Some(0.0)` = bodyweight
    pub load: Option<f64>,
    /// Single value, range or "N/A"
    pub rpe: String,
    pub rest: String,
    pub notes: String,
    pub is_completed: bool,
}

impl Workout {
    pub fn new(exercise_name: impl Into<String>) -> Self {
        Self {
            id: None,
            day_id: None,
            exercise_name: exercise_name.into(),
            sets: 0,
            warm_up_sets: 0,
            working_sets: 0,
            reps: None,
            time: None,
            load: None,
            rpe: String::new(),
            rest: String::new(),
            notes: String::new(),
            is_completed: false,
        }
    }

    pub fn is_bodyweight(&self) -> bool {
        self.load == Some(0.0)
    }
}

/// ---------------------------------------------------------------------------
/// Import results
/// ---------------------------------------------------------------------------

/// Ordered day -> workouts mapping. A Vec keeps program order and never
/// collapses two days that happen to share a name.
pub type DayPlan = Vec<(Day, Vec<Workout>)>;

/// One week-level unit: a plan shell plus its days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedWeek {
    pub plan: Plan,
    pub days: DayPlan,
}

/// A whole program flattened into one ordered block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedBlock {
    pub name: String,
    pub notes: Vec<String>,
    pub days: DayPlan,
}

impl ImportedBlock {
    pub fn working_days(&self) -> usize {
        self.days.iter().filter(|(day, _)| !day.is_rest()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_type_round_trips_through_strings() {
        assert_eq!("rest".parse::<DayType>(), Ok(DayType::Rest));
        assert_eq!(DayType::Working.to_string(), "working");
        assert!("sunday".parse::<DayType>().is_err());
    }

    #[test]
    fn test_bodyweight_is_distinct_from_unspecified() {
        let mut workout = Workout::new("Pull ups");
        assert!(!workout.is_bodyweight());

        workout.load = Some(0.0);
        assert!(workout.is_bodyweight());
        assert_ne!(workout.load, None);
    }

    #[test]
    fn test_new_entities_are_unattached() {
        let day = Day::rest("Rest Day").with_sequence(3);
        assert_eq!(day.plan_id, None);
        assert_eq!(day.block_id, None);
        assert_eq!(day.day, Some(3));
        assert!(day.is_rest());

        let plan = Plan::new("Week 1");
        assert_eq!(plan.id, None);
        assert!(!plan.is_primary);
    }
}
