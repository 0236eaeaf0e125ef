//! Weekly-block CSV dialect
//!
//! One program laid out as sequential week / day sections: a label column
//! (index 1) carries week headings, day headings and goal text, while the
//! exercise rows carry their details at fixed columns to the right.
//!
//! Parsing is a fold over [`WeekState`], a three-state accumulator:
//! - `Idle`: before the first week heading
//! - `InWeek`: a week is open but no day yet (label lines become week notes)
//! - `InDay`: a day is open (rows become workouts)

use tracing::debug;

use super::tokenizer::{cell, contains_ignore_case, leading_count, starts_with_ignore_case, tokenize};
use crate::models::{Day, DayPlan, DayType, ImportedWeek, Plan, Workout};

/// ---------------------------------------------------------------------------
/// Column Layout
/// ---------------------------------------------------------------------------

const LABEL_COL: usize = 1;
const NAME_COL: usize = 2;
const WARM_UP_COL: usize = 3;
const WORKING_COL: usize = 4;
const REPS_COL: usize = 5;
const RPE_COL: usize = 8;
const REST_COL: usize = 9;
const NOTES_COL: usize = 10;

/// Labels that open a new day
const DAY_MARKERS: [&str; 3] = ["full body", "rest day", "test"];

/// Exercise-column values that are headers or credits, not lifts
const COLUMN_HEADER: &str = "exercise";
const CREDIT_PREFIXES: [&str; 1] = ["jeff nippard"];

/// ---------------------------------------------------------------------------
/// Week Accumulator: one week being built
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekAccumulator {
    pub name: String,
    pub notes: Vec<String>,
    pub days: DayPlan,
}

impl WeekAccumulator {
    fn open(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Unlabeled weeks are dropped
    fn into_week(self) -> Option<ImportedWeek> {
        if self.name.trim().is_empty() {
            return None;
        }
        Some(ImportedWeek {
            plan: Plan::new(self.name).with_notes(self.notes),
            days: self.days,
        })
    }
}

/// ---------------------------------------------------------------------------
/// Parser State
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub enum WeekState {
    #[default]
    Idle,
    InWeek {
        week: WeekAccumulator,
    },
    InDay {
        week: WeekAccumulator,
        day: Day,
        workouts: Vec<Workout>,
    },
}

impl WeekState {
    /// Advance by one tokenized line. Returns the next state plus a finished
    /// week when the line closed one.
    pub fn step(self, cells: &[String]) -> (Self, Option<ImportedWeek>) {
        let label = cell(cells, LABEL_COL);

        if starts_with_ignore_case(label, "week") {
            let finished = self.finish();
            let next = WeekState::InWeek {
                week: WeekAccumulator::open(label),
            };
            return (next, finished);
        }

        if let Some(day_type) = day_heading(label) {
            let next = match self {
                WeekState::Idle => WeekState::Idle,
                WeekState::InWeek { week } => WeekState::InDay {
                    week,
                    day: Day::new(label, day_type),
                    workouts: Vec::new(),
                },
                WeekState::InDay {
                    mut week,
                    day,
                    workouts,
                } => {
                    week.days.push((day, workouts));
                    WeekState::InDay {
                        week,
                        day: Day::new(label, day_type),
                        workouts: Vec::new(),
                    }
                }
            };
            return (next, None);
        }

        let next = match self {
            WeekState::InDay {
                week,
                day,
                mut workouts,
            } => {
                if let Some(workout) = parse_exercise(cells) {
                    workouts.push(workout);
                }
                WeekState::InDay {
                    week,
                    day,
                    workouts,
                }
            }
            WeekState::InWeek { mut week } => {
                if !label.is_empty() {
                    week.notes.push(label.to_string());
                }
                WeekState::InWeek { week }
            }
            WeekState::Idle => WeekState::Idle,
        };
        (next, None)
    }

    /// Flush the open day (if any) and close the open week (if any)
    pub fn finish(self) -> Option<ImportedWeek> {
        match self {
            WeekState::Idle => None,
            WeekState::InWeek { week } => week.into_week(),
            WeekState::InDay {
                mut week,
                day,
                workouts,
            } => {
                week.days.push((day, workouts));
                week.into_week()
            }
        }
    }
}

/// Parse a whole weekly-block document into one entry per week
pub fn parse(text: &str) -> Vec<ImportedWeek> {
    let mut weeks = Vec::new();

    let state = text.lines().map(tokenize).fold(WeekState::Idle, |state, cells| {
        let (next, finished) = state.step(&cells);
        weeks.extend(finished);
        next
    });
    weeks.extend(state.finish());

    debug!(weeks = weeks.len(), "Parsed weekly-block program");
    weeks
}

/// ---------------------------------------------------------------------------
/// Row Parsing
/// ---------------------------------------------------------------------------

fn day_heading(label: &str) -> Option<DayType> {
    let lower = label.to_lowercase();
    if !DAY_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return None;
    }
    if lower.contains("rest day") {
        Some(DayType::Rest)
    } else {
        Some(DayType::Working)
    }
}

fn is_ignored_name(name: &str) -> bool {
    name.is_empty()
        || name.eq_ignore_ascii_case(COLUMN_HEADER)
        || CREDIT_PREFIXES
            .iter()
            .any(|prefix| starts_with_ignore_case(name, prefix))
}

fn parse_exercise(cells: &[String]) -> Option<Workout> {
    let name = cell(cells, NAME_COL);
    if is_ignored_name(name) {
        return None;
    }

    let warm_up_sets = leading_count(cell(cells, WARM_UP_COL)).unwrap_or(0);
    let working_sets = leading_count(cell(cells, WORKING_COL)).unwrap_or(0);

    let reps_raw = cell(cells, REPS_COL);
    let amrap = contains_ignore_case(reps_raw, "amrap");
    let reps = if amrap { None } else { leading_count(reps_raw) };

    let notes = cell(cells, NOTES_COL);
    let notes = if amrap {
        format!("AMRAP. {}", notes).trim().to_string()
    } else {
        notes.to_string()
    };

    Some(Workout {
        sets: warm_up_sets + working_sets,
        warm_up_sets,
        working_sets,
        reps,
        rpe: cell(cells, RPE_COL).to_string(),
        rest: cell(cells, REST_COL).to_string(),
        notes,
        ..Workout::new(name)
    })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
