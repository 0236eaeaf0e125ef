//! Multi-week offset CSV dialect
//!
//! One block laid out as parallel week column groups that share the same
//! rows. Two problems make this dialect awkward:
//!
//! 1. Offset discovery: where each week's column group starts. Sources
//!    disagree on whether one header row lists every week or whether week
//!    markers are scattered, so discovery is a pluggable [`WeekDiscovery`].
//! 2. Column shape: the first week usually carries an RPE column that later
//!    weeks drop, shifting the notes column by one.
//!
//! Weeks are flattened into a single ordered block. A rest day follows every
//! second working day counted across the whole program, not per week.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tokenizer::{cell, contains_ignore_case, leading_count, starts_with_ignore_case, tokenize_document};
use crate::models::{Day, DayPlan, ImportedBlock, Workout};

/// Rest prescription applied to every imported lift
pub const DEFAULT_REST: &str = "3-5 min";

/// Goal lines are numbered "1." .. "3." in the label column
const GOAL_PREFIXES: [&str; 3] = ["1.", "2.", "3."];
const GOAL_COL: usize = 1;

/// Working days between synthetic rest days
const WORKING_DAYS_PER_REST: u32 = 2;

/// ---------------------------------------------------------------------------
/// Week Column: where one week's group lives
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekColumn {
    /// Column index of the label cell ("Day 1", exercise names)
    pub offset: usize,
    /// Row whose `offset + 4` cell announces an RPE column
    pub shape_row: usize,
    /// First row scanned for days and exercises
    pub first_row: usize,
}

/// ---------------------------------------------------------------------------
/// Offset Discovery Strategies
/// ---------------------------------------------------------------------------

pub trait WeekDiscovery: Send + Sync {
    /// Week groups in program order
    fn discover(&self, rows: &[Vec<String>]) -> Vec<WeekColumn>;
}

/// A single header row lists every week ("WEEK 1", "WEEK 2", ...)
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderRowDiscovery;

impl WeekDiscovery for HeaderRowDiscovery {
    fn discover(&self, rows: &[Vec<String>]) -> Vec<WeekColumn> {
        let Some(header) = rows
            .iter()
            .position(|row| row.iter().any(|c| contains_ignore_case(c, "week 1")))
        else {
            return Vec::new();
        };

        rows[header]
            .iter()
            .enumerate()
            .filter(|(_, c)| contains_ignore_case(c, "week"))
            .map(|(offset, _)| WeekColumn {
                offset,
                shape_row: header + 1,
                first_row: header + 1,
            })
            .collect()
    }
}

/// Week markers scattered at a fixed column stride near the top of the sheet
#[derive(Debug, Clone, Copy)]
pub struct StrideDiscovery {
    pub first_column: usize,
    pub stride: usize,
    pub scan_rows: usize,
}

impl Default for StrideDiscovery {
    fn default() -> Self {
        Self {
            first_column: 1,
            stride: 7,
            scan_rows: 10,
        }
    }
}

impl WeekDiscovery for StrideDiscovery {
    fn discover(&self, rows: &[Vec<String>]) -> Vec<WeekColumn> {
        let scanned = &rows[..rows.len().min(self.scan_rows)];
        let width = scanned.iter().map(Vec::len).max().unwrap_or(0);

        (self.first_column..width)
            .step_by(self.stride.max(1))
            .filter_map(|offset| {
                scanned.iter().enumerate().find_map(|(index, row)| {
                    let marker = cell(row, offset);
                    if starts_with_ignore_case(marker, "day 1") {
                        // The day row doubles as the sub-header
                        Some(WeekColumn {
                            offset,
                            shape_row: index,
                            first_row: index,
                        })
                    } else if contains_ignore_case(marker, "week") {
                        Some(WeekColumn {
                            offset,
                            shape_row: index + 1,
                            first_row: index + 1,
                        })
                    } else {
                        None
                    }
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeekDiscoveryStrategy {
    #[default]
    HeaderRow,
    Stride,
}

impl WeekDiscoveryStrategy {
    pub fn discovery(&self) -> Box<dyn WeekDiscovery> {
        match self {
            WeekDiscoveryStrategy::HeaderRow => Box::new(HeaderRowDiscovery),
            WeekDiscoveryStrategy::Stride => Box::new(StrideDiscovery::default()),
        }
    }
}

impl std::str::FromStr for WeekDiscoveryStrategy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "header_row" => Ok(Self::HeaderRow),
            "stride" => Ok(Self::Stride),
            _ => Err(format!("Unknown week discovery strategy: {}", s)),
        }
    }
}

/// ---------------------------------------------------------------------------
/// Column Shape: RPE present or not
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnShape {
    pub has_rpe: bool,
}

impl ColumnShape {
    pub fn detect(rows: &[Vec<String>], column: &WeekColumn) -> Self {
        let has_rpe = rows
            .get(column.shape_row)
            .map(|row| cell(row, column.offset + 4).eq_ignore_ascii_case("rpe"))
            .unwrap_or(false);
        Self { has_rpe }
    }

    fn rpe_col(&self, offset: usize) -> Option<usize> {
        self.has_rpe.then_some(offset + 4)
    }

    fn notes_col(&self, offset: usize) -> usize {
        if self.has_rpe {
            offset + 5
        } else {
            offset + 4
        }
    }
}

/// ---------------------------------------------------------------------------
/// Week Scan: day boundaries within one column group
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub enum WeekScan {
    #[default]
    Idle,
    InDay {
        name: String,
        workouts: Vec<Workout>,
    },
}

impl WeekScan {
    /// Advance by one row. Returns the day closed by this row, if any.
    pub fn step(
        self,
        row: &[String],
        offset: usize,
        shape: ColumnShape,
        week_number: usize,
    ) -> (Self, Option<(String, Vec<Workout>)>) {
        if row.len() <= offset {
            return (self, None);
        }
        let label = cell(row, offset);

        if starts_with_ignore_case(label, "day") {
            let next = WeekScan::InDay {
                name: format!("W{} {}", week_number, label),
                workouts: Vec::new(),
            };
            return (next, self.finish());
        }

        match self {
            WeekScan::InDay { name, mut workouts } => {
                if !label.is_empty() && !is_structural(label) {
                    workouts.push(parse_exercise(row, offset, shape));
                }
                (WeekScan::InDay { name, workouts }, None)
            }
            WeekScan::Idle => (WeekScan::Idle, None),
        }
    }

    pub fn finish(self) -> Option<(String, Vec<Workout>)> {
        match self {
            WeekScan::Idle => None,
            WeekScan::InDay { name, workouts } => Some((name, workouts)),
        }
    }
}

fn is_structural(label: &str) -> bool {
    label == "Sets"
        || contains_ignore_case(label, "focused")
        || starts_with_ignore_case(label, "week")
        || starts_with_ignore_case(label, "goals")
        || starts_with_ignore_case(label, "notes")
}

fn parse_load(raw: &str) -> Option<f64> {
    if contains_ignore_case(raw, "bw") {
        return None;
    }
    raw.parse::<f64>().ok().filter(|load| *load != 0.0)
}

fn parse_exercise(row: &[String], offset: usize, shape: ColumnShape) -> Workout {
    let sets = leading_count(cell(row, offset + 1)).unwrap_or(0);

    let reps_raw = cell(row, offset + 2);
    let (reps, time) = if reps_raw.contains(':') {
        (None, Some(reps_raw.to_string()))
    } else {
        (leading_count(reps_raw), None)
    };

    let rpe = shape
        .rpe_col(offset)
        .map(|col| cell(row, col).to_string())
        .unwrap_or_default();
    let notes = cell(row, shape.notes_col(offset));
    let notes = if contains_ignore_case(reps_raw, "side") {
        format!("{} (Per side)", notes).trim().to_string()
    } else {
        notes.to_string()
    };

    Workout {
        sets,
        working_sets: sets,
        reps,
        time,
        load: parse_load(cell(row, offset + 3)),
        rpe,
        rest: DEFAULT_REST.to_string(),
        notes,
        ..Workout::new(cell(row, offset))
    }
}

/// Collect the days of one week group in row order
pub fn scan_week(
    rows: &[Vec<String>],
    column: &WeekColumn,
    week_number: usize,
) -> Vec<(String, Vec<Workout>)> {
    let shape = ColumnShape::detect(rows, column);
    let mut days = Vec::new();

    let scan = rows
        .iter()
        .skip(column.first_row)
        .fold(WeekScan::Idle, |scan, row| {
            let (next, closed) = scan.step(row, column.offset, shape, week_number);
            days.extend(closed);
            next
        });
    days.extend(scan.finish());

    debug!(
        week = week_number,
        offset = column.offset,
        has_rpe = shape.has_rpe,
        days = days.len(),
        "Scanned week column group"
    );
    days
}

/// ---------------------------------------------------------------------------
/// Flattener: weeks -> one sequenced block
/// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Flattener {
    days: DayPlan,
    sequence: u32,
    working_days: u32,
}

impl Flattener {
    fn next_sequence(&mut self) -> u32 {
        self.sequence += 1;
        self.sequence
    }

    /// Append a week's working days, inserting rest days on the global cadence
    pub fn push_week(&mut self, week_number: usize, days: Vec<(String, Vec<Workout>)>) {
        for (name, workouts) in days {
            let sequence = self.next_sequence();
            self.days.push((Day::working(name).with_sequence(sequence), workouts));
            self.working_days += 1;

            if self.working_days % WORKING_DAYS_PER_REST == 0 {
                let rest_number = self.working_days / WORKING_DAYS_PER_REST;
                let sequence = self.next_sequence();
                let rest = Day::rest(format!("W{} Rest Day {}", week_number, rest_number))
                    .with_sequence(sequence);
                self.days.push((rest, Vec::new()));
            }
        }
    }

    pub fn into_days(self) -> DayPlan {
        self.days
    }
}

/// Goal lines anywhere in the document, collected once
pub fn collect_goals(rows: &[Vec<String>]) -> Vec<String> {
    rows.iter()
        .map(|row| cell(row, GOAL_COL))
        .filter(|text| GOAL_PREFIXES.iter().any(|prefix| text.starts_with(prefix)))
        .map(str::to_string)
        .collect()
}

/// Parse a multi-week document into one flattened block
pub fn parse(text: &str, block_name: &str, discovery: &dyn WeekDiscovery) -> ImportedBlock {
    let rows = tokenize_document(text);
    let notes = collect_goals(&rows);
    let columns = discovery.discover(&rows);

    let mut flattener = Flattener::default();
    for (index, column) in columns.iter().enumerate() {
        let week_number = index + 1;
        flattener.push_week(week_number, scan_week(&rows, column, week_number));
    }

    let block = ImportedBlock {
        name: block_name.to_string(),
        notes,
        days: flattener.into_days(),
    };
    debug!(
        weeks = columns.len(),
        days = block.days.len(),
        working_days = block.working_days(),
        "Flattened multi-week block"
    );
    block
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
