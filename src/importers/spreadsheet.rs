//! Generic row-oriented spreadsheet dialect
//!
//! Reads the first worksheet of an xlsx/xls/ods workbook (via calamine) or a
//! CSV rendering of the same sheet. A row whose first cell starts with "DAY"
//! or "WEEK" opens a day; other rows are exercises laid out as
//! name, sets, reps, load, RPE, rest, notes.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::debug;

use super::tokenizer::{starts_with_ignore_case, tokenize};
use super::ImportError;
use crate::models::{Day, DayPlan, ImportedWeek, Plan, Workout};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// ---------------------------------------------------------------------------
/// Cell: the three shapes a sheet cell can take
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Classify a CSV field: blank, numeric or free text
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            Cell::Empty
        } else if let Ok(n) = field.parse::<f64>() {
            Cell::Number(n)
        } else {
            Cell::Text(field.to_string())
        }
    }

    /// Display text; whole numbers render without a fraction ("8", not "8.0")
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }

    /// Numeric reading of a cell that must be numeric or empty.
    /// `Err(())` means the cell holds text.
    fn numeric(&self) -> Result<Option<f64>, ()> {
        match self {
            Cell::Empty => Ok(None),
            Cell::Number(n) => Ok(Some(*n)),
            Cell::Text(_) => Err(()),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) => Cell::Number(*v),
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.trim().to_string()),
            other => Cell::Text(other.to_string()),
        }
    }
}

fn cell_at(row: &[Cell], index: usize) -> &Cell {
    const EMPTY: &Cell = &Cell::Empty;
    row.get(index).unwrap_or(EMPTY)
}

/// ---------------------------------------------------------------------------
/// Row Sources
/// ---------------------------------------------------------------------------

/// True when the bytes look like a zip (xlsx/ods) or OLE (xls) container
pub fn is_workbook(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC)
}

pub fn rows_from_text(text: &str) -> Vec<Vec<Cell>> {
    text.lines()
        .map(|line| tokenize(line).iter().map(|f| Cell::from_field(f)).collect())
        .collect()
}

/// Rows of a calamine range, left-padded so index 0 is always column A
pub fn rows_from_range(range: &Range<Data>) -> Vec<Vec<Cell>> {
    let first_col = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    range
        .rows()
        .map(|row| {
            let mut cells = vec![Cell::Empty; first_col];
            cells.extend(row.iter().map(Cell::from));
            cells
        })
        .collect()
}

/// Rows of the first worksheet of an in-memory workbook
pub fn rows_from_workbook(bytes: &[u8]) -> Result<Vec<Vec<Cell>>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Workbook("workbook has no worksheets".to_string()))?
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    Ok(rows_from_range(&range))
}

/// ---------------------------------------------------------------------------
/// Parser State
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SheetState {
    #[default]
    Idle,
    InDay {
        day: Day,
        workouts: Vec<Workout>,
    },
}

impl SheetState {
    pub fn step(self, row: &[Cell]) -> (Self, Option<(Day, Vec<Workout>)>) {
        let first = cell_at(row, 0).as_text();

        if starts_with_ignore_case(&first, "day") || starts_with_ignore_case(&first, "week") {
            let next = SheetState::InDay {
                day: Day::working(first),
                workouts: Vec::new(),
            };
            return (next, self.finish());
        }

        match self {
            SheetState::InDay { day, mut workouts } => {
                if !first.is_empty() {
                    match parse_exercise(row, &first) {
                        Some(workout) => workouts.push(workout),
                        None => debug!(row = %first, "Skipping non-numeric spreadsheet row"),
                    }
                }
                (SheetState::InDay { day, workouts }, None)
            }
            SheetState::Idle => (SheetState::Idle, None),
        }
    }

    pub fn finish(self) -> Option<(Day, Vec<Workout>)> {
        match self {
            SheetState::Idle => None,
            SheetState::InDay { day, workouts } => Some((day, workouts)),
        }
    }
}

fn parse_exercise(row: &[Cell], name: &str) -> Option<Workout> {
    let sets = cell_at(row, 1).numeric().ok()?;
    let reps = cell_at(row, 2).numeric().ok()?;
    let load = cell_at(row, 3).numeric().ok()?;

    let sets = sets.map(|n| n.max(0.0) as u32).unwrap_or(0);

    Some(Workout {
        sets,
        working_sets: sets,
        reps: reps.map(|n| n.max(0.0) as u32),
        load: load.filter(|l| *l != 0.0),
        rpe: cell_at(row, 4).as_text(),
        rest: cell_at(row, 5).as_text(),
        notes: cell_at(row, 6).as_text(),
        ..Workout::new(name)
    })
}

/// Fold sheet rows into one plan
pub fn parse_rows(rows: &[Vec<Cell>], plan_name: &str) -> ImportedWeek {
    let mut days: DayPlan = Vec::new();

    let state = rows.iter().fold(SheetState::Idle, |state, row| {
        let (next, closed) = state.step(row);
        days.extend(closed);
        next
    });
    days.extend(state.finish());

    debug!(plan = %plan_name, days = days.len(), "Parsed spreadsheet program");
    ImportedWeek {
        plan: Plan::new(plan_name),
        days,
    }
}

/// Parse workbook bytes or CSV text, whichever the bytes hold
pub fn parse(bytes: &[u8], plan_name: &str) -> Result<ImportedWeek, ImportError> {
    let rows = if is_workbook(bytes) {
        rows_from_workbook(bytes)?
    } else {
        rows_from_text(&String::from_utf8_lossy(bytes))
    };
    Ok(parse_rows(&rows, plan_name))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
