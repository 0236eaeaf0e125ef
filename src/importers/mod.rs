//! Program importers
//!
//! Three source dialects share one entry point, [`import_program`]. The caller
//! picks the dialect; each parser turns the raw document into the canonical
//! Plan / Block / Day / Workout model without touching storage.

pub mod multi_week;
pub mod spreadsheet;
pub mod tokenizer;
pub mod weekly_block;

use std::io::Read;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ImportConfig;
use crate::models::{ImportedBlock, ImportedWeek, Plan};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// ---------------------------------------------------------------------------
/// Dialect
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
  /// Sequential week and day sections, one plan per week
  WeeklyBlock,
  /// Parallel week column groups, flattened into one block
  MultiWeek,
  /// Row-oriented workbook or CSV sheet, one plan
  Spreadsheet,
}

impl std::fmt::Display for Dialect {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Dialect::WeeklyBlock => write!(f, "weekly_block"),
      Dialect::MultiWeek => write!(f, "multi_week"),
      Dialect::Spreadsheet => write!(f, "spreadsheet"),
    }
  }
}

impl std::str::FromStr for Dialect {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().replace('-', "_").as_str() {
      "weekly_block" => Ok(Dialect::WeeklyBlock),
      "multi_week" => Ok(Dialect::MultiWeek),
      "spreadsheet" => Ok(Dialect::Spreadsheet),
      _ => Err(format!("Unknown import dialect: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
  #[error("Failed to read source: {0}")]
  Unreadable(#[from] std::io::Error),

  #[error("Failed to open workbook: {0}")]
  Workbook(String),

  #[error("Source is empty")]
  Empty,

  #[error("No program found in source")]
  NoProgramFound,
}

impl Serialize for ImportError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Imported Program
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImportedProgram {
  Weekly { weeks: Vec<ImportedWeek> },
  Block { block: ImportedBlock },
  Sheet { week: ImportedWeek },
}

impl ImportedProgram {
  /// The shape a dialect yields when nothing was found
  pub fn empty(dialect: Dialect, name: &str) -> Self {
    match dialect {
      Dialect::WeeklyBlock => ImportedProgram::Weekly { weeks: Vec::new() },
      Dialect::MultiWeek => ImportedProgram::Block {
        block: ImportedBlock {
          name: name.to_string(),
          notes: Vec::new(),
          days: Vec::new(),
        },
      },
      Dialect::Spreadsheet => ImportedProgram::Sheet {
        week: ImportedWeek {
          plan: Plan::new(name),
          days: Vec::new(),
        },
      },
    }
  }

  pub fn day_count(&self) -> usize {
    match self {
      ImportedProgram::Weekly { weeks } => weeks.iter().map(|w| w.days.len()).sum(),
      ImportedProgram::Block { block } => block.days.len(),
      ImportedProgram::Sheet { week } => week.days.len(),
    }
  }

  pub fn workout_count(&self) -> usize {
    let count = |days: &crate::models::DayPlan| days.iter().map(|(_, w)| w.len()).sum::<usize>();
    match self {
      ImportedProgram::Weekly { weeks } => weeks.iter().map(|w| count(&w.days)).sum(),
      ImportedProgram::Block { block } => count(&block.days),
      ImportedProgram::Sheet { week } => count(&week.days),
    }
  }

  pub fn is_empty(&self) -> bool {
    match self {
      ImportedProgram::Weekly { weeks } => weeks.is_empty(),
      _ => self.day_count() == 0,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Entry Points
/// ---------------------------------------------------------------------------

/// Read the whole source, dropping a UTF-8 byte order mark
pub fn read_source<R: Read>(mut reader: R) -> Result<Vec<u8>, ImportError> {
  let mut bytes = Vec::new();
  reader.read_to_end(&mut bytes)?;

  let bytes = match bytes.strip_prefix(UTF8_BOM) {
    Some(rest) => rest.to_vec(),
    None => bytes,
  };

  if bytes.iter().all(|b| b.is_ascii_whitespace()) {
    return Err(ImportError::Empty);
  }
  Ok(bytes)
}

/// Parse `reader` as `dialect`. `name` names the block (multi-week) or the
/// plan (spreadsheet); weekly-block plans are named by their week labels.
pub fn import_program<R: Read>(
  dialect: Dialect,
  reader: R,
  name: &str,
  config: &ImportConfig,
) -> Result<ImportedProgram, ImportError> {
  let bytes = read_source(reader)?;

  let program = match dialect {
    Dialect::WeeklyBlock => ImportedProgram::Weekly {
      weeks: weekly_block::parse(&String::from_utf8_lossy(&bytes)),
    },
    Dialect::MultiWeek => {
      let discovery = config.week_discovery.discovery();
      ImportedProgram::Block {
        block: multi_week::parse(&String::from_utf8_lossy(&bytes), name, discovery.as_ref()),
      }
    }
    Dialect::Spreadsheet => ImportedProgram::Sheet {
      week: spreadsheet::parse(&bytes, name)?,
    },
  };

  if program.is_empty() {
    return Err(ImportError::NoProgramFound);
  }

  info!(
    dialect = %dialect,
    days = program.day_count(),
    workouts = program.workout_count(),
    "Imported program"
  );
  Ok(program)
}

/// Like [`import_program`] but any failure degrades to an empty program
pub fn import_or_empty<R: Read>(
  dialect: Dialect,
  reader: R,
  name: &str,
  config: &ImportConfig,
) -> ImportedProgram {
  import_program(dialect, reader, name, config).unwrap_or_else(|e| {
    warn!(dialect = %dialect, error = %e, "Import failed, returning empty program");
    ImportedProgram::empty(dialect, name)
  })
}
