use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

use sqlx::SqliteConnection;
use tracing::info;

use crate::db::AppState;
use crate::importers::{import_program, Dialect, ImportError, ImportedProgram};
use crate::models::Plan;
use crate::store;

/// Fallback names when the source path has no usable file stem
const DEFAULT_PLAN_NAME: &str = "Imported Plan";
const DEFAULT_BLOCK_NAME: &str = "Imported Block";

/// ---------------------------------------------------------------------------
/// Import Options & Results
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
  /// Add the imported program to this plan instead of creating a new one
  pub target_plan_id: Option<i64>,
  /// Overrides the plan (new plan) or block (target plan) name
  pub custom_name: Option<String>,
  pub make_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
  pub plan_id: i64,
  pub block_ids: Vec<i64>,
  pub days: usize,
  pub workouts: usize,
}

/// Name a weekly-block week's block. Several weeks become "Week N", prefixed
/// with the custom name only when importing into an existing plan.
pub fn weekly_block_name(index: usize, week_count: usize, options: &ImportOptions) -> String {
  let custom = options.custom_name.as_deref();

  if week_count > 1 {
    match (custom, options.target_plan_id) {
      (Some(name), Some(_)) => format!("{} - Week {}", name, index + 1),
      _ => format!("Week {}", index + 1),
    }
  } else {
    custom.unwrap_or(DEFAULT_BLOCK_NAME).to_string()
  }
}

fn source_name(path: &Path) -> String {
  path
    .file_stem()
    .and_then(|s| s.to_str())
    .filter(|s| !s.trim().is_empty())
    .unwrap_or(DEFAULT_PLAN_NAME)
    .to_string()
}

/// ---------------------------------------------------------------------------
/// Persistence Flows
/// ---------------------------------------------------------------------------

/// Target plan id, or a new empty plan named `name`
async fn plan_for_blocks(
  conn: &mut SqliteConnection,
  options: &ImportOptions,
  name: &str,
) -> Result<i64, String> {
  match options.target_plan_id {
    Some(plan_id) => {
      store::ensure_plan_exists(conn, plan_id).await?;
      Ok(plan_id)
    }
    None => {
      let mut plan = Plan::new(name);
      plan.is_primary = options.make_primary;
      store::insert_plan_row(conn, &plan).await
    }
  }
}

/// Write every row of the program on one connection; returns the plan id
async fn write_program(
  conn: &mut SqliteConnection,
  program: &ImportedProgram,
  options: &ImportOptions,
  source_name: &str,
  block_ids: &mut Vec<i64>,
) -> Result<i64, String> {
  let custom = options.custom_name.as_deref();

  let plan_id = match program {
    ImportedProgram::Weekly { weeks } => {
      let plan_id = plan_for_blocks(conn, options, custom.unwrap_or(source_name)).await?;
      for (index, week) in weeks.iter().enumerate() {
        let name = weekly_block_name(index, weeks.len(), options);
        let (block_id, _) = store::insert_block_rows(conn, plan_id, &name, &week.plan.notes, &week.days).await?;
        block_ids.push(block_id);
      }
      plan_id
    }
    ImportedProgram::Block { block } => {
      let plan_id = plan_for_blocks(conn, options, custom.unwrap_or(source_name)).await?;
      let name = custom.unwrap_or(&block.name);
      let (block_id, _) = store::insert_block_rows(conn, plan_id, name, &block.notes, &block.days).await?;
      block_ids.push(block_id);
      plan_id
    }
    ImportedProgram::Sheet { week } => match options.target_plan_id {
      Some(plan_id) => {
        store::ensure_plan_exists(conn, plan_id).await?;
        let name = custom.unwrap_or(&week.plan.name);
        let (block_id, _) = store::insert_block_rows(conn, plan_id, name, &week.plan.notes, &week.days).await?;
        block_ids.push(block_id);
        plan_id
      }
      None => {
        let mut plan = week.plan.clone();
        if let Some(name) = custom {
          plan.name = name.to_string();
        }
        plan.is_primary = options.make_primary;
        let plan_id = store::insert_plan_row(conn, &plan).await?;
        store::insert_days(conn, plan_id, None, &week.days).await?;
        plan_id
      }
    },
  };

  if options.make_primary {
    store::set_primary_rows(conn, plan_id).await?;
  }
  Ok(plan_id)
}

/// Store an imported program according to `options`, all or nothing
pub async fn persist_program(
  state: &AppState,
  program: &ImportedProgram,
  options: &ImportOptions,
  source_name: &str,
) -> Result<ImportSummary, String> {
  let mut tx = state
    .db
    .begin()
    .await
    .map_err(|e| format!("Failed to start transaction: {}", e))?;

  let mut block_ids = Vec::new();
  let plan_id = write_program(&mut tx, program, options, source_name, &mut block_ids).await?;

  tx.commit()
    .await
    .map_err(|e| format!("Failed to commit import: {}", e))?;

  Ok(ImportSummary {
    plan_id,
    block_ids,
    days: program.day_count(),
    workouts: program.workout_count(),
  })
}

/// ---------------------------------------------------------------------------
/// Commands
/// ---------------------------------------------------------------------------

/// Import a program file. Returns `None` when the file holds no program.
pub async fn import_program_file(
  state: &AppState,
  dialect: Dialect,
  path: &Path,
  options: &ImportOptions,
) -> Result<Option<ImportSummary>, String> {
  let name = source_name(path);
  let file = File::open(path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;

  let program = match import_program(dialect, file, &name, &state.config.import) {
    Ok(program) => program,
    Err(ImportError::Empty) | Err(ImportError::NoProgramFound) => {
      info!(path = %path.display(), dialect = %dialect, "Nothing to import");
      return Ok(None);
    }
    Err(e) => return Err(e.to_string()),
  };

  let summary = persist_program(state, &program, options, &name).await?;
  info!(
    plan_id = summary.plan_id,
    blocks = summary.block_ids.len(),
    days = summary.days,
    workouts = summary.workouts,
    "Import complete"
  );
  Ok(Some(summary))
}
