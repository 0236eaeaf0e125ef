//! Command-line surface
//!
//! ```bash
//! exerplan import program.csv --dialect multi-week --name "Block 1" --primary
//! exerplan plans
//! exerplan estimate 3
//! exerplan complete 12 --load 235
//! exerplan done day 4
//! exerplan pb add "Back Squat" 315 3
//! exerplan unit kg
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::commands::estimation::{lift_result_for, record_lift, suggest_loads};
use crate::commands::import::{import_program_file, ImportOptions};
use crate::db::AppState;
use crate::importers::Dialect;
use crate::models::{PersonalBestLift, WeightUnit};
use crate::store;

#[derive(Debug, Parser)]
#[command(
  name = "exerplan",
  about = "Import training programs and estimate working loads",
  long_about = "Imports training programs from CSV or workbook files into a local SQLite database and suggests working loads from personal bests."
)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Command,

  /// Database URL override
  #[arg(long, global = true)]
  pub database_url: Option<String>,

  /// Print results as JSON
  #[arg(long, global = true)]
  pub json: bool,

  /// Enable debug logging
  #[arg(long, short = 'v', global = true)]
  pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Import a program file
  Import {
    path: PathBuf,

    /// weekly-block, multi-week or spreadsheet
    #[arg(long, short, default_value = "weekly-block")]
    dialect: Dialect,

    /// Plan name (new plan) or block name (existing plan)
    #[arg(long)]
    name: Option<String>,

    /// Add to this plan instead of creating a new one
    #[arg(long)]
    plan: Option<i64>,

    /// Make the imported plan primary
    #[arg(long)]
    primary: bool,
  },

  /// List plans
  Plans,

  /// Make a plan primary
  Primary { plan_id: i64 },

  /// Delete a plan with its blocks, days and workouts
  Delete { plan_id: i64 },

  /// Suggest loads for a plan (defaults to the primary plan)
  Estimate { plan_id: Option<i64> },

  /// Mark a workout done and record the lift
  Complete {
    workout_id: i64,

    /// Personal best name to record under (suggested when omitted)
    #[arg(long)]
    name: Option<String>,

    /// Load lifted, in the display unit
    #[arg(long)]
    load: f64,

    /// Reps completed (defaults to the prescribed reps)
    #[arg(long)]
    reps: Option<i32>,

    /// The lift was missed
    #[arg(long)]
    failed: bool,
  },

  /// Mark a workout, day or block done
  Done {
    target: CompletionTarget,
    id: i64,

    /// Clear the completed flag instead
    #[arg(long)]
    undo: bool,
  },

  /// Personal best management
  Pb {
    #[command(subcommand)]
    action: PbCommand,
  },

  /// Show or set the display weight unit
  Unit { unit: Option<WeightUnit> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CompletionTarget {
  Workout,
  Day,
  Block,
}

#[derive(Debug, Subcommand)]
pub enum PbCommand {
  /// Record a personal best
  Add {
    name: String,
    /// Load in the display unit
    load: f64,
    #[arg(default_value = "1")]
    reps: i32,
  },

  /// List personal bests
  List,

  /// Delete a personal best by id
  Delete { id: i64 },
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T) -> String) -> Result<(), String> {
  if json {
    let out = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize output: {}", e))?;
    println!("{}", out);
  } else {
    println!("{}", text(value));
  }
  Ok(())
}

/// Run one parsed command against the database
pub async fn execute(cli: &Cli, state: &AppState) -> Result<(), String> {
  let json = cli.json;

  match &cli.command {
    Command::Import {
      path,
      dialect,
      name,
      plan,
      primary,
    } => {
      let options = ImportOptions {
        target_plan_id: *plan,
        custom_name: name.clone(),
        make_primary: *primary,
      };
      let summary = import_program_file(state, *dialect, path, &options).await?;
      emit(json, &summary, |summary| match summary {
        Some(s) => format!(
          "Imported {} days ({} workouts) into plan {}",
          s.days, s.workouts, s.plan_id
        ),
        None => "No program found".to_string(),
      })
    }

    Command::Plans => {
      let plans = store::load_plans(&state.db).await?;
      emit(json, &plans, |plans| {
        plans
          .iter()
          .map(|p| {
            let marker = if p.is_primary { "*" } else { " " };
            format!("{} {:>4}  {}", marker, p.id.unwrap_or_default(), p.name)
          })
          .collect::<Vec<_>>()
          .join("\n")
      })
    }

    Command::Primary { plan_id } => {
      store::set_primary_plan(&state.db, *plan_id).await?;
      emit(json, plan_id, |id| format!("Plan {} is now primary", id))
    }

    Command::Delete { plan_id } => {
      store::delete_plan(&state.db, *plan_id).await?;
      emit(json, plan_id, |id| format!("Deleted plan {}", id))
    }

    Command::Estimate { plan_id } => {
      let plan_id = match plan_id {
        Some(id) => *id,
        None => store::load_primary_plan(&state.db)
          .await?
          .and_then(|p| p.id)
          .ok_or_else(|| "No primary plan; pass a plan id".to_string())?,
      };
      let suggestions = suggest_loads(state, plan_id).await?;
      emit(json, &suggestions, |suggestions| {
        suggestions
          .iter()
          .map(|s| {
            format!(
              "{:<24} {:<32} {}",
              s.day_name,
              s.exercise_name,
              s.label.as_deref().unwrap_or("-")
            )
          })
          .collect::<Vec<_>>()
          .join("\n")
      })
    }

    Command::Complete {
      workout_id,
      name,
      load,
      reps,
      failed,
    } => {
      let unit = store::get_weight_unit(&state.db).await?;
      let result = lift_result_for(
        state,
        *workout_id,
        name.as_deref(),
        unit.to_stored(*load),
        *reps,
        !failed,
      )
      .await?;
      let saved = record_lift(state, *workout_id, &result).await?;
      emit(json, &saved, |saved| match saved {
        Some(pb) => format!(
          "New personal best: {} {} x {}",
          pb.exercise_name,
          unit.format_load(pb.load),
          pb.rep_count
        ),
        None => "Workout completed".to_string(),
      })
    }

    Command::Done { target, id, undo } => {
      let completed = !undo;
      match target {
        CompletionTarget::Workout => store::set_workout_completed(&state.db, *id, completed).await?,
        CompletionTarget::Day => store::set_day_completed(&state.db, *id, completed).await?,
        CompletionTarget::Block => store::set_block_completed(&state.db, *id, completed).await?,
      }
      emit(json, &(target, id, completed), |(target, id, completed)| {
        let status = if *completed { "completed" } else { "not completed" };
        format!("{:?} {} marked {}", target, id, status)
      })
    }

    Command::Pb { action } => match action {
      PbCommand::Add { name, load, reps } => {
        let unit = store::get_weight_unit(&state.db).await?;
        let pb = PersonalBestLift::new(name.as_str(), unit.to_stored(*load), *reps);
        let id = store::insert_personal_best(&state.db, &pb).await?;
        emit(json, &id, |id| format!("Saved personal best {}", id))
      }
      PbCommand::List => {
        let pbs = store::load_personal_bests(&state.db).await?;
        let unit = store::get_weight_unit(&state.db).await?;
        emit(json, &pbs, |pbs| {
          pbs
            .iter()
            .map(|pb| {
              format!(
                "{:>4}  {:<24} {} x {}",
                pb.id.unwrap_or_default(),
                pb.exercise_name,
                unit.format_load(pb.load),
                pb.rep_count
              )
            })
            .collect::<Vec<_>>()
            .join("\n")
        })
      }
      PbCommand::Delete { id } => {
        store::delete_personal_best(&state.db, *id).await?;
        emit(json, id, |id| format!("Deleted personal best {}", id))
      }
    },

    Command::Unit { unit } => {
      if let Some(unit) = unit {
        store::set_weight_unit(&state.db, *unit).await?;
      }
      let current = store::get_weight_unit(&state.db).await?;
      emit(json, &current, |unit| unit.to_string())
    }
  }
}
