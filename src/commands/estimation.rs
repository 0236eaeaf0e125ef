use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::EngineConfig;
use crate::db::AppState;
use crate::matcher::find_best_match_with;
use crate::models::{PersonalBestLift, WeightUnit, Workout};
use crate::store;
use crate::strength::{candidate_pool, estimate_for_workout, resolve_exercise_name};

/// ---------------------------------------------------------------------------
/// Load Labels
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSuggestion {
  pub workout_id: Option<i64>,
  pub day_name: String,
  pub exercise_name: String,
  /// Candidate name the exercise resolved to, if any
  pub matched_name: Option<String>,
  pub estimated_load: Option<f64>,
  pub label: Option<String>,
}

/// What to show next to a prescribed lift: "BW", the prescribed load, or an
/// estimate from personal bests. `None` when none of these apply.
pub fn load_label(
  workout: &Workout,
  personal_bests: &[PersonalBestLift],
  unit: WeightUnit,
  config: &EngineConfig,
) -> Option<String> {
  match workout.load {
    Some(load) if load == 0.0 => Some("BW".to_string()),
    Some(load) if load > 0.0 => Some(unit.format_load(load)),
    _ => estimate_for_workout(workout, personal_bests, &[], config)
      .map(|estimate| format!("Est. {}", unit.format_load(estimate))),
  }
}

/// Load suggestions for every workout of a plan, in program order
pub async fn suggest_loads(state: &AppState, plan_id: i64) -> Result<Vec<LoadSuggestion>, String> {
  let days = store::load_plan_days(&state.db, plan_id).await?;
  let personal_bests = store::load_personal_bests(&state.db).await?;
  let unit = store::get_weight_unit(&state.db).await?;
  let config = &state.config;
  let pbs = personal_bests.as_slice();

  let suggestions: Vec<LoadSuggestion> = days
    .iter()
    .filter(|(day, _)| !day.is_rest())
    .flat_map(|(day, workouts)| {
      workouts.iter().map(move |workout| LoadSuggestion {
        workout_id: workout.id,
        day_name: day.name.clone(),
        exercise_name: workout.exercise_name.clone(),
        matched_name: resolve_exercise_name(&workout.exercise_name, pbs, &[], config),
        estimated_load: match workout.load {
          None => estimate_for_workout(workout, pbs, &[], config),
          Some(_) => None,
        },
        label: load_label(workout, pbs, unit, config),
      })
    })
    .collect();

  info!(
    plan_id,
    workouts = suggestions.len(),
    estimated = suggestions.iter().filter(|s| s.estimated_load.is_some()).count(),
    "Suggested loads"
  );
  Ok(suggestions)
}

/// ---------------------------------------------------------------------------
/// Completion & Personal Bests
/// ---------------------------------------------------------------------------

/// Personal best name to record a finished lift under: the closest recorded
/// or default lift name, or the workout's own name when nothing is close enough
pub fn suggest_pb_name(workout: &Workout, personal_bests: &[PersonalBestLift], config: &EngineConfig) -> String {
  let names = candidate_pool(personal_bests, &[]);

  find_best_match_with(&workout.exercise_name, &names, &config.matcher)
    .unwrap_or(workout.exercise_name.as_str())
    .to_string()
}

/// The record for exactly this name and rep count
pub fn find_existing_pb<'a>(
  name: &str,
  reps: i32,
  personal_bests: &'a [PersonalBestLift],
) -> Option<&'a PersonalBestLift> {
  personal_bests
    .iter()
    .find(|pb| pb.exercise_name == name && pb.rep_count == reps)
}

/// A successful lift beats the existing record, or there is no record yet
pub fn is_new_pb(success: bool, load: f64, existing: Option<&PersonalBestLift>) -> bool {
  success && existing.map_or(true, |pb| load > pb.load)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiftResult {
  pub pb_name: String,
  pub load: f64,
  pub reps: i32,
  pub success: bool,
}

/// Build the lift to record for a workout. A missing name falls back to
/// [`suggest_pb_name`] and missing reps to the workout's prescribed reps.
pub async fn lift_result_for(
  state: &AppState,
  workout_id: i64,
  name: Option<&str>,
  load: f64,
  reps: Option<i32>,
  success: bool,
) -> Result<LiftResult, String> {
  let workout = store::load_workout(&state.db, workout_id).await?;

  let pb_name = match name {
    Some(name) => name.to_string(),
    None => {
      let personal_bests = store::load_personal_bests(&state.db).await?;
      suggest_pb_name(&workout, &personal_bests, &state.config)
    }
  };
  let reps = reps
    .or_else(|| workout.reps.map(|r| r as i32))
    .ok_or_else(|| format!("Workout {} has no prescribed reps; pass --reps", workout_id))?;

  Ok(LiftResult {
    pb_name,
    load,
    reps,
    success,
  })
}

/// Mark a workout done and store the lift when it sets a new personal best.
/// Returns the saved record, if any.
pub async fn record_lift(
  state: &AppState,
  workout_id: i64,
  result: &LiftResult,
) -> Result<Option<PersonalBestLift>, String> {
  store::set_workout_completed(&state.db, workout_id, true).await?;

  let personal_bests = store::load_personal_bests(&state.db).await?;
  let existing = find_existing_pb(&result.pb_name, result.reps, &personal_bests);

  if !is_new_pb(result.success, result.load, existing) {
    return Ok(None);
  }

  let saved = match existing {
    Some(pb) => {
      let updated = PersonalBestLift {
        load: result.load,
        ..pb.clone()
      };
      store::update_personal_best(&state.db, &updated).await?;
      updated
    }
    None => {
      let mut pb = PersonalBestLift::new(result.pb_name.as_str(), result.load, result.reps);
      pb.id = Some(store::insert_personal_best(&state.db, &pb).await?);
      pb
    }
  };

  info!(name = %saved.exercise_name, load = saved.load, reps = saved.rep_count, "New personal best");
  Ok(Some(saved))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::Day;
  use crate::test_utils::*;

  fn workout(name: &str, reps: Option<u32>, rpe: &str, load: Option<f64>) -> Workout {
    Workout {
      reps,
      rpe: rpe.to_string(),
      load,
      ..Workout::new(name)
    }
  }

  #[test]
  fn test_load_label_variants() {
    let pbs = mock_personal_bests();
    let config = EngineConfig::default();

    let bodyweight = workout("Pull ups", Some(8), "8", Some(0.0));
    let prescribed = workout("Back Squat", Some(5), "8", Some(225.0));
    let estimated = workout("SSB squat to low box", Some(5), "8", None);
    let unknown = workout("Banded face pull", Some(15), "", None);

    assert_eq!(load_label(&bodyweight, &pbs, WeightUnit::Lbs, &config), Some("BW".to_string()));
    assert_eq!(
      load_label(&prescribed, &pbs, WeightUnit::Lbs, &config),
      Some("225.0 lbs".to_string())
    );
    assert_eq!(
      load_label(&estimated, &pbs, WeightUnit::Kg, &config),
      Some("Est. 123.8 kg".to_string())
    );
    assert_eq!(load_label(&unknown, &pbs, WeightUnit::Lbs, &config), None);
  }

  #[test]
  fn test_suggest_pb_name_prefers_recorded_names() {
    let pbs = mock_personal_bests();
    let config = EngineConfig::default();

    let squat = workout("back squat", Some(3), "9", None);
    let novel = workout("Zercher carry", None, "", None);

    assert_eq!(suggest_pb_name(&squat, &pbs, &config), "Back Squat");
    assert_eq!(suggest_pb_name(&novel, &pbs, &config), "Zercher carry");
  }

  #[test]
  fn test_suggest_pb_name_falls_back_to_default_lifts() {
    let pbs = mock_personal_bests();
    let config = EngineConfig::default();

    let front = workout("Front squat", Some(3), "8", None);
    let snatch = workout("snatch", Some(1), "", None);

    assert_eq!(suggest_pb_name(&front, &pbs, &config), "Front Squat");
    assert_eq!(suggest_pb_name(&snatch, &[], &config), "Snatch");
  }

  #[test]
  fn test_find_existing_pb_matches_name_and_reps() {
    let pbs = mock_personal_bests();

    assert_eq!(find_existing_pb("Back Squat", 3, &pbs).map(|pb| pb.load), Some(315.0));
    assert_eq!(find_existing_pb("Back Squat", 1, &pbs).map(|pb| pb.load), Some(300.0));
    assert!(find_existing_pb("Back Squat", 5, &pbs).is_none());
    assert!(find_existing_pb("back squat", 3, &pbs).is_none());
  }

  #[test]
  fn test_is_new_pb() {
    let record = PersonalBestLift::new("Deadlift", 405.0, 1);

    assert!(is_new_pb(true, 410.0, Some(&record)));
    assert!(!is_new_pb(true, 405.0, Some(&record)));
    assert!(!is_new_pb(false, 500.0, Some(&record)));
    assert!(is_new_pb(true, 135.0, None));
  }

  #[tokio::test]
  async fn test_suggest_loads_for_plan() {
    // Arrange
    let state = setup_test_state().await;
    for pb in mock_personal_bests() {
      store::insert_personal_best(&state.db, &pb).await.unwrap();
    }
    let days = vec![
      (
        Day::working("Lower"),
        vec![
          workout("SSB squat to low box", Some(5), "8", None),
          workout("Back Squat", Some(5), "8", Some(225.0)),
        ],
      ),
      (Day::rest("Rest Day"), Vec::new()),
    ];
    let plan_id = store::insert_full_plan(&state.db, &crate::models::Plan::new("Test"), &days)
      .await
      .unwrap();

    // Act
    let suggestions = suggest_loads(&state, plan_id).await.unwrap();

    // Assert
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].day_name, "Lower");
    assert_eq!(suggestions[0].matched_name.as_deref(), Some("Back Squat"));
    assert_eq!(suggestions[0].estimated_load, Some(273.0));
    assert_eq!(suggestions[0].label.as_deref(), Some("Est. 273.0 lbs"));
    assert_eq!(suggestions[1].estimated_load, None);
    assert_eq!(suggestions[1].label.as_deref(), Some("225.0 lbs"));

    teardown_test_db(state.db).await;
  }

  #[tokio::test]
  async fn test_record_lift_saves_only_new_bests() {
    // Arrange
    let state = setup_test_state().await;
    store::insert_personal_best(&state.db, &PersonalBestLift::new("Deadlift", 405.0, 1))
      .await
      .unwrap();
    let plan_id = store::insert_full_plan(&state.db, &crate::models::Plan::new("Test"), &sample_day_plan())
      .await
      .unwrap();
    let days = store::load_plan_days(&state.db, plan_id).await.unwrap();
    let workout_id = days[0].1[0].id.unwrap();

    let failed = LiftResult {
      pb_name: "Deadlift".to_string(),
      load: 500.0,
      reps: 1,
      success: false,
    };
    let heavier = LiftResult {
      success: true,
      ..failed.clone()
    };
    let new_rep_count = LiftResult {
      reps: 3,
      load: 385.0,
      ..heavier.clone()
    };

    // Act & Assert
    assert_eq!(record_lift(&state, workout_id, &failed).await.unwrap(), None);

    let saved = record_lift(&state, workout_id, &heavier).await.unwrap().unwrap();
    assert_eq!(saved.load, 500.0);

    record_lift(&state, workout_id, &new_rep_count).await.unwrap();
    let pbs = store::load_personal_bests(&state.db).await.unwrap();
    assert_eq!(pbs.len(), 2);
    assert_eq!(find_existing_pb("Deadlift", 1, &pbs).map(|pb| pb.load), Some(500.0));
    assert_eq!(find_existing_pb("Deadlift", 3, &pbs).map(|pb| pb.load), Some(385.0));

    let days = store::load_plan_days(&state.db, plan_id).await.unwrap();
    assert!(days[0].1[0].is_completed);

    teardown_test_db(state.db).await;
  }

  #[tokio::test]
  async fn test_lift_result_for_fills_missing_name_and_reps() {
    // Arrange
    let state = setup_test_state().await;
    for pb in mock_personal_bests() {
      store::insert_personal_best(&state.db, &pb).await.unwrap();
    }
    let plan_id = store::insert_full_plan(&state.db, &crate::models::Plan::new("Test"), &sample_day_plan())
      .await
      .unwrap();
    let days = store::load_plan_days(&state.db, plan_id).await.unwrap();
    let squat_id = days[0].1[0].id.unwrap();

    // Act
    let suggested = lift_result_for(&state, squat_id, None, 235.0, None, true).await.unwrap();
    let explicit = lift_result_for(&state, squat_id, Some("Pause Squat"), 205.0, Some(2), false)
      .await
      .unwrap();
    let missing = lift_result_for(&state, 9999, None, 100.0, None, true).await;

    // Assert
    assert_eq!(suggested.pb_name, "Back Squat");
    assert_eq!(suggested.reps, 5);
    assert!(suggested.success);
    assert_eq!(explicit.pb_name, "Pause Squat");
    assert_eq!(explicit.reps, 2);
    assert!(!explicit.success);
    assert!(missing.is_err());

    teardown_test_db(state.db).await;
  }
}
