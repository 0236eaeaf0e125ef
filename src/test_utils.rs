//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Source document fixtures for each import dialect
//! - Mock data factories
//! - Helper assertions

use sqlx::SqlitePool;

use crate::config::EngineConfig;
use crate::db::AppState;
use crate::models::{Day, DayPlan, PersonalBestLift, Workout};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  // Run migrations
  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// In-memory database wrapped in command state with default config
pub async fn setup_test_state() -> AppState {
  AppState {
    db: setup_test_db().await,
    config: EngineConfig::default(),
  }
}

/// ---------------------------------------------------------------------------
/// Source Fixtures
/// ---------------------------------------------------------------------------

/// Two labeled weeks; week 1 has notes, a rest day and an AMRAP row
pub const WEEKLY_BLOCK_CSV: &str = r#",Week 1,,,,,,,,,
,Build the base and groove technique,,,,,,,,,
,FULL BODY 1,,,,,,,,,
,,Exercise,Warm-up Sets,Working Sets,Reps,Load,Tempo,RPE,Rest,Notes
,,Back Squat (Top Single),4,1,1,,,6-8,3-5 min,Top set
,,Back Squat,3,2,5,,,7-9,3-5 min,"Keep tight, brace"
,REST DAY,,,,,,,,,
,FULL BODY 2,,,,,,,,,
,,Push-up,0,2,AMRAP,,,N/A,1-2 min,Bodyweight
,Week 2,,,,,,,,,
,FULL BODY 1,,,,,,,,,
,,Deadlift,2,3,3-5,,,8,3-5 min,
"#;

/// Three parallel weeks of four days; only week 1 carries an RPE column
pub const MULTI_WEEK_CSV: &str = ",GOALS FOR BLOCK ONE
,1. Maximize strength
,2. Drive hypertrophy

,WEEK 1,,,,,,,WEEK 2,,,,,,WEEK 3
,Day 1 - Squat,Sets,Reps,Load,RPE,Notes,,Day 1 - Squat,Sets,Reps,Load,Notes,,Day 1 - Squat,Sets,Reps,Load,Notes

,SSB squat,5,5,,8,,,SSB squat,5,5,0,,,SSB squat,5,5,0

,Day 2 - Press,Sets,Reps,Load,RPE,Notes,,Day 2 - Press,Sets,Reps,Load,Notes,,Day 2 - Press,Sets,Reps,Load,Notes

,Bench press,5,5,,8,,,Bench press,5,5,0,,,Bench press,5,5,0

,Day 3 - Hinge,Sets,Reps,Load,RPE,Notes,,Day 3 - Hinge,Sets,Reps,Load,Notes,,Day 3 - Hinge,Sets,Reps,Load,Notes

,RDL,5,5,,8,,,RDL,5,5,0,,,RDL,5,5,0

,Day 4 - Pull,Sets,Reps,Load,RPE,Notes,,Day 4 - Pull,Sets,Reps,Load,Notes,,Day 4 - Pull,Sets,Reps,Load,Notes

,Pull ups,5,3,,8,,,Pull ups,5,3,2.5,,,Pull ups,5,3,5
";

/// Row-oriented sheet rendered as CSV: a title row, a header row, two days
pub const SPREADSHEET_CSV: &str = "Program Overview,,,,,,
DAY 1 - Lower,,,,,,
Exercise,Sets,Reps,Load,RPE,Rest,Notes
Back Squat,3,5,225,8,3 min,Belt on top set
Walking Lunge,3,10,0,7,90 sec,
DAY 2 - Upper,,,,,,
Bench Press,4,6,185,8.5,2-3 min,Pause first rep
Chin-up,3,8,,,2 min,
";

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Personal bests with a clear best Back Squat (315 x 3 -> 341.25 1RM)
pub fn mock_personal_bests() -> Vec<PersonalBestLift> {
  vec![
    PersonalBestLift::new("Back Squat", 300.0, 1),
    PersonalBestLift::new("Back Squat", 315.0, 3),
    PersonalBestLift::new("Bench Press", 225.0, 5),
    PersonalBestLift::new("Deadlift", 405.0, 1),
  ]
}

/// A working day with two lifts followed by a rest day
pub fn sample_day_plan() -> DayPlan {
  let squat = Workout {
    sets: 5,
    warm_up_sets: 2,
    working_sets: 3,
    reps: Some(5),
    load: Some(225.0),
    rpe: "8".to_string(),
    rest: "3-5 min".to_string(),
    ..Workout::new("Back Squat")
  };
  let row = Workout {
    sets: 3,
    working_sets: 3,
    reps: Some(10),
    rpe: "9".to_string(),
    ..Workout::new("Chest-supported row")
  };

  vec![
    (Day::working("FULL BODY 1"), vec![squat, row]),
    (Day::rest("Rest Day"), Vec::new()),
  ]
}

/// ---------------------------------------------------------------------------
/// Assertion Helpers
/// ---------------------------------------------------------------------------

/// Assert two floats are equal within a tolerance (default 1e-9)
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr) => {
    $crate::assert_approx_eq!($left, $right, 1e-9)
  };
  ($left:expr, $right:expr, $tolerance:expr) => {{
    let diff = (($left) as f64 - ($right) as f64).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  }};
}

/// ---------------------------------------------------------------------------
/// Self-Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_test_db_runs_migrations() {
    let pool = setup_test_db().await;

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_settings")
      .fetch_one(&pool)
      .await
      .expect("user_settings should exist");
    assert_eq!(count.0, 1);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_assert_approx_eq_macro() {
    assert_approx_eq!(0.1 + 0.2, 0.3);
    assert_approx_eq!(330.41, 330.4, 0.1);
  }
}
