use serde::{Deserialize, Serialize};

/// Historical best: `load` lifted for `rep_count` reps.
/// Several records may share a name at different rep counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PersonalBestLift {
  pub id: Option<i64>,
  pub exercise_name: String,
  pub load: f64,
  pub rep_count: i32,
}

impl PersonalBestLift {
  pub fn new(exercise_name: impl Into<String>, load: f64, rep_count: i32) -> Self {
    Self {
      id: None,
      exercise_name: exercise_name.into(),
      load,
      rep_count,
    }
  }
}
