use serde::{Deserialize, Serialize};

/// Pounds per kilogram. Loads are stored in pounds.
pub const KG_TO_LBS: f64 = 2.20462;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
  Kg,
  #[default]
  Lbs,
}

impl WeightUnit {
  pub fn as_str(&self) -> &'static str {
    match self {
      WeightUnit::Kg => "kg",
      WeightUnit::Lbs => "lbs",
    }
  }

  /// Convert a stored (pound) load into this unit
  pub fn from_stored(&self, lbs: f64) -> f64 {
    match self {
      WeightUnit::Kg => lbs / KG_TO_LBS,
      WeightUnit::Lbs => lbs,
    }
  }

  /// Convert a load entered in this unit into the stored (pound) value
  pub fn to_stored(&self, load: f64) -> f64 {
    match self {
      WeightUnit::Kg => load * KG_TO_LBS,
      WeightUnit::Lbs => load,
    }
  }

  /// Format a stored load in this unit, e.g. 225 -> "225.0 lbs" or "102.1 kg"
  pub fn format_load(&self, lbs: f64) -> String {
    format!("{:.1} {}", self.from_stored(lbs), self.as_str())
  }
}

impl std::fmt::Display for WeightUnit {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl std::str::FromStr for WeightUnit {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "kg" => Ok(WeightUnit::Kg),
      "lbs" | "lb" => Ok(WeightUnit::Lbs),
      _ => Err(format!("Unknown weight unit: {}", s)),
    }
  }
}
