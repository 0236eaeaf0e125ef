//! Engine configuration
//!
//! Every knob has a default; `from_env` overrides them from `EXERPLAN_*`
//! variables (a `.env` file is loaded by the binary before this runs).

use serde::{Deserialize, Serialize};
use std::env;

use crate::importers::multi_week::WeekDiscoveryStrategy;
use crate::matcher::{SimilarityAlgorithm, DEFAULT_THRESHOLD};
use crate::strength::OneRepMaxFormula;

pub const ENV_MATCH_ALGORITHM: &str = "EXERPLAN_MATCH_ALGORITHM";
pub const ENV_MATCH_THRESHOLD: &str = "EXERPLAN_MATCH_THRESHOLD";
pub const ENV_ONE_RM_FORMULA: &str = "EXERPLAN_ONE_RM_FORMULA";
pub const ENV_KEYWORD_FALLBACK: &str = "EXERPLAN_KEYWORD_FALLBACK";
pub const ENV_WEEK_DISCOVERY: &str = "EXERPLAN_WEEK_DISCOVERY";
pub const ENV_DATABASE_URL: &str = "EXERPLAN_DATABASE_URL";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://exerplan.db?mode=rwc";

/// ---------------------------------------------------------------------------
/// Configuration Sections
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
  pub algorithm: SimilarityAlgorithm,
  pub threshold: f64,
}

impl Default for MatcherConfig {
  fn default() -> Self {
    Self {
      algorithm: SimilarityAlgorithm::default(),
      threshold: DEFAULT_THRESHOLD,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrengthConfig {
  pub formula: OneRepMaxFormula,
  /// Map names like "Pin squat" by keyword when fuzzy matching finds nothing
  pub keyword_fallback: bool,
}

impl Default for StrengthConfig {
  fn default() -> Self {
    Self {
      formula: OneRepMaxFormula::default(),
      keyword_fallback: true,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportConfig {
  pub week_discovery: WeekDiscoveryStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
  pub matcher: MatcherConfig,
  pub strength: StrengthConfig,
  pub import: ImportConfig,
  pub database_url: String,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      matcher: MatcherConfig::default(),
      strength: StrengthConfig::default(),
      import: ImportConfig::default(),
      database_url: DEFAULT_DATABASE_URL.to_string(),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
  #[error("Invalid value for {key}: {value}")]
  Invalid { key: String, value: String },
}

impl Serialize for ConfigError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// Parse an optional variable, keeping `default` when it is unset or blank
fn parse_var<T, F>(key: &str, default: T, parse: F) -> Result<T, ConfigError>
where
  F: Fn(&str) -> Option<T>,
{
  match env::var(key) {
    Ok(raw) if !raw.trim().is_empty() => parse(raw.trim()).ok_or_else(|| ConfigError::Invalid {
      key: key.to_string(),
      value: raw,
    }),
    _ => Ok(default),
  }
}

fn parse_bool(raw: &str) -> Option<bool> {
  match raw.to_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Some(true),
    "0" | "false" | "no" | "off" => Some(false),
    _ => None,
  }
}

impl EngineConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    let defaults = Self::default();

    let matcher = MatcherConfig {
      algorithm: parse_var(ENV_MATCH_ALGORITHM, defaults.matcher.algorithm, |s| s.parse().ok())?,
      threshold: parse_var(ENV_MATCH_THRESHOLD, defaults.matcher.threshold, |s| {
        s.parse::<f64>().ok().filter(|t| (0.0..=1.0).contains(t))
      })?,
    };

    let strength = StrengthConfig {
      formula: parse_var(ENV_ONE_RM_FORMULA, defaults.strength.formula, |s| s.parse().ok())?,
      keyword_fallback: parse_var(ENV_KEYWORD_FALLBACK, defaults.strength.keyword_fallback, parse_bool)?,
    };

    let import = ImportConfig {
      week_discovery: parse_var(ENV_WEEK_DISCOVERY, defaults.import.week_discovery, |s| s.parse().ok())?,
    };

    let database_url = parse_var(ENV_DATABASE_URL, defaults.database_url, |s| Some(s.to_string()))?;

    Ok(Self {
      matcher,
      strength,
      import,
      database_url,
    })
  }
}
