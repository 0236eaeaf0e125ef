//! Strength estimation
//!
//! Converts a personal best (weight x reps) into an estimated one-rep max and
//! inverts the same model to suggest a working load for a target rep count at
//! a target RPE. Reps in reserve (10 - RPE) are added to the target reps, so
//! 5 reps @ RPE 8 is treated as a 7-rep max.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::EngineConfig;
use crate::matcher::{find_best_match_with, keyword_match};
use crate::models::{PersonalBestLift, Workout};

/// Lifts every lifter is offered a personal best slot for
pub const DEFAULT_PR_TYPES: [&str; 7] = [
    "Back Squat",
    "Front Squat",
    "Deadlift",
    "Bench Press",
    "Clean",
    "Clean and Jerk",
    "Snatch",
];

const MAX_RPE: f64 = 10.0;
const RPE_ADJUSTED_DIVISOR: f64 = 24.0;
const EPLEY_DIVISOR: f64 = 30.0;

static RPE_RANGE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)\s*-\s*(\d+\.?\d*)").ok());

static RPE_SINGLE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(\d+\.?\d*)").ok());

/// ---------------------------------------------------------------------------
/// One-Rep-Max Model
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OneRepMaxFormula {
    /// weight * (1 + (reps - 1) / 24); a single is exactly the weight lifted
    #[default]
    RpeAdjusted,
    /// weight * (1 + reps / 30)
    Epley,
}

impl OneRepMaxFormula {
    /// Multiplier applied to a load lifted for `reps` (fractional reps allowed)
    fn factor(&self, reps: f64) -> f64 {
        match self {
            OneRepMaxFormula::RpeAdjusted => 1.0 + (reps - 1.0) / RPE_ADJUSTED_DIVISOR,
            OneRepMaxFormula::Epley => 1.0 + reps / EPLEY_DIVISOR,
        }
    }
}

impl std::fmt::Display for OneRepMaxFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OneRepMaxFormula::RpeAdjusted => write!(f, "rpe_adjusted"),
            OneRepMaxFormula::Epley => write!(f, "epley"),
        }
    }
}

impl std::str::FromStr for OneRepMaxFormula {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rpe_adjusted" => Ok(Self::RpeAdjusted),
            "epley" => Ok(Self::Epley),
            _ => Err(format!("Unknown one-rep-max formula: {}", s)),
        }
    }
}

/// Estimated one-rep max with the default formula
pub fn one_rep_max(weight: f64, reps: i32) -> f64 {
    one_rep_max_with(weight, reps, OneRepMaxFormula::default())
}

pub fn one_rep_max_with(weight: f64, reps: i32, formula: OneRepMaxFormula) -> f64 {
    match reps {
        r if r <= 0 => 0.0,
        1 => weight,
        r => weight * formula.factor(r as f64),
    }
}

/// Suggested load with the default formula, rounded to the nearest 0.5
pub fn estimate_load(one_rm: f64, target_reps: u32, target_rpe: f64) -> f64 {
    estimate_load_with(one_rm, target_reps, target_rpe, OneRepMaxFormula::default())
}

pub fn estimate_load_with(
    one_rm: f64,
    target_reps: u32,
    target_rpe: f64,
    formula: OneRepMaxFormula,
) -> f64 {
    let effective_reps = target_reps as f64 + (MAX_RPE - target_rpe);
    let estimated = if effective_reps <= 1.0 {
        one_rm
    } else {
        one_rm / formula.factor(effective_reps)
    };
    round_to_half(estimated)
}

fn round_to_half(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

/// RPE as a number: "8" -> 8, "8.5" -> 8.5, "7-9" -> 8 (midpoint).
/// Blank text and "N/A" have no RPE.
pub fn parse_rpe(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || text.to_lowercase().contains("n/a") {
        return None;
    }

    let range = RPE_RANGE.as_ref().and_then(|re| re.captures(text));
    if let Some(caps) = range {
        let low: f64 = caps.get(1)?.as_str().parse().ok()?;
        let high: f64 = caps.get(2)?.as_str().parse().ok()?;
        return Some((low + high) / 2.0);
    }

    RPE_SINGLE
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// ---------------------------------------------------------------------------
/// Workout Estimation
/// ---------------------------------------------------------------------------

/// Candidate names in priority order: recorded bests, caller extras, then the
/// default vocabulary. Duplicates keep their first position.
pub fn candidate_pool(personal_bests: &[PersonalBestLift], extra_names: &[String]) -> Vec<String> {
    let mut pool: Vec<String> = Vec::new();
    let names = personal_bests
        .iter()
        .map(|pb| pb.exercise_name.as_str())
        .chain(extra_names.iter().map(String::as_str))
        .chain(DEFAULT_PR_TYPES.iter().copied());

    for name in names {
        if !pool.iter().any(|existing| existing == name) {
            pool.push(name.to_string());
        }
    }
    pool
}

/// Resolve a free-text exercise name to a name in the candidate pool
pub fn resolve_exercise_name(
    exercise_name: &str,
    personal_bests: &[PersonalBestLift],
    extra_names: &[String],
    config: &EngineConfig,
) -> Option<String> {
    let pool = candidate_pool(personal_bests, extra_names);
    if let Some(name) = find_best_match_with(exercise_name, &pool, &config.matcher) {
        return Some(name.to_string());
    }

    if config.strength.keyword_fallback {
        return keyword_match(exercise_name).map(str::to_string);
    }
    None
}

/// Suggested load for a prescribed workout, or None when anything needed is
/// missing (RPE, reps, a matching personal best with a real lift recorded)
pub fn estimate_for_workout(
    workout: &Workout,
    personal_bests: &[PersonalBestLift],
    extra_names: &[String],
    config: &EngineConfig,
) -> Option<f64> {
    let target_rpe = parse_rpe(&workout.rpe)?;
    let target_reps = workout.reps?;

    let name = resolve_exercise_name(&workout.exercise_name, personal_bests, extra_names, config)?;
    let formula = config.strength.formula;

    let best = personal_bests
        .iter()
        .filter(|pb| pb.exercise_name == name)
        .map(|pb| one_rep_max_with(pb.load, pb.rep_count, formula))
        .fold(None, |best: Option<f64>, orm| Some(best.map_or(orm, |b| b.max(orm))))?;

    if best <= 0.0 {
        debug!(exercise = %workout.exercise_name, matched = %name, "Personal best has no load recorded");
        return None;
    }

    let load = estimate_load_with(best, target_reps, target_rpe, formula);
    debug!(
        exercise = %workout.exercise_name,
        matched = %name,
        one_rm = best,
        load,
        "Estimated working load"
    );
    Some(load)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;
    use crate::config::StrengthConfig;
    use crate::test_utils::mock_personal_bests;

    fn workout(name: &str, reps: Option<u32>, rpe: &str) -> Workout {
        Workout {
            reps,
            rpe: rpe.to_string(),
            ..Workout::new(name)
        }
    }

    #[test]
    fn test_single_rep_is_the_weight() {
        assert_approx_eq!(one_rep_max(335.0, 1), 335.0);
        assert_approx_eq!(one_rep_max_with(335.0, 1, OneRepMaxFormula::Epley), 335.0);
    }

    #[test]
    fn test_non_positive_reps_give_zero() {
        assert_approx_eq!(one_rep_max(300.0, 0), 0.0);
        assert_approx_eq!(one_rep_max(300.0, -2), 0.0);
    }

    #[test]
    fn test_one_rep_max_uses_24_divisor() {
        // 305 * (1 + 2/24) = 330.41
        assert_approx_eq!(one_rep_max(305.0, 3), 330.4167, 0.001);
    }

    #[test]
    fn test_epley_alternative() {
        // 300 * (1 + 5/30) = 350
        assert_approx_eq!(one_rep_max_with(300.0, 5, OneRepMaxFormula::Epley), 350.0);
    }

    #[test]
    fn test_estimate_load_at_rpe_ten() {
        assert_approx_eq!(estimate_load(335.0, 1, 10.0), 335.0);
        // 335 / 1.0833 = 309.23 -> 309.0
        assert_approx_eq!(estimate_load(335.0, 3, 10.0), 309.0);
    }

    #[test]
    fn test_estimate_load_adds_reps_in_reserve() {
        // 5 @ 8 -> 7 effective reps -> 100 / 1.25
        assert_approx_eq!(estimate_load(100.0, 5, 8.0), 80.0);
    }

    #[test]
    fn test_estimate_is_a_multiple_of_half() {
        for reps in 1..12 {
            for rpe in [6.0, 7.5, 8.0, 9.5, 10.0] {
                let load = estimate_load(287.3, reps, rpe);
                assert_approx_eq!(load * 2.0, (load * 2.0).round());
            }
        }
        // Effective reps <= 1 still rounds
        assert_approx_eq!(estimate_load(100.2, 1, 10.0), 100.0);
    }

    #[test]
    fn test_estimate_never_exceeds_one_rm() {
        for reps in 1..15 {
            assert!(estimate_load(200.0, reps, 10.0) <= 200.0);
        }
    }

    #[test]
    fn test_parse_rpe() {
        assert_eq!(parse_rpe("8"), Some(8.0));
        assert_eq!(parse_rpe("8.5"), Some(8.5));
        assert_eq!(parse_rpe("7-9"), Some(8.0));
        assert_eq!(parse_rpe("8-8.5"), Some(8.25));
        assert_eq!(parse_rpe("~9"), Some(9.0));
        assert_eq!(parse_rpe("N/A"), None);
        assert_eq!(parse_rpe("n/a"), None);
        assert_eq!(parse_rpe(""), None);
        assert_eq!(parse_rpe("   "), None);
        assert_eq!(parse_rpe("hard"), None);
    }

    #[test]
    fn test_candidate_pool_keeps_first_position() {
        let pbs = vec![
            PersonalBestLift::new("Deadlift", 405.0, 1),
            PersonalBestLift::new("Zercher Squat", 225.0, 5),
        ];
        let extra = vec!["Zercher Squat".to_string(), "Push Press".to_string()];

        let pool = candidate_pool(&pbs, &extra);

        assert_eq!(&pool[..4], &["Deadlift", "Zercher Squat", "Push Press", "Back Squat"]);
        assert_eq!(pool.iter().filter(|n| *n == "Deadlift").count(), 1);
    }

    #[test]
    fn test_estimate_for_workout_uses_best_matching_pb() {
        // Arrange
        let pbs = mock_personal_bests();
        let config = EngineConfig::default();
        let squat = workout("SSB squat to low box", Some(5), "8");

        // Act
        let load = estimate_for_workout(&squat, &pbs, &[], &config);

        // Assert: best Back Squat 1RM is 315 x 3 = 341.25; 7 effective reps -> 273.0
        assert_eq!(load, Some(273.0));
    }

    #[test]
    fn test_estimate_requires_rpe_and_reps() {
        let pbs = mock_personal_bests();
        let config = EngineConfig::default();

        assert_eq!(estimate_for_workout(&workout("Back Squat", Some(5), ""), &pbs, &[], &config), None);
        assert_eq!(estimate_for_workout(&workout("Back Squat", None, "8"), &pbs, &[], &config), None);
    }

    #[test]
    fn test_estimate_without_matching_pb_is_none() {
        let pbs = vec![PersonalBestLift::new("Bench Press", 225.0, 1)];
        let config = EngineConfig::default();

        assert_eq!(
            estimate_for_workout(&workout("Back Squat", Some(5), "8"), &pbs, &[], &config),
            None
        );
        assert_eq!(
            estimate_for_workout(&workout("Hanging leg raise", Some(10), "8"), &pbs, &[], &config),
            None
        );
    }

    #[test]
    fn test_placeholder_pb_gives_no_estimate() {
        let pbs = vec![PersonalBestLift::new("Back Squat", 0.0, 1)];
        let config = EngineConfig::default();

        assert_eq!(
            estimate_for_workout(&workout("Back Squat", Some(5), "8"), &pbs, &[], &config),
            None
        );
    }

    #[test]
    fn test_keyword_fallback_can_be_disabled() {
        // Arrange: a threshold nothing reaches forces the keyword path
        let pbs = vec![PersonalBestLift::new("Back Squat", 300.0, 1)];
        let mut config = EngineConfig::default();
        config.matcher.threshold = 1.1;
        let pin_squat = workout("Pin squat", Some(1), "10");

        // Act
        let with_fallback = estimate_for_workout(&pin_squat, &pbs, &[], &config);
        config.strength = StrengthConfig {
            keyword_fallback: false,
            ..config.strength
        };
        let without_fallback = estimate_for_workout(&pin_squat, &pbs, &[], &config);

        // Assert
        assert_eq!(with_fallback, Some(300.0));
        assert_eq!(without_fallback, None);
    }

    #[test]
    fn test_estimation_does_not_mutate_inputs() {
        let pbs = mock_personal_bests();
        let before = pbs.clone();
        let squat = workout("Back Squat", Some(3), "9");
        let squat_before = squat.clone();

        let _ = estimate_for_workout(&squat, &pbs, &[], &EngineConfig::default());

        assert_eq!(pbs, before);
        assert_eq!(squat, squat_before);
    }

    #[test]
    fn test_formula_from_str() {
        assert_eq!("rpe_adjusted".parse::<OneRepMaxFormula>(), Ok(OneRepMaxFormula::RpeAdjusted));
        assert_eq!("epley".parse::<OneRepMaxFormula>(), Ok(OneRepMaxFormula::Epley));
        assert!("brzycki".parse::<OneRepMaxFormula>().is_err());
    }
}
