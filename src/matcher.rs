//! Exercise identity matching
//!
//! Maps free-text exercise names ("SSB squat to low box", "1\" deficit RDL")
//! onto a small canonical vocabulary ("Back Squat", "Deadlift"). The default
//! similarity blends a normalized edit distance with token overlap and a
//! boost for shared power-lift keywords.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::MatcherConfig;

/// Minimum similarity for [`find_best_match`] callers that have no opinion
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Shared tokens from this set boost the score
const POWER_WORDS: [&str; 10] = [
    "squat", "bench", "deadlift", "press", "snatch", "clean", "row", "pullup", "dip", "rdl",
];
const POWER_BOOST: f64 = 1.3;
const POWER_BOOST_FLOOR: f64 = 0.3;

/// Candidates that win close calls
const FAVORED_CANDIDATES: [&str; 3] = ["back squat", "bench press", "deadlift"];
const FAVORED_BONUS: f64 = 0.05;

/// Bidirectional synonyms applied to token sets
const SYNONYMS: [(&str, &str); 1] = [("rdl", "deadlift")];

/// Keyword fallback, checked in order so specific lifts beat generic ones
const KEYWORD_TABLE: [(&str, &str); 10] = [
    ("front squat", "Front Squat"),
    ("squat", "Back Squat"),
    ("bench", "Bench Press"),
    ("overhead press", "Overhead Press"),
    ("ohp", "Overhead Press"),
    ("rdl", "Deadlift"),
    ("deadlift", "Deadlift"),
    ("clean and jerk", "Clean and Jerk"),
    ("clean", "Clean"),
    ("snatch", "Snatch"),
];

/// ---------------------------------------------------------------------------
/// Algorithm Selection
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityAlgorithm {
    /// Edit distance blended with token overlap and keyword boosts
    #[default]
    Weighted,
    /// Normalized edit distance only
    Levenshtein,
}

impl std::fmt::Display for SimilarityAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityAlgorithm::Weighted => write!(f, "weighted"),
            SimilarityAlgorithm::Levenshtein => write!(f, "levenshtein"),
        }
    }
}

impl std::str::FromStr for SimilarityAlgorithm {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weighted" => Ok(Self::Weighted),
            "levenshtein" => Ok(Self::Levenshtein),
            _ => Err(format!("Unknown similarity algorithm: {}", s)),
        }
    }
}

/// ---------------------------------------------------------------------------
/// Similarity
/// ---------------------------------------------------------------------------

/// Weighted similarity in [0, 1]
pub fn similarity(a: &str, b: &str) -> f64 {
    similarity_with(a, b, SimilarityAlgorithm::Weighted)
}

pub fn similarity_with(a: &str, b: &str, algorithm: SimilarityAlgorithm) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();

    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let edit = levenshtein_ratio(&a, &b);
    match algorithm {
        SimilarityAlgorithm::Levenshtein => edit,
        SimilarityAlgorithm::Weighted => weighted(&a, &b, edit),
    }
}

/// `b` is the candidate side: the favored-candidate bonus looks only at it
fn weighted(a: &str, b: &str, edit: f64) -> f64 {
    let left = tokens(a);
    let right = tokens(b);
    if left.is_empty() || right.is_empty() {
        return edit;
    }

    let left = expand_synonyms(left);
    let right = expand_synonyms(right);

    let common: HashSet<&str> = left.intersection(&right).copied().collect();
    let union = left.union(&right).count();
    let jaccard = common.len() as f64 / union as f64;
    let containment = common.len() as f64 / left.len().min(right.len()) as f64;

    let mut score = edit.max(jaccard).max(containment);

    if score > POWER_BOOST_FLOOR && common.iter().any(|t| POWER_WORDS.contains(t)) {
        score *= POWER_BOOST;
    }
    if FAVORED_CANDIDATES.contains(&b) {
        score += FAVORED_BONUS;
    }

    score.clamp(0.0, 1.0)
}

/// Lower-cased alphanumeric runs longer than one character
fn tokens(text: &str) -> HashSet<&str> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() > 1)
        .collect()
}

fn expand_synonyms(mut words: HashSet<&str>) -> HashSet<&str> {
    for (left, right) in SYNONYMS {
        if words.contains(left) {
            words.insert(right);
        }
        if words.contains(right) {
            words.insert(left);
        }
    }
    words
}

/// `(maxLen - distance) / maxLen` over characters
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }

    let mut costs: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = costs[0];
        costs[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = if ca == cb { diagonal } else { diagonal + 1 };
            let next = (costs[j + 1] + 1).min(costs[j] + 1).min(substitution);
            diagonal = costs[j + 1];
            costs[j + 1] = next;
        }
    }

    (max_len - costs[b.len()]) as f64 / max_len as f64
}

/// ---------------------------------------------------------------------------
/// Best Match
/// ---------------------------------------------------------------------------

/// Highest scoring candidate at or above `threshold`. First seen wins ties.
pub fn find_best_match<'a, S: AsRef<str>>(
    query: &str,
    candidates: &'a [S],
    threshold: f64,
) -> Option<&'a str> {
    best_match(query, candidates, threshold, SimilarityAlgorithm::Weighted)
}

/// [`find_best_match`] with the configured algorithm and threshold
pub fn find_best_match_with<'a, S: AsRef<str>>(
    query: &str,
    candidates: &'a [S],
    config: &MatcherConfig,
) -> Option<&'a str> {
    best_match(query, candidates, config.threshold, config.algorithm)
}

fn best_match<'a, S: AsRef<str>>(
    query: &str,
    candidates: &'a [S],
    threshold: f64,
    algorithm: SimilarityAlgorithm,
) -> Option<&'a str> {
    let mut best: Option<(&'a str, f64)> = None;

    for candidate in candidates {
        let candidate = candidate.as_ref();
        let score = similarity_with(query, candidate, algorithm);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }

    best.filter(|(_, score)| *score >= threshold)
        .map(|(name, _)| name)
}

/// Canonical lift named by a keyword inside `name`, if any
pub fn keyword_match(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    KEYWORD_TABLE
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, canonical)| *canonical)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    const CORE_LIFTS: [&str; 7] = [
        "Back Squat",
        "Bench Press",
        "Deadlift",
        "Overhead Press",
        "Front Squat",
        "Clean",
        "Snatch",
    ];

    #[test]
    fn test_identical_names_score_one() {
        assert_approx_eq!(similarity("Back Squat", "Back Squat"), 1.0);
        assert_approx_eq!(similarity("back squat", "Back Squat"), 1.0);
        assert_approx_eq!(similarity("  Deadlift ", "deadlift"), 1.0);
    }

    #[test]
    fn test_empty_side_scores_zero() {
        assert_approx_eq!(similarity("Back Squat", ""), 0.0);
        assert_approx_eq!(similarity("", "Deadlift"), 0.0);
    }

    #[test]
    fn test_scores_stay_in_unit_range() {
        for a in CORE_LIFTS {
            for b in CORE_LIFTS {
                let score = similarity(a, b);
                assert!((0.0..=1.0).contains(&score), "{} vs {} = {}", a, b, score);
            }
        }
    }

    #[test]
    fn test_keyword_priority() {
        let bench = similarity("Bench", "Bench Press");
        let squat = similarity("Bench", "Back Squat");
        assert!(bench > squat, "bench {} should beat squat {}", bench, squat);
    }

    #[test]
    fn test_rdl_resolves_to_deadlift() {
        assert_eq!(find_best_match("RDL", &CORE_LIFTS, 0.4), Some("Deadlift"));
        assert_eq!(find_best_match("1\" deficit RDL", &CORE_LIFTS, 0.4), Some("Deadlift"));
    }

    #[test]
    fn test_variations_resolve_to_parent_lift() {
        assert_eq!(find_best_match("SSB squat to low box", &CORE_LIFTS, 0.4), Some("Back Squat"));
        assert_eq!(
            find_best_match("Incline barbell bench press", &CORE_LIFTS, 0.4),
            Some("Bench Press")
        );
        assert_eq!(find_best_match("Deficit deadlift", &CORE_LIFTS, 0.4), Some("Deadlift"));
        assert_eq!(
            find_best_match("Strict standing overhead press", &CORE_LIFTS, 0.4),
            Some("Overhead Press")
        );
    }

    #[test]
    fn test_unrelated_exercise_has_no_match() {
        assert_eq!(find_best_match("Hanging leg raise", &CORE_LIFTS, DEFAULT_THRESHOLD), None);
    }

    #[test]
    fn test_empty_candidates_have_no_match() {
        let none: [&str; 0] = [];
        assert_eq!(find_best_match("Back Squat", &none, 0.0), None);
    }

    #[test]
    fn test_first_seen_wins_ties() {
        let candidates = vec!["Squat".to_string(), "squat".to_string()];
        assert_eq!(find_best_match("SQUAT", &candidates, 0.5), Some("Squat"));
    }

    #[test]
    fn test_levenshtein_algorithm_ignores_tokens() {
        // Arrange
        let config = MatcherConfig {
            algorithm: SimilarityAlgorithm::Levenshtein,
            threshold: 0.5,
        };

        // Act
        let weighted = find_best_match("1\" deficit RDL", &CORE_LIFTS, 0.5);
        let plain = find_best_match_with("1\" deficit RDL", &CORE_LIFTS, &config);

        // Assert
        assert_eq!(weighted, Some("Deadlift"));
        assert_eq!(plain, None);
    }

    #[test]
    fn test_levenshtein_ratio() {
        assert_approx_eq!(levenshtein_ratio("kitten", "sitting"), 4.0 / 7.0);
        assert_approx_eq!(levenshtein_ratio("abc", "abc"), 1.0);
        assert_approx_eq!(levenshtein_ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_keyword_match_prefers_specific_lifts() {
        assert_eq!(keyword_match("Paused front squat"), Some("Front Squat"));
        assert_eq!(keyword_match("Pin squat"), Some("Back Squat"));
        assert_eq!(keyword_match("Close grip bench"), Some("Bench Press"));
        assert_eq!(keyword_match("Stiff leg RDL"), Some("Deadlift"));
        assert_eq!(keyword_match("Power clean and jerk"), Some("Clean and Jerk"));
        assert_eq!(keyword_match("Lat pulldown"), None);
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("weighted".parse::<SimilarityAlgorithm>(), Ok(SimilarityAlgorithm::Weighted));
        assert_eq!("levenshtein".parse::<SimilarityAlgorithm>(), Ok(SimilarityAlgorithm::Levenshtein));
        assert!("cosine".parse::<SimilarityAlgorithm>().is_err());
    }
}
