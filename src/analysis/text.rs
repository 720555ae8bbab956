use std::sync::OnceLock;

use regex::Regex;

const CONTRAST_PATTERN: &str =
    r"(?i)\b(?:but|however|although|though|yet|nevertheless|nonetheless)\b";

/// Weight given to the first clause of a contrasted comment.
pub const LEADING_CLAUSE_WEIGHT: f64 = 0.7;
/// Weight given to the last clause of a contrasted comment.
pub const TRAILING_CLAUSE_WEIGHT: f64 = 0.3;

fn contrast_markers() -> &'static Regex {
    static MARKERS: OnceLock<Regex> = OnceLock::new();
    MARKERS.get_or_init(|| Regex::new(CONTRAST_PATTERN).expect("contrast pattern is valid"))
}

/// Trims and collapses whitespace; missing input becomes an empty string.
pub fn normalize_comment(raw: Option<&str>) -> String {
    match raw {
        Some(value) => value.split_whitespace().collect::<Vec<_>>().join(" "),
        None => String::new(),
    }
}

/// Splits a normalized comment on contrastive conjunctions.
///
/// Fragments are trimmed and empty ones dropped, so a comment that opens with
/// "But" does not send an empty clause to the model. Non-empty input always
/// yields at least one clause.
pub fn split_clauses(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let clauses: Vec<String> = contrast_markers()
        .split(text)
        .map(|fragment| fragment.trim().to_string())
        .filter(|fragment| !fragment.is_empty())
        .collect();

    if clauses.is_empty() {
        vec![text.trim().to_string()]
    } else {
        clauses
    }
}

/// Linear ramp from the leading to the trailing weight, normalized to sum to 1.
pub fn clause_weights(count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let step = (TRAILING_CLAUSE_WEIGHT - LEADING_CLAUSE_WEIGHT) / (count - 1) as f64;
            let mut ramp: Vec<f64> = (0..count)
                .map(|index| LEADING_CLAUSE_WEIGHT + step * index as f64)
                .collect();
            ramp[count - 1] = TRAILING_CLAUSE_WEIGHT;
            normalize_weights(&ramp)
        }
    }
}

pub(crate) fn normalize_weights(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return vec![0.0; weights.len()];
    }
    weights.iter().map(|weight| weight / total).collect()
}
