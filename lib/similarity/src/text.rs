//! Description token overlap

use std::collections::HashSet;
use std::hash::Hash;

/// Lowercased runs of word characters (alphanumeric or `_`)
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard index `|a ∩ b| / |a ∪ b|`; 0.0 when either set is empty
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Token Jaccard of two descriptions; 0.0 if either is missing or blank
pub fn description_overlap(a: Option<&str>, b: Option<&str>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => jaccard(&tokenize(a), &tokenize(b)),
        _ => 0.0,
    }
}
