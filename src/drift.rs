//! Hints for drifted anchors. Informational only; never affects classification.

use crate::errors::DriftHint;

/// Minimum normalized Levenshtein similarity for a line to be worth reporting.
pub const HINT_THRESHOLD: f64 = 0.6;

/// Find the line of `content` most similar to the first non-blank line of `anchor`.
pub fn closest_line(content: &str, anchor: &str) -> Option<DriftHint> {
    let needle = anchor.lines().map(str::trim).find(|l| !l.is_empty())?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| DriftHint {
            line: idx + 1,
            text: line.to_string(),
            similarity: strsim::normalized_levenshtein(needle, line.trim()),
        })
        .filter(|hint| hint.similarity >= HINT_THRESHOLD)
        .max_by(|a, b| a.similarity.total_cmp(&b.similarity))
}
