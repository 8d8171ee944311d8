//! Title matching across sources.
//!
//! Search hits are compared to the requested title by word-set Jaccard
//! similarity. This is a heuristic: a hit at or above [`TITLE_MATCH_THRESHOLD`]
//! counts as the same paper, otherwise the first hit is used.

use std::collections::HashSet;

/// Similarity at which two titles are treated as the same paper
pub const TITLE_MATCH_THRESHOLD: f64 = 0.8;

/// Jaccard similarity of the lowercased word sets of two texts.
///
/// Two empty texts have similarity 0.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let a = word_set(a);
    let b = word_set(b);
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    intersection as f64 / union as f64
}

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Pick the hit whose title best matches `wanted`.
///
/// Returns the first hit at or above the threshold, else the first hit.
pub fn best_title_match<T, F>(wanted: &str, hits: Vec<T>, title_of: F) -> Option<T>
where
    F: Fn(&T) -> &str,
{
    let position = hits
        .iter()
        .position(|hit| jaccard_similarity(wanted, title_of(hit)) >= TITLE_MATCH_THRESHOLD)
        .unwrap_or(0);
    hits.into_iter().nth(position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard_similarity("Deep Learning", "deep learning"), 1.0);
        assert_eq!(jaccard_similarity("a b", "c d"), 0.0);
        assert!((jaccard_similarity("a b c", "a b d") - 0.5).abs() < 1e-9);
        assert_eq!(jaccard_similarity("", ""), 0.0);
    }

    #[test]
    fn test_best_match_prefers_similar_title() {
        let hits = vec!["Unrelated Survey", "Attention Is All You Need", "Attention"];
        let best = best_title_match("attention is all you need", hits, |h| *h);
        assert_eq!(best, Some("Attention Is All You Need"));
    }

    #[test]
    fn test_best_match_falls_back_to_first() {
        let hits = vec!["First Hit", "Second Hit"];
        assert_eq!(best_title_match("nothing alike", hits, |h| *h), Some("First Hit"));

        let none: Vec<&str> = Vec::new();
        assert_eq!(best_title_match("x", none, |h| *h), None);
    }
}
