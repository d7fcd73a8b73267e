//! Fuzzy name matching for assignee resolution
//!
//! Scores are Ratcliff/Obershelp ratios: twice the matched characters over the
//! combined length of both names.

use difflib::sequencematcher::SequenceMatcher;

/// Minimum similarity for two names to be treated as the same person
pub const MATCH_THRESHOLD: f64 = 0.6;

/// Similarity in [0, 1] between two names, ignoring case and surrounding space
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.trim().to_lowercase().chars().collect();
    let b: Vec<char> = b.trim().to_lowercase().chars().collect();
    f64::from(SequenceMatcher::new(a.as_slice(), b.as_slice()).ratio())
}

/// Index of the best candidate scoring at least `MATCH_THRESHOLD`
///
/// The earliest candidate wins ties.
pub fn best_match<'a, I>(name: &str, candidates: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    if name.trim().is_empty() {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (index, candidate) in candidates.into_iter().enumerate() {
        let score = name_similarity(name, candidate);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }

    // ratio() is single precision
    best.filter(|(_, score)| *score >= MATCH_THRESHOLD - 1e-6)
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert_eq!(name_similarity("  Alice ", "alice"), 1.0);
    }

    #[test]
    fn test_threshold_boundary() {
        // 3 shared characters out of 10: exactly 0.6
        assert!((name_similarity("abcde", "abcxy") - 0.6).abs() < 1e-6);
        assert_eq!(best_match("abcde", ["abcxy"]), Some(0));

        // 4 shared characters out of 14: just under 0.6
        assert!(name_similarity("abcdefg", "abcdxyz") < 0.58);
        assert_eq!(best_match("abcdefg", ["abcdxyz"]), None);
    }

    #[test]
    fn test_short_name_matches_full_name() {
        assert!((name_similarity("Alice", "Alice Smith") - 0.625).abs() < 1e-6);
        assert_eq!(best_match("Alice", ["Bob Jones", "Alice Smith"]), Some(1));
        assert_eq!(best_match("Kate", ["Katherine"]), Some(0));
    }

    #[test]
    fn test_first_highest_wins_ties() {
        assert_eq!(best_match("bob", ["Bob", "BOB", "Rob"]), Some(0));
    }

    #[test]
    fn test_best_is_chosen_over_first_acceptable() {
        assert_eq!(best_match("Alicia", ["Alice", "Alicia"]), Some(1));
    }

    #[test]
    fn test_no_candidates_or_blank_name() {
        assert_eq!(best_match("Alice", std::iter::empty()), None);
        assert_eq!(best_match("   ", ["Alice"]), None);
    }

    #[test]
    fn test_deterministic() {
        let users = ["Alice Smith", "Bob Jones", "Alicia Smythe"];
        let first = best_match("alice smith", users);
        for _ in 0..10 {
            assert_eq!(best_match("alice smith", users), first);
        }
    }
}
