//! Goal reference resolution
//!
//! A reference is whatever the user (or the model) used to point at a goal:
//! an ID, the exact name, or something close to it ("read any book" for
//! "Read a book"). Resolution order:
//!
//! 1. exact ID (case-insensitive)
//! 2. normalized exact name
//! 3. unique hex prefix of an ID, as shown in listings
//! 4. best fuzzy score at or above the match threshold

use tracing::debug;

use crate::error::StoreError;
use crate::goal::Goal;

/// Default similarity needed for a fuzzy reference match
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.8;

/// Default similarity for duplicate detection (1.0 = exact names only)
pub const DEFAULT_DUPLICATE_THRESHOLD: f64 = 1.0;

/// Score given when one name contains the other on word boundaries
const CONTAINMENT_SCORE: f64 = 0.9;

/// Hex characters at the front of a goal ID
const ID_HEX_LEN: usize = 8;

/// Shortest ID prefix accepted as a reference
const MIN_ID_PREFIX_LEN: usize = 4;

/// Scores closer than this are a tie
const TIE_EPSILON: f64 = 1e-9;

/// Trim, collapse inner whitespace and lowercase
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Similarity of two names in `[0.0, 1.0]`
pub fn similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (normalize(a), normalize(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let mut score = strsim::normalized_levenshtein(&a, &b).max(strsim::sorensen_dice(&a, &b));
    if contains_words(&a, &b) || contains_words(&b, &a) {
        score = score.max(CONTAINMENT_SCORE);
    }
    score
}

/// Whether `needle` appears in `haystack` as a run of whole words
fn contains_words(haystack: &str, needle: &str) -> bool {
    let hay: Vec<&str> = haystack.split(' ').collect();
    let needle: Vec<&str> = needle.split(' ').collect();
    needle.len() <= hay.len() && hay.windows(needle.len()).any(|w| w == needle.as_slice())
}

/// Resolves references against a goal list
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    match_threshold: f64,
    duplicate_threshold: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
        }
    }
}

impl Matcher {
    pub fn new(match_threshold: f64, duplicate_threshold: f64) -> Self {
        Self {
            match_threshold: match_threshold.clamp(0.0, 1.0),
            duplicate_threshold: duplicate_threshold.clamp(0.0, 1.0),
        }
    }

    /// Resolve `reference` to the index of exactly one goal in `goals`
    pub fn resolve(&self, goals: &[Goal], reference: &str) -> Result<usize, StoreError> {
        self.resolve_preferring(goals, reference, |_| true)
    }

    /// Resolve `reference`, using `prefer` to break ties between equally good matches
    ///
    /// Used for completion, where a pending "Exercise" should win over a
    /// completed one with the same name. A stronger match is never passed
    /// over for a preferred one.
    pub fn resolve_preferring(
        &self,
        goals: &[Goal],
        reference: &str,
        prefer: impl Fn(&Goal) -> bool,
    ) -> Result<usize, StoreError> {
        debug!(%reference, goal_count = goals.len(), "resolve_preferring: called");
        let trimmed = reference.trim();
        let wanted = normalize(reference);
        if wanted.is_empty() {
            return Err(StoreError::GoalNotFound {
                reference: trimmed.to_string(),
            });
        }

        if let Some(idx) = goals.iter().position(|g| g.id.as_str().eq_ignore_ascii_case(trimmed)) {
            debug!(idx, "resolve_preferring: ID match");
            return Ok(idx);
        }

        let exact: Vec<usize> = (0..goals.len())
            .filter(|&idx| normalize(&goals[idx].name) == wanted)
            .collect();
        if !exact.is_empty() {
            debug!(matches = exact.len(), "resolve_preferring: exact name match");
            return pick(goals, trimmed, exact, &prefer);
        }

        if is_hex_prefix(trimmed) {
            let prefix = trimmed.to_ascii_lowercase();
            let prefixed: Vec<usize> = (0..goals.len())
                .filter(|&idx| goals[idx].id.hex_prefix().starts_with(prefix.as_str()))
                .collect();
            if !prefixed.is_empty() {
                debug!(matches = prefixed.len(), "resolve_preferring: ID prefix match");
                return pick(goals, trimmed, prefixed, |_| false);
            }
        }

        let mut scored: Vec<(usize, f64)> = goals
            .iter()
            .enumerate()
            .map(|(idx, g)| (idx, similarity(&g.name, reference)))
            .filter(|(_, score)| *score >= self.match_threshold)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let Some(&(_, best_score)) = scored.first() else {
            debug!("resolve_preferring: no fuzzy match");
            return Err(StoreError::GoalNotFound {
                reference: trimmed.to_string(),
            });
        };

        let tied: Vec<usize> = scored
            .iter()
            .filter(|(_, score)| (best_score - score).abs() < TIE_EPSILON)
            .map(|(idx, _)| *idx)
            .collect();
        debug!(best_score, tied = tied.len(), "resolve_preferring: fuzzy match");
        pick(goals, trimmed, tied, &prefer)
    }

    /// Find an active goal that `name` would duplicate, skipping `except`
    pub fn find_duplicate<'a>(&self, goals: &'a [Goal], name: &str, except: Option<usize>) -> Option<&'a Goal> {
        let wanted = normalize(name);
        goals
            .iter()
            .enumerate()
            .filter(|(idx, g)| Some(*idx) != except && !g.is_completed())
            .map(|(_, g)| g)
            .find(|g| {
                normalize(&g.name) == wanted
                    || (self.duplicate_threshold < 1.0 && similarity(&g.name, name) >= self.duplicate_threshold)
            })
    }
}

/// Narrow equally good matches to one, using `prefer` as the tie-breaker
fn pick(
    goals: &[Goal],
    reference: &str,
    matches: Vec<usize>,
    prefer: impl Fn(&Goal) -> bool,
) -> Result<usize, StoreError> {
    if let [idx] = matches.as_slice() {
        return Ok(*idx);
    }

    let preferred: Vec<usize> = matches.iter().copied().filter(|&idx| prefer(&goals[idx])).collect();
    if let [idx] = preferred.as_slice() {
        debug!(idx, "pick: tie broken by preference");
        return Ok(*idx);
    }

    let shown = if preferred.is_empty() { matches } else { preferred };
    Err(StoreError::AmbiguousGoal {
        reference: reference.to_string(),
        candidates: shown.iter().map(|&idx| describe(&goals[idx])).collect(),
    })
}

/// Whether `reference` could be the leading part of a goal ID's hex prefix
fn is_hex_prefix(reference: &str) -> bool {
    (MIN_ID_PREFIX_LEN..=ID_HEX_LEN).contains(&reference.len()) && reference.chars().all(|c| c.is_ascii_hexdigit())
}

fn describe(goal: &Goal) -> String {
    format!("{} ({})", goal.name, goal.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::GoalId;

    fn goals(names: &[&str]) -> Vec<Goal> {
        names.iter().map(|n| Goal::new(*n, None)).collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Read   a BOOK "), "read a book");
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("Exercise", "exercise"), 1.0);
        assert_eq!(similarity("", "exercise"), 0.0);
        assert!(similarity("read a book", "read any book") >= DEFAULT_MATCH_THRESHOLD);
        assert!(similarity("read a book", "water the plants") < DEFAULT_MATCH_THRESHOLD);
    }

    #[test]
    fn test_similarity_containment() {
        assert!(similarity("Exercise daily", "exercise") >= CONTAINMENT_SCORE);
        // Partial words don't count as containment
        assert!(similarity("Exercises", "exercise daily") < CONTAINMENT_SCORE);
    }

    #[test]
    fn test_resolve_by_id() {
        let list = goals(&["Exercise", "Read a book"]);
        let id = list[1].id.as_str().to_uppercase();
        assert_eq!(Matcher::default().resolve(&list, &id).unwrap(), 1);
    }

    #[test]
    fn test_resolve_exact_name_case_insensitive() {
        let list = goals(&["Exercise", "Read a book"]);
        assert_eq!(Matcher::default().resolve(&list, "  read A book").unwrap(), 1);
    }

    #[test]
    fn test_resolve_fuzzy() {
        let list = goals(&["Exercise", "Read a book"]);
        assert_eq!(Matcher::default().resolve(&list, "read any book").unwrap(), 1);
    }

    #[test]
    fn test_resolve_not_found() {
        let list = goals(&["Exercise"]);
        let err = Matcher::default().resolve(&list, "learn piano").unwrap_err();
        assert!(matches!(err, StoreError::GoalNotFound { .. }));

        let err = Matcher::default().resolve(&list, "   ").unwrap_err();
        assert!(matches!(err, StoreError::GoalNotFound { .. }));
    }

    #[test]
    fn test_resolve_ambiguous_exact() {
        let list = goals(&["Exercise", "exercise"]);
        let err = Matcher::default().resolve(&list, "Exercise").unwrap_err();
        assert!(matches!(err, StoreError::AmbiguousGoal { ref candidates, .. } if candidates.len() == 2));
    }

    #[test]
    fn test_resolve_ambiguous_fuzzy_tie() {
        let list = goals(&["Read a book", "Read a blog"]);
        let err = Matcher::default().resolve(&list, "read a").unwrap_err();
        assert!(matches!(err, StoreError::AmbiguousGoal { .. }));
    }

    #[test]
    fn test_resolve_preferring_pending() {
        let mut list = goals(&["Exercise", "Exercise"]);
        let created = list[0].created_at;
        list[0].complete_at(created);

        let idx = Matcher::default()
            .resolve_preferring(&list, "exercise", |g| !g.is_completed())
            .unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_resolve_preferring_falls_back() {
        let mut list = goals(&["Exercise"]);
        let created = list[0].created_at;
        list[0].complete_at(created);

        let idx = Matcher::default()
            .resolve_preferring(&list, "exercise", |g| !g.is_completed())
            .unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_resolve_exact_completed_beats_fuzzy_pending() {
        let mut list = goals(&["Exercise", "Exercise daily"]);
        let created = list[0].created_at;
        list[0].complete_at(created);

        let idx = Matcher::default()
            .resolve_preferring(&list, "Exercise", |g| !g.is_completed())
            .unwrap();
        assert_eq!(idx, 0);
    }

    #[test]
    fn test_resolve_fuzzy_tie_broken_by_preference() {
        let mut list = goals(&["Exercise daily", "Exercise weekly"]);
        let created = list[0].created_at;
        list[0].complete_at(created);

        let idx = Matcher::default()
            .resolve_preferring(&list, "exercise", |g| !g.is_completed())
            .unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn test_resolve_by_hex_prefix() {
        let list = goals(&["Exercise", "Read a book"]);
        let matcher = Matcher::default();

        let shown = list[1].id.hex_prefix().to_string();
        assert_eq!(matcher.resolve(&list, &shown).unwrap(), 1);
        assert_eq!(matcher.resolve(&list, &shown.to_uppercase()).unwrap(), 1);
        assert_eq!(matcher.resolve(&list, &shown[..6]).unwrap(), 1);
    }

    #[test]
    fn test_resolve_ambiguous_hex_prefix() {
        let mut list = goals(&["Exercise", "Read a book"]);
        list[0].id = GoalId::from_string("abcd1234-exercise");
        list[1].id = GoalId::from_string("abcd5678-read-a-book");
        let matcher = Matcher::default();

        let err = matcher.resolve(&list, "abcd").unwrap_err();
        assert!(matches!(err, StoreError::AmbiguousGoal { ref candidates, .. } if candidates.len() == 2));
        assert_eq!(matcher.resolve(&list, "abcd5").unwrap(), 1);
        // Too short to be taken as an ID
        assert!(matches!(matcher.resolve(&list, "abc"), Err(StoreError::GoalNotFound { .. })));
    }

    #[test]
    fn test_find_duplicate_exact_only_by_default() {
        let list = goals(&["Read a book"]);
        let matcher = Matcher::default();
        assert!(matcher.find_duplicate(&list, "READ A BOOK", None).is_some());
        assert!(matcher.find_duplicate(&list, "Read any book", None).is_none());
        assert!(matcher.find_duplicate(&list, "Read a book", Some(0)).is_none());
    }

    #[test]
    fn test_find_duplicate_ignores_completed() {
        let mut list = goals(&["Exercise"]);
        let created = list[0].created_at;
        list[0].complete_at(created);
        assert!(Matcher::default().find_duplicate(&list, "Exercise", None).is_none());
    }

    #[test]
    fn test_find_duplicate_near_match() {
        let list = goals(&["Read a book"]);
        let matcher = Matcher::new(DEFAULT_MATCH_THRESHOLD, 0.8);
        assert!(matcher.find_duplicate(&list, "Read any book", None).is_some());
    }
}
