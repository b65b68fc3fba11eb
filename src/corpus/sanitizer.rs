//! Restrict cascades to the retained-user population.

use crate::corpus::{Cascade, CascadeSet};
use crate::graph::RetainedUsers;

/// Drops every cascade that mentions an author outside the retained set.
///
/// Cascades are kept or removed whole so that propagation order is never
/// altered. Input order is preserved.
#[derive(Debug, Default, Clone, Copy)]
pub struct CascadeSanitizer;

impl CascadeSanitizer {
    /// Whether every author of `cascade` is retained. An empty cascade
    /// passes.
    pub fn accepts(cascade: &Cascade, retained: &RetainedUsers) -> bool {
        cascade.authors().all(|a| retained.contains(a))
    }

    /// Filtered copy of `cascades`.
    pub fn sanitize(cascades: &CascadeSet, retained: &RetainedUsers) -> CascadeSet {
        let kept: CascadeSet = cascades
            .iter()
            .filter(|c| Self::accepts(c, retained))
            .cloned()
            .collect();

        tracing::info!(
            "sanitized cascades: kept {} of {} ({} retained users)",
            kept.len(),
            cascades.len(),
            retained.len()
        );
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Participation;

    fn cascade(id: &str, authors: &[&str]) -> Cascade {
        Cascade::new(
            id,
            authors
                .iter()
                .enumerate()
                .map(|(i, a)| Participation::new(*a, 100 + i as i64))
                .collect(),
        )
    }

    fn retained(names: &[&str]) -> RetainedUsers {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_whole_cascades_are_dropped() {
        let set: CascadeSet = vec![
            cascade("t1", &["A", "B"]),
            cascade("t2", &["A", "D"]),
            cascade("t3", &["C"]),
        ]
        .into_iter()
        .collect();

        let out = CascadeSanitizer::sanitize(&set, &retained(&["A", "B", "C"]));
        let ids: Vec<_> = out.iter().map(|c| c.thread_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);
        assert_eq!(out.get("t1"), set.get("t1"));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let set: CascadeSet = vec![cascade("t1", &["A", "B", "A"]), cascade("t2", &["Z"])]
            .into_iter()
            .collect();
        let users = retained(&["A", "B"]);

        let once = CascadeSanitizer::sanitize(&set, &users);
        let twice = CascadeSanitizer::sanitize(&once, &users);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn test_empty_cascade_is_kept() {
        let set: CascadeSet = vec![Cascade::new("t0", Vec::new()), cascade("t1", &["Z"])]
            .into_iter()
            .collect();

        let out = CascadeSanitizer::sanitize(&set, &retained(&["A"]));
        assert_eq!(out.len(), 1);
        assert!(out.get("t0").is_some());
    }

    #[test]
    fn test_unknown_authors_match_nothing() {
        let set: CascadeSet = vec![cascade("t1", &["A"])].into_iter().collect();
        assert!(CascadeSanitizer::sanitize(&set, &retained(&["nobody"])).is_empty());
        assert!(CascadeSanitizer::sanitize(&CascadeSet::new(), &retained(&["A"])).is_empty());
    }
}
