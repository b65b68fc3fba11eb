//! Graph construction: contribution counts -> inverted subreddit index ->
//! pairwise co-occurrence -> UserGraph.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::GraphConfig,
    corpus::{interner::intern_sorted, AuthorActivity, ContributionIndex},
    graph::{EdgeAccumulator, UserGraph},
    types::AuthorId,
};

/// Counters describing one graph build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Authors considered (after the eligibility filter).
    pub candidate_authors: usize,
    /// Authors passing the subreddit and activity thresholds.
    pub qualifying_authors: usize,
    /// Subreddit buckets with at least two qualifying authors.
    pub buckets: usize,
    /// Buckets skipped because they exceeded `max_bucket_size`.
    pub skipped_buckets: usize,
    /// Buckets above `bucket_warn_threshold` that were still processed.
    pub oversized_buckets: usize,
    /// Pair increments performed.
    pub pair_updates: u64,
    /// Edges in the resulting graph.
    pub edges: usize,
    /// Whether the build was cancelled before all buckets were processed.
    pub cancelled: bool,
}

/// Builder for the user-user co-occurrence graph.
///
/// Two authors are linked with weight `k` when `k` qualifying subreddits
/// contain both of them. Cost is `O(Σ k_s²)` over subreddit bucket sizes,
/// which is why oversized buckets are reported or skipped.
#[derive(Debug)]
pub struct CoOccurrenceGraphBuilder<'a> {
    config: GraphConfig,
    excluded: HashSet<String>,
    eligible: Option<&'a HashSet<String>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> CoOccurrenceGraphBuilder<'a> {
    /// Create a new builder with the given configuration.
    pub fn new(config: GraphConfig) -> Self {
        Self {
            excluded: config.excluded_lowercase(),
            config,
            eligible: None,
            cancel: None,
        }
    }

    /// Only consider authors contained in `eligible`.
    pub fn with_eligible(mut self, eligible: &'a HashSet<String>) -> Self {
        self.eligible = Some(eligible);
        self
    }

    /// Stop dispatching buckets once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Qualifying subreddits of one author, or `None` if the author is
    /// discarded by the thresholds.
    pub fn qualifying_subreddits<'b>(&self, activity: &'b AuthorActivity) -> Option<Vec<&'b str>> {
        let config = &self.config;
        let totals = activity.subreddit_totals(|year| config.year_in_window(year));

        let mut activity_sum = 0u64;
        let mut subs = Vec::new();
        for (sub, count) in totals {
            if count < config.min_subreddit_contributions || self.is_excluded(sub) {
                continue;
            }
            activity_sum += count;
            subs.push(sub);
        }

        if subs.is_empty()
            || subs.len() < config.min_subreddits
            || activity_sum < config.min_total_activity
        {
            return None;
        }
        Some(subs)
    }

    fn is_excluded(&self, subreddit: &str) -> bool {
        !self.excluded.is_empty() && self.excluded.contains(&subreddit.to_ascii_lowercase())
    }

    /// Build the graph from a contribution index.
    pub fn build(&self, index: &ContributionIndex) -> (UserGraph, BuildStats) {
        let mut stats = BuildStats::default();

        // 1. Qualifying subreddits per eligible author
        let candidates: Vec<(&str, &AuthorActivity)> = index
            .iter()
            .filter(|(author, _)| self.eligible.map_or(true, |e| e.contains(*author)))
            .collect();
        stats.candidate_authors = candidates.len();

        let mut qualifying: Vec<(&str, Vec<&str>)> = candidates
            .into_par_iter()
            .filter_map(|(author, activity)| {
                self.qualifying_subreddits(activity).map(|subs| (author, subs))
            })
            .collect();
        qualifying.sort_unstable_by(|a, b| a.0.cmp(b.0));
        stats.qualifying_authors = qualifying.len();

        let interner = Arc::new(intern_sorted(qualifying.iter().map(|(a, _)| *a)));

        // 2. Inverted index: subreddit -> authors, ascending by id
        let mut buckets: BTreeMap<&str, Vec<AuthorId>> = BTreeMap::new();
        for (author, subs) in &qualifying {
            let Some(key) = interner.get(author) else {
                continue;
            };
            for sub in subs {
                buckets.entry(*sub).or_default().push(AuthorId(key));
            }
        }

        let mut work: Vec<&[AuthorId]> = Vec::with_capacity(buckets.len());
        for (sub, members) in &buckets {
            if members.len() < 2 {
                continue;
            }
            if let Some(cap) = self.config.max_bucket_size {
                if members.len() > cap {
                    tracing::warn!(
                        "skipping r/{}: {} authors exceed max_bucket_size {}",
                        sub,
                        members.len(),
                        cap
                    );
                    stats.skipped_buckets += 1;
                    continue;
                }
            }
            if members.len() > self.config.bucket_warn_threshold {
                tracing::warn!(
                    "r/{} has {} qualifying authors (~{} pairs)",
                    sub,
                    members.len(),
                    members.len() * (members.len() - 1) / 2
                );
                stats.oversized_buckets += 1;
            }
            work.push(members.as_slice());
        }

        // 3. Pair enumeration (Map-Reduce)
        let cancel = self.cancel.as_deref();
        let acc = work
            .par_iter()
            .fold(EdgeAccumulator::new, |mut acc, members| {
                if !cancel.map_or(false, |c| c.load(Ordering::Relaxed)) {
                    acc.add_bucket(members);
                }
                acc
            })
            .reduce(EdgeAccumulator::new, EdgeAccumulator::merge);

        stats.buckets = acc.buckets;
        stats.pair_updates = acc.pair_updates;
        stats.cancelled = acc.buckets < work.len();

        // 4. Materialize weight >= 1 edges
        let graph = UserGraph::from_weights(interner, acc.pair_weight);
        stats.edges = graph.edge_count();

        tracing::info!(
            "co-occurrence graph: {} qualifying authors, {} buckets, {} nodes, {} edges",
            stats.qualifying_authors,
            stats.buckets,
            graph.node_count(),
            stats.edges
        );

        (graph, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(rows: &[(&str, i32, &str, u64)]) -> ContributionIndex {
        let mut index = ContributionIndex::new();
        for &(a, y, s, c) in rows {
            index.insert(a, y, s, c);
        }
        index
    }

    #[test]
    fn test_shared_subreddits_become_weight() {
        let index = index(&[
            ("A", 2020, "x", 2),
            ("A", 2020, "y", 3),
            ("B", 2020, "x", 1),
            ("B", 2020, "y", 1),
            ("C", 2020, "z", 5),
        ]);
        let (graph, stats) = CoOccurrenceGraphBuilder::new(GraphConfig::default()).build(&index);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.weight_between("A", "B"), Some(2));
        assert!(!graph.contains_author("C"));
        assert_eq!(stats.qualifying_authors, 3);
        assert_eq!(stats.buckets, 2);
    }

    #[test]
    fn test_excluded_subreddit_never_counts() {
        let index = index(&[
            ("A", 2020, "AskReddit", 9),
            ("B", 2020, "askreddit", 9),
            ("A", 2020, "rust", 1),
            ("B", 2020, "rust", 1),
        ]);
        let mut config = GraphConfig::default();
        config.excluded_subreddits.insert("AskReddit".into());

        let (graph, _) = CoOccurrenceGraphBuilder::new(config).build(&index);
        assert_eq!(graph.weight_between("A", "B"), Some(1));
    }

    #[test]
    fn test_exclusion_matches_any_case() {
        let index = index(&[
            ("A", 2020, "ASKREDDIT", 1),
            ("B", 2020, "AskReddit", 1),
            ("C", 2020, "askreddit", 1),
        ]);
        let mut config = GraphConfig::default();
        config.excluded_subreddits.insert("aSkReDdIt".into());

        let builder = CoOccurrenceGraphBuilder::new(config);
        assert!(builder.qualifying_subreddits(index.get("A").unwrap()).is_none());
        let (graph, stats) = builder.build(&index);
        assert!(graph.is_empty());
        assert_eq!(stats.qualifying_authors, 0);
    }

    #[test]
    fn test_thresholds_and_year_window() {
        let index = index(&[
            ("A", 2019, "x", 1),
            ("A", 2020, "y", 1),
            ("A", 2020, "w", 1),
            ("B", 2020, "y", 1),
            ("B", 2020, "w", 1),
            ("C", 2020, "y", 1),
        ]);
        let mut config = GraphConfig::default();
        config.min_subreddits = 2;
        config.year_start = Some(2020);

        let builder = CoOccurrenceGraphBuilder::new(config);
        let (graph, stats) = builder.build(&index);
        assert_eq!(stats.qualifying_authors, 2);
        assert_eq!(graph.weight_between("A", "B"), Some(2));
        assert!(!graph.contains_author("C"));

        let subs = builder
            .qualifying_subreddits(index.get("A").unwrap())
            .unwrap();
        assert_eq!(subs, vec!["w", "y"]);
    }

    #[test]
    fn test_eligibility_filter() {
        let index = index(&[("A", 2020, "x", 1), ("B", 2020, "x", 1), ("C", 2020, "x", 1)]);
        let eligible: HashSet<String> = ["A", "C"].into_iter().map(String::from).collect();

        let (graph, stats) = CoOccurrenceGraphBuilder::new(GraphConfig::default())
            .with_eligible(&eligible)
            .build(&index);
        assert_eq!(stats.candidate_authors, 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.weight_between("A", "C"), Some(1));
    }

    #[test]
    fn test_bucket_cap_skips_large_subreddits() {
        let index = index(&[
            ("A", 2020, "big", 1),
            ("B", 2020, "big", 1),
            ("C", 2020, "big", 1),
            ("A", 2020, "small", 1),
            ("B", 2020, "small", 1),
        ]);
        let mut config = GraphConfig::default();
        config.max_bucket_size = Some(2);

        let (graph, stats) = CoOccurrenceGraphBuilder::new(config).build(&index);
        assert_eq!(stats.skipped_buckets, 1);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.weight_between("A", "B"), Some(1));
    }

    #[test]
    fn test_large_bucket_is_reported_but_kept() {
        let index = index(&[("A", 2020, "big", 1), ("B", 2020, "big", 1), ("C", 2020, "big", 1)]);
        let mut config = GraphConfig::default();
        config.bucket_warn_threshold = 2;

        let (graph, stats) = CoOccurrenceGraphBuilder::new(config).build(&index);
        assert_eq!(stats.oversized_buckets, 1);
        assert_eq!(stats.skipped_buckets, 0);
        assert_eq!(stats.pair_updates, 3);
        assert_eq!(graph.edge_count(), 3);
        for (a, b) in [("A", "B"), ("A", "C"), ("B", "C")] {
            assert_eq!(graph.weight_between(a, b), Some(1));
        }
    }

    #[test]
    fn test_cancelled_build_is_partial() {
        let index = index(&[("A", 2020, "x", 1), ("B", 2020, "x", 1)]);
        let flag = Arc::new(AtomicBool::new(true));

        let (graph, stats) = CoOccurrenceGraphBuilder::new(GraphConfig::default())
            .with_cancellation(flag)
            .build(&index);
        assert!(graph.is_empty());
        assert!(stats.cancelled);
    }

    #[test]
    fn test_empty_index() {
        let (graph, stats) =
            CoOccurrenceGraphBuilder::new(GraphConfig::default()).build(&ContributionIndex::new());
        assert!(graph.is_empty());
        assert_eq!(stats, BuildStats::default());
    }
}
