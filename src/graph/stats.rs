use std::collections::HashMap;

use crate::types::{AuthorId, Weight};

/// Partial co-occurrence weights produced by one worker.
#[derive(Debug, Default)]
pub struct EdgeAccumulator {
    /// Number of subreddit buckets folded into this accumulator.
    pub buckets: usize,
    /// Number of pair increments performed.
    pub pair_updates: u64,
    /// Shared-subreddit count for each canonical `(min, max)` author pair.
    pub pair_weight: HashMap<(AuthorId, AuthorId), Weight>,
}

impl EdgeAccumulator {
    /// Create a new empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one subreddit bucket: every unordered pair of its members gains 1.
    pub fn add_bucket(&mut self, members: &[AuthorId]) {
        self.buckets += 1;
        if members.len() < 2 {
            return;
        }

        let mut uniq = members.to_vec();
        uniq.sort_unstable();
        uniq.dedup();

        for i in 0..uniq.len() {
            for j in (i + 1)..uniq.len() {
                *self.pair_weight.entry((uniq[i], uniq[j])).or_insert(0) += 1;
            }
        }
        let k = uniq.len() as u64;
        self.pair_updates += k * (k - 1) / 2;
    }

    /// Merge another accumulator into this one by summation.
    pub fn merge(mut self, mut other: EdgeAccumulator) -> EdgeAccumulator {
        if other.pair_weight.len() > self.pair_weight.len() {
            std::mem::swap(&mut self, &mut other);
        }
        self.buckets += other.buckets;
        self.pair_updates += other.pair_updates;
        for (k, v) in other.pair_weight {
            *self.pair_weight.entry(k).or_insert(0) += v;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::interner::intern_sorted;

    fn ids(names: &[&str]) -> Vec<AuthorId> {
        let interner = intern_sorted(names.iter().copied());
        names
            .iter()
            .map(|n| AuthorId(interner.get(n).unwrap()))
            .collect()
    }

    #[test]
    fn test_bucket_pairs_are_canonical() {
        let v = ids(&["a", "b", "c"]);
        let mut acc = EdgeAccumulator::new();
        acc.add_bucket(&[v[2], v[0], v[1], v[0]]);

        assert_eq!(acc.pair_weight.len(), 3);
        assert_eq!(acc.pair_updates, 3);
        assert!(acc.pair_weight.keys().all(|(a, b)| a < b));
    }

    #[test]
    fn test_merge_sums_weights() {
        let v = ids(&["a", "b", "c"]);
        let mut left = EdgeAccumulator::new();
        left.add_bucket(&[v[0], v[1]]);
        let mut right = EdgeAccumulator::new();
        right.add_bucket(&[v[0], v[1], v[2]]);
        right.add_bucket(&[v[2]]);

        let merged = left.merge(right);
        assert_eq!(merged.buckets, 3);
        assert_eq!(merged.pair_weight[&(v[0], v[1])], 2);
        assert_eq!(merged.pair_weight[&(v[1], v[2])], 1);
    }
}
