//! Per-author, per-year, per-subreddit contribution counts.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Flat contribution record `(author, year, subreddit, count)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRecord {
    /// Author name.
    pub author: String,
    /// Calendar year of the contributions.
    pub year: i32,
    /// Subreddit name.
    pub subreddit: String,
    /// Number of comments and submissions.
    pub count: u64,
}

/// Contributions of a single author, `year -> subreddit -> count`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorActivity {
    years: BTreeMap<i32, BTreeMap<String, u64>>,
}

impl AuthorActivity {
    /// Add `count` contributions; counts for the same key are summed.
    pub fn add(&mut self, year: i32, subreddit: impl Into<String>, count: u64) {
        if count == 0 {
            return;
        }
        *self
            .years
            .entry(year)
            .or_default()
            .entry(subreddit.into())
            .or_insert(0) += count;
    }

    /// Iterate `(year, subreddit, count)` triples.
    pub fn entries(&self) -> impl Iterator<Item = (i32, &str, u64)> + '_ {
        self.years.iter().flat_map(|(&year, subs)| {
            subs.iter()
                .map(move |(sub, &count)| (year, sub.as_str(), count))
        })
    }

    /// Years with at least one contribution.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    /// Per-subreddit totals over the years accepted by `year_filter`.
    pub fn subreddit_totals<F>(&self, year_filter: F) -> BTreeMap<&str, u64>
    where
        F: Fn(i32) -> bool,
    {
        let mut totals = BTreeMap::new();
        for (year, sub, count) in self.entries() {
            if year_filter(year) {
                *totals.entry(sub).or_insert(0) += count;
            }
        }
        totals
    }

    /// Total contributions over all years and subreddits.
    pub fn total(&self) -> u64 {
        self.entries().map(|(_, _, c)| c).sum()
    }

    fn merge(&mut self, other: AuthorActivity) {
        for (year, subs) in other.years {
            for (sub, count) in subs {
                self.add(year, sub, count);
            }
        }
    }
}

/// Read-only index of author activity, built once from external aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionIndex {
    authors: HashMap<String, AuthorActivity>,
}

impl ContributionIndex {
    /// Empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record contributions; zero counts are ignored.
    pub fn insert(&mut self, author: &str, year: i32, subreddit: &str, count: u64) {
        if count == 0 {
            return;
        }
        self.authors
            .entry(author.to_string())
            .or_default()
            .add(year, subreddit, count);
    }

    /// Merge another index into this one, summing overlapping counts.
    pub fn merge(&mut self, other: ContributionIndex) {
        for (author, activity) in other.authors {
            match self.authors.get_mut(&author) {
                Some(existing) => existing.merge(activity),
                None => {
                    self.authors.insert(author, activity);
                }
            }
        }
    }

    /// Activity of one author.
    pub fn get(&self, author: &str) -> Option<&AuthorActivity> {
        self.authors.get(author)
    }

    /// Number of authors.
    pub fn len(&self) -> usize {
        self.authors.len()
    }

    /// Whether no author has any contribution.
    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    /// Iterate `(author, activity)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AuthorActivity)> + '_ {
        self.authors.iter().map(|(a, act)| (a.as_str(), act))
    }
}

impl FromIterator<ContributionRecord> for ContributionIndex {
    fn from_iter<T: IntoIterator<Item = ContributionRecord>>(iter: T) -> Self {
        let mut index = Self::new();
        for r in iter {
            index.insert(&r.author, r.year, &r.subreddit, r.count);
        }
        index
    }
}
