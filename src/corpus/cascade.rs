//! Discussion cascades: ordered author participations per thread.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// One author acting in a thread at a point in time.
///
/// Serializes as a two-element array `["author", 1700000000]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participation(pub String, pub Timestamp);

impl Participation {
    /// Create a participation record.
    pub fn new(author: impl Into<String>, timestamp: Timestamp) -> Self {
        Self(author.into(), timestamp)
    }

    /// Author name.
    pub fn author(&self) -> &str {
        &self.0
    }

    /// Epoch seconds of the action.
    pub fn timestamp(&self) -> Timestamp {
        self.1
    }
}

/// Inclusive epoch-second window applied to participations at load time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    /// Earliest accepted timestamp.
    pub start: Option<Timestamp>,
    /// Latest accepted timestamp.
    pub end: Option<Timestamp>,
}

impl TimeWindow {
    /// Window with both bounds optional.
    pub fn new(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        Self { start, end }
    }

    /// Whether neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether `ts` falls inside the window.
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }
}

/// A thread and its participations in temporal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cascade {
    /// Thread identifier, e.g. `t3_abc123`.
    pub thread_id: String,
    /// Participations; insertion order is propagation order.
    pub participants: Vec<Participation>,
}

impl Cascade {
    /// Create a cascade from its thread id and ordered participations.
    pub fn new(thread_id: impl Into<String>, participants: Vec<Participation>) -> Self {
        Self {
            thread_id: thread_id.into(),
            participants,
        }
    }

    /// Number of participations.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether the cascade has no participations.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Authors in propagation order.
    pub fn authors(&self) -> impl Iterator<Item = &str> + '_ {
        self.participants.iter().map(Participation::author)
    }

    /// Keep only participations inside `window`; `None` if nothing is left.
    pub fn restrict_to(&self, window: &TimeWindow) -> Option<Cascade> {
        if window.is_unbounded() {
            return Some(self.clone());
        }
        let kept: Vec<_> = self
            .participants
            .iter()
            .filter(|p| window.contains(p.timestamp()))
            .cloned()
            .collect();
        if kept.is_empty() {
            None
        } else {
            Some(Cascade::new(self.thread_id.clone(), kept))
        }
    }
}

/// Ordered collection of cascades, one per thread id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeSet {
    cascades: Vec<Cascade>,
}

impl CascadeSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cascade. Thread ids are expected to be unique.
    pub fn push(&mut self, cascade: Cascade) {
        self.cascades.push(cascade);
    }

    /// Number of cascades.
    pub fn len(&self) -> usize {
        self.cascades.len()
    }

    /// Whether the set holds no cascades.
    pub fn is_empty(&self) -> bool {
        self.cascades.is_empty()
    }

    /// Iterate cascades in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, Cascade> {
        self.cascades.iter()
    }

    /// Look up a cascade by thread id.
    pub fn get(&self, thread_id: &str) -> Option<&Cascade> {
        self.cascades.iter().find(|c| c.thread_id == thread_id)
    }

    /// Total number of participations across all cascades.
    pub fn participation_count(&self) -> usize {
        self.cascades.iter().map(Cascade::len).sum()
    }

    /// How many participations each author has across all cascades.
    pub fn appearance_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for author in self.cascades.iter().flat_map(|c| c.authors()) {
            *counts.entry(author).or_insert(0) += 1;
        }
        counts
    }

    /// Authors with at least `min_count` participations.
    pub fn authors_with_min_appearances(&self, min_count: usize) -> HashSet<String> {
        self.appearance_counts()
            .into_iter()
            .filter(|&(_, count)| count >= min_count)
            .map(|(author, _)| author.to_string())
            .collect()
    }
}

impl FromIterator<Cascade> for CascadeSet {
    fn from_iter<T: IntoIterator<Item = Cascade>>(iter: T) -> Self {
        Self {
            cascades: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CascadeSet {
    type Item = Cascade;
    type IntoIter = std::vec::IntoIter<Cascade>;

    fn into_iter(self) -> Self::IntoIter {
        self.cascades.into_iter()
    }
}

impl<'a> IntoIterator for &'a CascadeSet {
    type Item = &'a Cascade;
    type IntoIter = std::slice::Iter<'a, Cascade>;

    fn into_iter(self) -> Self::IntoIter {
        self.cascades.iter()
    }
}
