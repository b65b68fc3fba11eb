//! Edge payloads and their serialized forms.

use serde::{Deserialize, Serialize};

use crate::types::Weight;

/// Edge between two users weighted by shared subreddits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoEdge {
    /// Number of qualifying subreddits both users contributed to.
    pub weight: Weight,
}

impl CoEdge {
    /// Create a new edge with the given weight.
    pub fn new(weight: Weight) -> Self {
        Self { weight }
    }
}

/// One row of an edge list: `source,target,weight`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Lexicographically smaller endpoint.
    pub source: String,
    /// Lexicographically larger endpoint.
    pub target: String,
    /// Shared-subreddit count.
    pub weight: Weight,
}

impl EdgeRecord {
    /// Create a record, orienting the endpoints canonically.
    pub fn new(a: impl Into<String>, b: impl Into<String>, weight: Weight) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Self {
                source: a,
                target: b,
                weight,
            }
        } else {
            Self {
                source: b,
                target: a,
                weight,
            }
        }
    }
}

/// One row of a backbone score export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Lexicographically smaller endpoint.
    pub source: String,
    /// Lexicographically larger endpoint.
    pub target: String,
    /// Observed weight.
    pub weight: Weight,
    /// Null-model expectation, when the method defines one.
    pub expected: Option<f64>,
    /// Standardized deviation, absent for zero-variance edges.
    pub z: Option<f64>,
    /// Significance level of the edge.
    pub p_value: f64,
    /// Whether the edge is part of the backbone.
    pub retained: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_orientation() {
        let r = EdgeRecord::new("zed", "amy", 3);
        assert_eq!(r.source, "amy");
        assert_eq!(r.target, "zed");
        assert_eq!(r, EdgeRecord::new("amy", "zed", 3));
    }
}
