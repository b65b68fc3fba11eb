//! User graph snapshots: construction, components, backbone, metrics.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::corpus::interner::{intern_sorted, AuthorInterner};
use crate::types::{AuthorId, Weight};

pub mod edge;
pub mod builder;
/// Union-find component extraction and the retained-user set.
pub mod components;
/// Noise-corrected and disparity backbone extraction.
pub mod backbone;
pub mod metrics;
/// Partial edge-weight maps for map-reduce accumulation.
pub mod stats;

pub use backbone::{Backbone, DisparityBackboneFilter, EdgeScore};
pub use builder::{BuildStats, CoOccurrenceGraphBuilder};
pub use components::{ComponentFilter, GiantComponent, RetainedUsers};
pub use edge::{CoEdge, EdgeRecord, ScoreRecord};
pub use metrics::GraphMetrics;
pub use stats::EdgeAccumulator;

/// Immutable weighted undirected user graph.
///
/// Nodes are dense indices into a petgraph arena, added in author-name
/// order, so every edge is stored with `source < target`. Only authors with
/// at least one edge are present. Snapshots derived from one another share
/// the interner.
#[derive(Debug, Clone)]
pub struct UserGraph {
    inner: UnGraph<AuthorId, CoEdge>,
    interner: Arc<AuthorInterner>,
}

impl UserGraph {
    /// Graph with no nodes and no edges.
    pub fn empty() -> Self {
        Self {
            inner: UnGraph::new_undirected(),
            interner: Arc::new(intern_sorted(std::iter::empty::<&str>())),
        }
    }

    /// Build from accumulated pair weights over interned authors.
    ///
    /// Self-loops and zero weights are dropped; `(u, v)` and `(v, u)` are the
    /// same edge and their weights are summed.
    pub fn from_weights<I>(interner: Arc<AuthorInterner>, weights: I) -> Self
    where
        I: IntoIterator<Item = ((AuthorId, AuthorId), Weight)>,
    {
        let mut canonical: BTreeMap<(AuthorId, AuthorId), Weight> = BTreeMap::new();
        for ((a, b), w) in weights {
            if a == b || w == 0 {
                continue;
            }
            let key = if a < b { (a, b) } else { (b, a) };
            *canonical.entry(key).or_insert(0) += w;
        }

        let nodes: BTreeSet<AuthorId> = canonical.keys().flat_map(|&(a, b)| [a, b]).collect();

        let mut inner = UnGraph::with_capacity(nodes.len(), canonical.len());
        let mut index: HashMap<AuthorId, NodeIndex> = HashMap::with_capacity(nodes.len());
        for id in nodes {
            index.insert(id, inner.add_node(id));
        }
        for ((a, b), w) in canonical {
            inner.add_edge(index[&a], index[&b], CoEdge::new(w));
        }

        Self { inner, interner }
    }

    /// Build from named edge records, returning the graph and the number of
    /// rejected records (self-loops, zero weights, repeated pairs).
    pub fn from_records<I>(records: I) -> (Self, usize)
    where
        I: IntoIterator<Item = EdgeRecord>,
    {
        let mut skipped = 0;
        let mut kept: BTreeMap<(String, String), Weight> = BTreeMap::new();
        for r in records {
            let r = EdgeRecord::new(r.source, r.target, r.weight);
            if r.source == r.target || r.weight == 0 {
                skipped += 1;
                continue;
            }
            let key = (r.source, r.target);
            if kept.contains_key(&key) {
                skipped += 1;
                continue;
            }
            kept.insert(key, r.weight);
        }

        let interner = Arc::new(intern_sorted(
            kept.keys().flat_map(|(a, b)| [a.as_str(), b.as_str()]),
        ));
        let weights: Vec<_> = kept
            .iter()
            .filter_map(|((a, b), &w)| {
                let a = AuthorId(interner.get(a.as_str())?);
                let b = AuthorId(interner.get(b.as_str())?);
                Some(((a, b), w))
            })
            .collect();

        (Self::from_weights(interner, weights), skipped)
    }

    /// Access the underlying petgraph graph.
    pub fn inner(&self) -> &UnGraph<AuthorId, CoEdge> {
        &self.inner
    }

    /// Interner resolving node ids to author names.
    pub fn interner(&self) -> &Arc<AuthorInterner> {
        &self.interner
    }

    /// Number of authors with at least one edge.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Whether the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.inner.edge_count() == 0
    }

    /// Author name of a node.
    pub fn name(&self, idx: NodeIndex) -> &str {
        self.interner.resolve(&self.inner[idx].0)
    }

    /// Node index of an author, if present.
    pub fn node_of(&self, author: &str) -> Option<NodeIndex> {
        let id = AuthorId(self.interner.get(author)?);
        // Nodes are sorted by id, so binary search over the arena works.
        let nodes = self.inner.raw_nodes();
        nodes
            .binary_search_by(|n| n.weight.cmp(&id))
            .ok()
            .map(NodeIndex::new)
    }

    /// Whether the author is a node of this graph.
    pub fn contains_author(&self, author: &str) -> bool {
        self.node_of(author).is_some()
    }

    /// Author names in node order.
    pub fn authors(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner
            .node_indices()
            .map(move |idx| self.name(idx))
    }

    /// Edges as `(source, target, weight)` with `source < target`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, Weight)> + '_ {
        self.inner
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight().weight))
    }

    /// Weight of the edge between two authors, in either orientation.
    pub fn weight_between(&self, a: &str, b: &str) -> Option<Weight> {
        let (a, b) = (self.node_of(a)?, self.node_of(b)?);
        let e = self.inner.find_edge(a, b)?;
        self.inner.edge_weight(e).map(|e| e.weight)
    }

    /// Sum of all edge weights, each undirected edge counted once.
    pub fn total_weight(&self) -> u64 {
        self.edges().map(|(_, _, w)| u64::from(w)).sum()
    }

    /// Named edge list sorted by `(source, target)`.
    pub fn edge_records(&self) -> Vec<EdgeRecord> {
        let mut records: Vec<_> = self
            .edges()
            .map(|(a, b, w)| EdgeRecord::new(self.name(a), self.name(b), w))
            .collect();
        records.sort_unstable();
        records
    }

    /// New snapshot holding only the edges accepted by `keep`.
    ///
    /// Nodes left without edges are not carried over.
    pub fn retain_edges<F>(&self, mut keep: F) -> UserGraph
    where
        F: FnMut(NodeIndex, NodeIndex, Weight) -> bool,
    {
        let weights: Vec<_> = self
            .edges()
            .filter(|&(a, b, w)| keep(a, b, w))
            .map(|(a, b, w)| ((self.inner[a], self.inner[b]), w))
            .collect();
        UserGraph::from_weights(self.interner.clone(), weights)
    }
}

impl Default for UserGraph {
    fn default() -> Self {
        Self::empty()
    }
}
