//! Graph-level summary metrics (size, degree, strength, connectivity).

use serde::{Deserialize, Serialize};

use crate::graph::{ComponentFilter, UserGraph};

/// Summary metrics for health-checking a graph snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    /// Total number of nodes.
    pub num_nodes: usize,
    /// Total number of edges.
    pub num_edges: usize,
    /// Sum of edge weights.
    pub total_weight: u64,
    /// Average degree of the graph.
    pub avg_degree: f64,
    /// Average weighted degree.
    pub avg_strength: f64,
    /// Largest node degree.
    pub max_degree: usize,
    /// Edges over possible edges.
    pub density: f64,
    /// Number of connected components.
    pub num_components: usize,
    /// Node count of the largest component.
    pub largest_component: usize,
}

impl GraphMetrics {
    /// Compute metrics for the given graph.
    pub fn compute(graph: &UserGraph) -> Self {
        let inner = graph.inner();
        let num_nodes = inner.node_count();
        let num_edges = inner.edge_count();
        let total_weight = graph.total_weight();

        if num_nodes == 0 {
            return Self::default();
        }

        let n = num_nodes as f64;
        let max_degree = inner
            .node_indices()
            .map(|idx| inner.neighbors(idx).count())
            .max()
            .unwrap_or(0);
        let density = if num_nodes > 1 {
            2.0 * num_edges as f64 / (n * (n - 1.0))
        } else {
            0.0
        };

        let components = ComponentFilter::label(graph);
        let largest_component = components.sizes.iter().copied().max().unwrap_or(0);

        Self {
            num_nodes,
            num_edges,
            total_weight,
            avg_degree: 2.0 * num_edges as f64 / n,
            avg_strength: 2.0 * total_weight as f64 / n,
            max_degree,
            density,
            num_components: components.count(),
            largest_component,
        }
    }
}
