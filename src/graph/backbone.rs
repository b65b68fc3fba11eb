use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use petgraph::graph::NodeIndex;
use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::{
    config::{BackboneConfig, BackboneMethod, NullModel},
    errors::{NetworkError, Result},
    graph::{ScoreRecord, UserGraph},
    types::Weight,
};

/// Relative variance below which the null is treated as deterministic.
const VARIANCE_EPSILON: f64 = 1e-12;

/// Significance annotation of one edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeScore {
    /// Smaller endpoint.
    pub source: NodeIndex,
    /// Larger endpoint.
    pub target: NodeIndex,
    /// Observed weight.
    pub weight: Weight,
    /// `s_i·s_j / W` for the noise-corrected test.
    pub expected: Option<f64>,
    /// `None` when the null variance is zero.
    pub z: Option<f64>,
    /// One-sided significance level, or the disparity score.
    pub p_value: f64,
    /// Whether the edge belongs to the backbone.
    pub retained: bool,
}

impl EdgeScore {
    /// Named form of this score; `graph` must be the graph that was scored.
    pub fn to_record(&self, graph: &UserGraph) -> ScoreRecord {
        ScoreRecord {
            source: graph.name(self.source).to_string(),
            target: graph.name(self.target).to_string(),
            weight: self.weight,
            expected: self.expected,
            z: self.z,
            p_value: self.p_value,
            retained: self.retained,
        }
    }
}

/// Backbone graph together with the per-edge scores it was cut from.
#[derive(Debug, Clone)]
pub struct Backbone {
    /// Retained edges only.
    pub graph: UserGraph,
    /// One score per scored edge of the input graph, in input edge order.
    pub scores: Vec<EdgeScore>,
    /// Edges whose null variance was zero (never retained).
    pub zero_variance: usize,
    /// Whether scoring stopped before every edge was visited.
    pub cancelled: bool,
}

impl Backbone {
    /// Score rows sorted by `(source, target)`; `scored` is the input graph.
    pub fn records(&self, scored: &UserGraph) -> Vec<ScoreRecord> {
        let mut rows: Vec<_> = self.scores.iter().map(|s| s.to_record(scored)).collect();
        rows.sort_unstable_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
        rows
    }
}

/// Per-node strength and degree, plus the total weight `W`.
#[derive(Debug, Clone)]
struct NodeStrengths {
    strength: Vec<u64>,
    degree: Vec<u32>,
    total: u64,
}

impl NodeStrengths {
    fn zeros(n: usize) -> Self {
        Self {
            strength: vec![0; n],
            degree: vec![0; n],
            total: 0,
        }
    }

    fn add(mut self, (a, b, w): (NodeIndex, NodeIndex, Weight)) -> Self {
        let w = u64::from(w);
        for i in [a.index(), b.index()] {
            self.strength[i] += w;
            self.degree[i] += 1;
        }
        self.total += w;
        self
    }

}

/// Significance filter keeping edges that exceed a strength-preserving null.
///
/// Each edge is scored independently once node strengths are known, so the
/// scoring pass runs in parallel over edges.
#[derive(Debug)]
pub struct DisparityBackboneFilter {
    config: BackboneConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl DisparityBackboneFilter {
    /// Create a filter; invalid parameters are rejected here.
    pub fn new(config: BackboneConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: None,
        })
    }

    /// Stop scoring further edges once `flag` is set.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &BackboneConfig {
        &self.config
    }

    /// Single sequential pass; one `O(n)` buffer regardless of thread count.
    fn strengths(graph: &UserGraph, edges: &[(NodeIndex, NodeIndex, Weight)]) -> NodeStrengths {
        edges
            .iter()
            .fold(NodeStrengths::zeros(graph.node_count()), |acc, &e| acc.add(e))
    }

    /// Score every edge of `graph`.
    pub fn score(&self, graph: &UserGraph) -> Result<Vec<EdgeScore>> {
        let edges: Vec<_> = graph.edges().collect();
        if edges.is_empty() {
            return Ok(Vec::new());
        }

        let strengths = Self::strengths(graph, &edges);
        let normal = Normal::new(0.0, 1.0).map_err(|e| NetworkError::Numeric(e.to_string()))?;
        let cancel = self.cancel.as_deref();

        let scores = edges
            .par_iter()
            .filter_map(|&(a, b, w)| {
                if cancel.map_or(false, |c| c.load(Ordering::Relaxed)) {
                    return None;
                }
                Some(match self.config.method {
                    BackboneMethod::NoiseCorrected => {
                        self.noise_corrected(a, b, w, &strengths, &normal)
                    }
                    BackboneMethod::Disparity => self.disparity(a, b, w, &strengths),
                })
            })
            .collect();
        Ok(scores)
    }

    /// Score `graph` and keep the significant edges.
    pub fn extract(&self, graph: &UserGraph) -> Result<Backbone> {
        let scores = self.score(graph)?;

        let kept: HashSet<(NodeIndex, NodeIndex)> = scores
            .iter()
            .filter(|s| s.retained)
            .map(|s| (s.source, s.target))
            .collect();
        let backbone = graph.retain_edges(|a, b, _| kept.contains(&(a, b)));

        let zero_variance = match self.config.method {
            BackboneMethod::NoiseCorrected => scores.iter().filter(|s| s.z.is_none()).count(),
            BackboneMethod::Disparity => 0,
        };
        let cancelled = scores.len() < graph.edge_count();

        tracing::info!(
            "backbone ({}, alpha={}): kept {} of {} edges, {} users",
            self.config.method,
            self.config.alpha,
            backbone.edge_count(),
            graph.edge_count(),
            backbone.node_count()
        );
        if zero_variance > 0 {
            tracing::debug!("{} edges had zero null variance", zero_variance);
        }

        Ok(Backbone {
            graph: backbone,
            scores,
            zero_variance,
            cancelled,
        })
    }

    fn noise_corrected(
        &self,
        a: NodeIndex,
        b: NodeIndex,
        weight: Weight,
        strengths: &NodeStrengths,
        normal: &Normal,
    ) -> EdgeScore {
        let total = strengths.total as f64;
        let si = strengths.strength[a.index()] as f64;
        let sj = strengths.strength[b.index()] as f64;
        let w = f64::from(weight);

        let mu = si * sj / total;
        let variance = match self.config.null_model {
            NullModel::Binomial => mu * (1.0 - mu / total),
            NullModel::Hypergeometric if total > 1.0 => {
                si * sj * (total - si) * (total - sj) / (total * total * (total - 1.0))
            }
            NullModel::Hypergeometric => 0.0,
        };

        // Deterministic null: p = 1, never retained.
        let (z, p_value) = if variance > VARIANCE_EPSILON * mu.max(1.0) {
            let z = (w - mu) / variance.sqrt();
            (Some(z), normal.sf(z))
        } else {
            (None, 1.0)
        };

        EdgeScore {
            source: a,
            target: b,
            weight,
            expected: Some(mu),
            z,
            p_value,
            retained: w > mu && p_value < self.config.alpha,
        }
    }

    fn disparity(
        &self,
        a: NodeIndex,
        b: NodeIndex,
        weight: Weight,
        strengths: &NodeStrengths,
    ) -> EdgeScore {
        let w = f64::from(weight);
        let local = |i: NodeIndex| {
            let k = strengths.degree[i.index()];
            if k < 2 {
                return 1.0;
            }
            let s = strengths.strength[i.index()] as f64;
            (1.0 - w / s).powi(k as i32 - 1)
        };
        let p_value = local(a).min(local(b));

        EdgeScore {
            source: a,
            target: b,
            weight,
            expected: None,
            z: None,
            p_value,
            retained: p_value < self.config.alpha,
        }
    }
}
