//! Orchestrates: cascades + contributions -> co-occurrence graph -> giant
//! component -> sanitized cascades + backbone.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    config::PipelineConfig,
    corpus::{
        CascadeReader, CascadeSanitizer, CascadeSet, ContributionIndex, ContributionReader,
        LoadReport,
    },
    errors::Result,
    graph::{
        Backbone, BuildStats, CoOccurrenceGraphBuilder, ComponentFilter, DisparityBackboneFilter,
        RetainedUsers, UserGraph,
    },
};

/// Per-stage counters of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Cascade file load counters, when loaded from disk.
    pub cascade_load: Option<LoadReport>,
    /// Contribution file load counters, when loaded from disk.
    pub contribution_load: Option<LoadReport>,
    /// Cascades handed to the pipeline.
    pub cascades_in: usize,
    /// Cascades surviving sanitization.
    pub cascades_out: usize,
    /// Authors meeting `min_cascade_count`.
    pub eligible_authors: usize,
    /// Graph builder counters.
    pub build: BuildStats,
    /// Connected components of the raw graph.
    pub components: usize,
    /// Nodes of the giant component.
    pub retained_users: usize,
    /// Edges of the giant component.
    pub giant_edges: usize,
    /// Edges of the backbone.
    pub backbone_edges: usize,
    /// Giant-component edges with a zero-variance null.
    pub zero_variance_edges: usize,
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct NetworkOutput {
    /// Authors of the giant component.
    pub retained: RetainedUsers,
    /// Co-occurrence graph before component filtering.
    pub raw: UserGraph,
    /// Giant connected component.
    pub giant: UserGraph,
    /// Significant edges of the giant component, with scores.
    pub backbone: Backbone,
    /// Input cascades restricted to the retained users.
    pub cascades: CascadeSet,
    /// Stage counters.
    pub stats: PipelineStats,
}

/// High-level pipeline: eligibility -> graph -> giant component -> outputs.
#[derive(Debug)]
pub struct NetworkPipeline {
    config: PipelineConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl NetworkPipeline {
    /// Create a pipeline; the configuration is validated here, before any
    /// input is read.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: None,
        })
    }

    /// Share a cancellation flag with the builder and the backbone filter.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load both inputs from disk, enforce the malformed-record tolerance,
    /// then run.
    pub fn run_files(
        &self,
        cascades: &CascadeReader,
        contributions: &ContributionReader,
    ) -> Result<NetworkOutput> {
        let (cascade_set, cascade_load) = cascades.load()?;
        cascade_load.check(&cascades.path().display().to_string(), self.config.max_skip_rate)?;

        let (index, contribution_load) = contributions.load()?;
        contribution_load.check(
            &contributions.path().display().to_string(),
            self.config.max_skip_rate,
        )?;

        let mut output = self.run(&cascade_set, &index)?;
        output.stats.cascade_load = Some(cascade_load);
        output.stats.contribution_load = Some(contribution_load);
        Ok(output)
    }

    /// Run every stage over in-memory inputs.
    pub fn run(
        &self,
        cascades: &CascadeSet,
        contributions: &ContributionIndex,
    ) -> Result<NetworkOutput> {
        let mut stats = PipelineStats {
            cascades_in: cascades.len(),
            ..PipelineStats::default()
        };

        // 1. Eligibility from cascade appearances
        let eligible = cascades.authors_with_min_appearances(self.config.min_cascade_count);
        stats.eligible_authors = eligible.len();
        tracing::info!(
            "{} of {} cascade authors appear in at least {} cascades",
            eligible.len(),
            cascades.appearance_counts().len(),
            self.config.min_cascade_count
        );

        // 2. Co-occurrence graph
        let mut builder =
            CoOccurrenceGraphBuilder::new(self.config.graph.clone()).with_eligible(&eligible);
        if let Some(flag) = &self.cancel {
            builder = builder.with_cancellation(flag.clone());
        }
        let (raw, build) = builder.build(contributions);
        stats.build = build;

        // 3. Giant component and the retained-user set
        let giant = ComponentFilter::extract(&raw);
        stats.components = giant.component_count;
        stats.retained_users = giant.retained.len();
        stats.giant_edges = giant.graph.edge_count();

        // 4. Cascades restricted to the same users
        let sanitized = CascadeSanitizer::sanitize(cascades, &giant.retained);
        stats.cascades_out = sanitized.len();

        // 5. Backbone of the giant component
        let mut filter = DisparityBackboneFilter::new(self.config.backbone.clone())?;
        if let Some(flag) = &self.cancel {
            filter = filter.with_cancellation(flag.clone());
        }
        let backbone = filter.extract(&giant.graph)?;
        stats.backbone_edges = backbone.graph.edge_count();
        stats.zero_variance_edges = backbone.zero_variance;

        tracing::debug!(?stats, "pipeline finished");

        Ok(NetworkOutput {
            retained: giant.retained,
            raw,
            giant: giant.graph,
            backbone,
            cascades: sanitized,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackboneMethod;
    use crate::corpus::{Cascade, Participation};

    /// `("t1", "a b")` is thread `t1` with authors `a` then `b`.
    fn cascades(rows: &[(&str, &str)]) -> CascadeSet {
        rows.iter()
            .map(|&(id, authors)| {
                Cascade::new(
                    id,
                    authors
                        .split_whitespace()
                        .enumerate()
                        .map(|(i, a)| Participation::new(a, i as i64))
                        .collect(),
                )
            })
            .collect()
    }

    fn contributions(rows: &[(&str, &str)]) -> ContributionIndex {
        let mut index = ContributionIndex::new();
        for &(author, sub) in rows {
            index.insert(author, 2020, sub, 1);
        }
        index
    }

    #[test]
    fn test_invalid_config_fails_before_work() {
        let mut config = PipelineConfig::default();
        config.backbone.alpha = 2.0;
        assert!(NetworkPipeline::new(config).is_err());
    }

    #[test]
    fn test_empty_inputs() {
        let pipeline = NetworkPipeline::new(PipelineConfig::default()).unwrap();
        let out = pipeline
            .run(&CascadeSet::new(), &ContributionIndex::new())
            .unwrap();

        assert!(out.retained.is_empty());
        assert!(out.giant.is_empty());
        assert!(out.backbone.graph.is_empty());
        assert!(out.cascades.is_empty());
    }

    #[test]
    fn test_graph_and_cascades_share_users() {
        let set = cascades(&[
            ("t1", "a b"),
            ("t2", "b c"),
            ("t3", "x y"),
            ("t4", "a x"),
        ]);
        let index = contributions(&[
            ("a", "rust"),
            ("b", "rust"),
            ("c", "rust"),
            ("b", "go"),
            ("c", "go"),
            ("x", "cats"),
            ("y", "cats"),
        ]);

        let mut config = PipelineConfig::default();
        config.backbone.method = BackboneMethod::Disparity;
        let out = NetworkPipeline::new(config).unwrap().run(&set, &index).unwrap();

        assert_eq!(out.retained.sorted(), vec!["a", "b", "c"]);
        assert_eq!(out.stats.components, 2);
        let ids: Vec<_> = out.cascades.iter().map(|c| c.thread_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        for c in &out.cascades {
            assert!(c.authors().all(|a| out.retained.contains(a)));
        }
        for author in out.backbone.graph.authors() {
            assert!(out.retained.contains(author));
        }
    }

    #[test]
    fn test_min_cascade_count_limits_eligibility() {
        let set = cascades(&[("t1", "a b"), ("t2", "a c"), ("t3", "c")]);
        let index = contributions(&[("a", "rust"), ("b", "rust"), ("c", "rust")]);

        let mut config = PipelineConfig::default();
        config.min_cascade_count = 2;
        let out = NetworkPipeline::new(config).unwrap().run(&set, &index).unwrap();

        assert_eq!(out.stats.eligible_authors, 2);
        assert_eq!(out.retained.sorted(), vec!["a", "c"]);
        let ids: Vec<_> = out.cascades.iter().map(|c| c.thread_id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t3"]);
    }
}
