//! Configuration for graph construction, joint filtering and backboning.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{NetworkError, Result};

/// Statistical null used for the variance of a noise-corrected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NullModel {
    /// `W` independent draws with success probability `s_i·s_j / W²`.
    #[default]
    Binomial,
    /// `s_i` draws without replacement from `W` units, `s_j` of them marked.
    Hypergeometric,
}

/// Edge significance test applied by the backbone filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackboneMethod {
    /// Global strength-preserving null with a standardized deviation.
    #[default]
    NoiseCorrected,
    /// Per-node disparity filter on normalized local weights.
    Disparity,
}

impl FromStr for NullModel {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "binomial" => Ok(Self::Binomial),
            "hypergeometric" => Ok(Self::Hypergeometric),
            other => Err(NetworkError::Config(format!("unknown null model '{other}'"))),
        }
    }
}

impl FromStr for BackboneMethod {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "noise-corrected" | "ncdf" | "nc" => Ok(Self::NoiseCorrected),
            "disparity" | "df" => Ok(Self::Disparity),
            other => Err(NetworkError::Config(format!(
                "unknown backbone method '{other}'"
            ))),
        }
    }
}

impl fmt::Display for NullModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binomial => f.write_str("binomial"),
            Self::Hypergeometric => f.write_str("hypergeometric"),
        }
    }
}

impl fmt::Display for BackboneMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoiseCorrected => f.write_str("noise-corrected"),
            Self::Disparity => f.write_str("disparity"),
        }
    }
}

/// Parameters of the co-occurrence graph builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Minimum number of distinct qualifying subreddits per author.
    pub min_subreddits: usize,
    /// Contribution count a subreddit needs to qualify for an author.
    pub min_subreddit_contributions: u64,
    /// Minimum summed contribution count over qualifying subreddits.
    pub min_total_activity: u64,
    /// Subreddits that never contribute to edge weight (case-insensitive).
    pub excluded_subreddits: BTreeSet<String>,
    /// First contribution year taken into account (inclusive).
    pub year_start: Option<i32>,
    /// Last contribution year taken into account (inclusive).
    pub year_end: Option<i32>,
    /// Buckets with more qualifying authors than this are skipped.
    pub max_bucket_size: Option<usize>,
    /// Buckets with more qualifying authors than this are reported.
    pub bucket_warn_threshold: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_subreddits: 1,
            min_subreddit_contributions: 1,
            min_total_activity: 1,
            excluded_subreddits: BTreeSet::new(),
            year_start: None,
            year_end: None,
            max_bucket_size: None,
            bucket_warn_threshold: 10_000,
        }
    }
}

impl GraphConfig {
    /// Excluded subreddits, ASCII-lowercased for case-insensitive lookup.
    pub fn excluded_lowercase(&self) -> HashSet<String> {
        self.excluded_subreddits
            .iter()
            .map(|s| s.to_ascii_lowercase())
            .collect()
    }

    /// Whether contributions from `year` fall inside the configured window.
    pub fn year_in_window(&self, year: i32) -> bool {
        self.year_start.map_or(true, |start| year >= start)
            && self.year_end.map_or(true, |end| year <= end)
    }
}

/// Parameters of the backbone filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackboneConfig {
    /// Significance level; smaller values give a sparser backbone.
    pub alpha: f64,
    /// Significance test.
    pub method: BackboneMethod,
    /// Variance model for [`BackboneMethod::NoiseCorrected`].
    pub null_model: NullModel,
}

impl Default for BackboneConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            method: BackboneMethod::NoiseCorrected,
            null_model: NullModel::Binomial,
        }
    }
}

impl BackboneConfig {
    /// Reject an `alpha` outside the open unit interval.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(NetworkError::Config(format!(
                "alpha must lie in (0, 1), got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Minimum cascade appearances for an author to enter the graph.
    pub min_cascade_count: usize,
    /// Refuse to run unless at least one subreddit is excluded.
    pub require_exclusions: bool,
    /// Highest tolerated fraction of malformed input records.
    pub max_skip_rate: f64,
    /// Graph builder parameters.
    pub graph: GraphConfig,
    /// Backbone parameters.
    pub backbone: BackboneConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_cascade_count: 1,
            require_exclusions: false,
            max_skip_rate: 0.01,
            graph: GraphConfig::default(),
            backbone: BackboneConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Check the configuration for contradictions before any work starts.
    pub fn validate(&self) -> Result<()> {
        self.backbone.validate()?;

        if !(0.0..=1.0).contains(&self.max_skip_rate) {
            return Err(NetworkError::Config(format!(
                "max_skip_rate must lie in [0, 1], got {}",
                self.max_skip_rate
            )));
        }

        let graph = &self.graph;
        if let (Some(start), Some(end)) = (graph.year_start, graph.year_end) {
            if start > end {
                return Err(NetworkError::Config(format!(
                    "year_start {start} is after year_end {end}"
                )));
            }
        }
        if let Some(cap) = graph.max_bucket_size {
            if cap < 2 {
                return Err(NetworkError::Config(format!(
                    "max_bucket_size {cap} leaves no author pairs"
                )));
            }
        }
        if graph.min_subreddit_contributions == 0 {
            return Err(NetworkError::Config(
                "min_subreddit_contributions must be at least 1".into(),
            ));
        }
        if self.require_exclusions && graph.excluded_subreddits.is_empty() {
            return Err(NetworkError::Config(
                "excluded_subreddits is empty but require_exclusions is set".into(),
            ));
        }

        Ok(())
    }
}
