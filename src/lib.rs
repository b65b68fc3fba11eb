#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, rust_2018_idioms)]
#![warn(missing_docs)]

//! # cascade-core
//!
//! Core library turning Reddit discussion cascades and per-author
//! contribution counts into a validated social network:
//! - user-user co-occurrence graph from shared subreddits
//! - giant-component extraction with jointly filtered cascades
//! - noise-corrected (or disparity) significance backbone
//!
//! Every stage produces a new immutable snapshot; results are deterministic
//! regardless of thread scheduling.

/// Pipeline, graph and backbone parameters.
pub mod config;
pub mod corpus;
/// Library error type.
pub mod errors;
pub mod graph;
/// High-level pipelines.
pub mod pipeline;
/// Output framing for cascades, edge lists, scores and metadata.
pub mod persistence;
/// Shared identifiers and scalar aliases.
pub mod types;

pub use config::{BackboneConfig, BackboneMethod, GraphConfig, NullModel, PipelineConfig};
pub use errors::{NetworkError, Result};
pub use graph::UserGraph;
pub use pipeline::{NetworkOutput, NetworkPipeline, PipelineStats};
pub use types::{AuthorId, Timestamp, Weight};
