//! End-to-end orchestration of the network stages.

pub mod build_network;

pub use build_network::{NetworkOutput, NetworkPipeline, PipelineStats};
