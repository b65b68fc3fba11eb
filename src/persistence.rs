//! Output framing: filtered cascades (JSONL), edge lists and backbone
//! scores (CSV), and run metadata (JSON).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::PipelineConfig;
use crate::corpus::{CascadeSet, LoadReport};
use crate::graph::{EdgeRecord, GraphMetrics, ScoreRecord, UserGraph};
use crate::pipeline::PipelineStats;

/// Metadata written next to the outputs of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Version of the cascade-core library.
    pub version: String,
    /// RFC 3339 timestamp of creation.
    pub created_at: String,
    /// Configuration the run used.
    pub config: PipelineConfig,
    /// Stage counters.
    pub stats: PipelineStats,
    /// Metrics of the giant component.
    pub giant: GraphMetrics,
    /// Metrics of the backbone.
    pub backbone: GraphMetrics,
}

impl RunMetadata {
    /// Create metadata stamped with the current version and time.
    pub fn new(
        config: &PipelineConfig,
        stats: &PipelineStats,
        giant: GraphMetrics,
        backbone: GraphMetrics,
    ) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            config: config.clone(),
            stats: stats.clone(),
            giant,
            backbone,
        }
    }

    /// Write as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create metadata file {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Read metadata written by [`RunMetadata::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open metadata file {}", path.display()))?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

/// Write cascades as JSONL, one `{"thread": [[author, ts], ...]}` per line,
/// in collection order.
pub fn write_cascades(path: &Path, cascades: &CascadeSet) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create cascade file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for cascade in cascades {
        let mut line = Map::with_capacity(1);
        line.insert(
            cascade.thread_id.clone(),
            serde_json::to_value(&cascade.participants)?,
        );
        serde_json::to_writer(&mut out, &Value::Object(line))?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

/// Write the edges of `graph` as `source,target,weight`, sorted.
pub fn write_edge_list(path: &Path, graph: &UserGraph) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create edge list {}", path.display()))?;
    let records = graph.edge_records();
    if records.is_empty() {
        writer.write_record(["source", "target", "weight"])?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write backbone score rows.
pub fn write_scores(path: &Path, scores: &[ScoreRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create score file {}", path.display()))?;
    if scores.is_empty() {
        writer.write_record([
            "source", "target", "weight", "expected", "z", "p_value", "retained",
        ])?;
    }
    for row in scores {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read an edge list with a `source,target,weight` header.
///
/// Malformed rows, self-loops, zero weights and repeated pairs are skipped
/// and counted in the returned report.
pub fn read_edge_list(path: &Path) -> Result<(UserGraph, LoadReport)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open edge list {}", path.display()))?;

    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for row in reader.deserialize::<EdgeRecord>() {
        report.lines += 1;
        report.records += 1;
        match row {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::debug!("skipping edge row: {}", e);
                report.skipped += 1;
            }
        }
    }

    let (graph, rejected) = UserGraph::from_records(records);
    report.skipped += rejected;
    if report.skipped > 0 {
        tracing::warn!(
            "{}: skipped {} of {} edge rows",
            path.display(),
            report.skipped,
            report.records
        );
    }
    Ok((graph, report))
}
