//! JSONL readers for cascades and contribution counts.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::corpus::{Cascade, CascadeSet, ContributionIndex, Participation, TimeWindow};
use crate::errors::{NetworkError, Result};

/// Outcome counters of one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Non-blank lines read.
    pub lines: usize,
    /// Records seen (cascades or contribution tuples).
    pub records: usize,
    /// Malformed records that were skipped.
    pub skipped: usize,
    /// Well-formed records removed by a load-time filter.
    pub dropped: usize,
}

impl LoadReport {
    /// Fraction of records that were malformed.
    pub fn skip_rate(&self) -> f64 {
        if self.records == 0 {
            0.0
        } else {
            self.skipped as f64 / self.records as f64
        }
    }

    /// Fail with [`NetworkError::CorruptInput`] if the skip rate exceeds `tolerance`.
    pub fn check(&self, source_name: &str, tolerance: f64) -> Result<()> {
        if self.skip_rate() > tolerance {
            return Err(NetworkError::CorruptInput {
                source_name: source_name.to_string(),
                skipped: self.skipped,
                total: self.records,
                tolerance,
            });
        }
        Ok(())
    }

    fn skip(&mut self) {
        self.records += 1;
        self.skipped += 1;
    }
}

/// Reader for cascade JSONL files: `{"t3_x": [["author", ts], ...]}` per line.
#[derive(Debug, Clone)]
pub struct CascadeReader {
    path: PathBuf,
    window: TimeWindow,
}

impl CascadeReader {
    /// Reader for the given path with no time window.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            window: TimeWindow::default(),
        }
    }

    /// Restrict participations to `window` while loading.
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Path this reader loads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all cascades from the file.
    pub fn load(&self) -> Result<(CascadeSet, LoadReport)> {
        let file = File::open(&self.path)?;
        self.load_from(BufReader::new(file))
    }

    /// Load cascades from any buffered reader.
    pub fn load_from<R: BufRead>(&self, reader: R) -> Result<(CascadeSet, LoadReport)> {
        let mut report = LoadReport::default();
        let mut cascades = CascadeSet::new();
        let mut seen: HashSet<String> = HashSet::new();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            report.lines += 1;

            let obj: Map<String, Value> = match serde_json::from_str(line) {
                Ok(obj) => obj,
                Err(e) => {
                    tracing::debug!("skipping unparsable cascade line: {}", e);
                    report.skip();
                    continue;
                }
            };

            for (thread_id, value) in obj {
                let participants: Vec<Participation> = match serde_json::from_value(value) {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::debug!("skipping cascade {}: {}", thread_id, e);
                        report.skip();
                        continue;
                    }
                };
                if participants.is_empty() || seen.contains(&thread_id) {
                    report.skip();
                    continue;
                }
                report.records += 1;
                seen.insert(thread_id.clone());

                match Cascade::new(thread_id, participants).restrict_to(&self.window) {
                    Some(cascade) => cascades.push(cascade),
                    None => report.dropped += 1,
                }
            }
        }

        if report.skipped > 0 {
            tracing::warn!(
                "{}: skipped {} malformed cascade records of {}",
                self.path.display(),
                report.skipped,
                report.records
            );
        }
        Ok((cascades, report))
    }
}

#[derive(Debug, Deserialize)]
struct RawContribution {
    author: String,
    data: Map<String, Value>,
}

/// Reader for contribution JSONL files:
/// `{"author": "...", "data": {"2020": {"rust": 3}}}` per line.
#[derive(Debug, Clone)]
pub struct ContributionReader {
    path: PathBuf,
}

impl ContributionReader {
    /// Reader for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this reader loads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the contribution index from the file.
    pub fn load(&self) -> Result<(ContributionIndex, LoadReport)> {
        let file = File::open(&self.path)?;
        self.load_from(BufReader::new(file))
    }

    /// Load the contribution index from any buffered reader.
    pub fn load_from<R: BufRead>(&self, reader: R) -> Result<(ContributionIndex, LoadReport)> {
        let mut report = LoadReport::default();
        let mut index = ContributionIndex::new();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            report.lines += 1;

            let raw: RawContribution = match serde_json::from_str(line) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::debug!("skipping unparsable contribution line: {}", e);
                    report.skip();
                    continue;
                }
            };
            if raw.author.is_empty() {
                report.skip();
                continue;
            }

            for (year_key, subs) in &raw.data {
                let (Ok(year), Value::Object(subs)) = (year_key.trim().parse::<i32>(), subs)
                else {
                    report.skip();
                    continue;
                };
                for (subreddit, count) in subs {
                    match count.as_u64() {
                        Some(count) if count > 0 && !subreddit.is_empty() => {
                            report.records += 1;
                            index.insert(&raw.author, year, subreddit, count);
                        }
                        _ => report.skip(),
                    }
                }
            }
        }

        if report.skipped > 0 {
            tracing::warn!(
                "{}: skipped {} malformed contribution records of {}",
                self.path.display(),
                report.skipped,
                report.records
            );
        }
        Ok((index, report))
    }
}
