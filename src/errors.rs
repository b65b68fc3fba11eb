//! Error types for cascade-core.

use thiserror::Error;

/// Top-level error type for network construction and filtering.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Contradictory or out-of-range parameters, rejected before processing.
    #[error("configuration error: {0}")]
    Config(String),

    /// Too many malformed records in an input source.
    #[error(
        "corrupt input in {source_name}: skipped {skipped} of {total} records (tolerance {tolerance})"
    )]
    CorruptInput {
        /// Name of the offending source (usually a file path).
        source_name: String,
        /// Number of malformed records that were dropped.
        skipped: usize,
        /// Number of records read in total.
        total: usize,
        /// Maximum tolerated skip rate.
        tolerance: f64,
    },

    /// Reference distribution could not be constructed.
    #[error("numeric error: {0}")]
    Numeric(String),

    /// I/O error wrapper.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cascade-core operations.
pub type Result<T> = std::result::Result<T, NetworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_convert() {
        fn open_missing() -> Result<std::fs::File> {
            Ok(std::fs::File::open("/nonexistent/cascade-core/input.jsonl")?)
        }
        assert!(matches!(open_missing(), Err(NetworkError::Io(_))));
    }

    #[test]
    fn test_corrupt_input_message() {
        let err = NetworkError::CorruptInput {
            source_name: "edges.csv".into(),
            skipped: 3,
            total: 10,
            tolerance: 0.1,
        };
        assert_eq!(
            err.to_string(),
            "corrupt input in edges.csv: skipped 3 of 10 records (tolerance 0.1)"
        );
    }
}
