//! Error types for the chain builder.
//!
//! All errors use thiserror for consistent error handling across the codebase.

use crate::part::Stage;
use chainjpeg_formats::jfif::JfifError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Part range outside 1..=16 or reversed
    #[error("Invalid part range {from}..={to}: parts must satisfy 1 <= from <= to <= 16")]
    InvalidPartRange {
        /// First part to build
        from: usize,
        /// Last part to build
        to: usize,
    },

    /// Oracle budget of zero
    #[error("Oracle timeout must be greater than zero")]
    InvalidTimeout,

    /// Missing required configuration value
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Errors raised by a collision oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle program could not be started
    #[error("Failed to start oracle {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The oracle did not finish within its budget
    #[error("Oracle timed out after {budget:?}")]
    Timeout {
        /// Wall-clock budget that expired
        budget: Duration,
    },

    /// The oracle exited unsuccessfully
    #[error("Oracle failed: {0}")]
    Failed(String),

    /// The oracle finished but an expected output is missing
    #[error("Oracle output missing: {}", path.display())]
    MissingOutput {
        /// Expected output file
        path: PathBuf,
    },

    /// The two returned blocks differ in length
    #[error("Oracle returned halves of unequal length: {a} and {b} bytes")]
    UnequalHalves {
        /// Length of the first half
        a: usize,
        /// Length of the second half
        b: usize,
    },

    /// A returned half does not extend the prefix it was asked to extend
    #[error("Oracle half of {len} bytes is shorter than its {prefix_len}-byte prefix")]
    Truncated {
        /// Length of the returned half
        len: usize,
        /// Length of the oracle input
        prefix_len: usize,
    },

    /// I/O error while preparing or collecting oracle files
    #[error("Oracle I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OracleError {
    /// Whether retrying the same part may succeed
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Failed(_) | Self::MissingOutput { .. }
        )
    }
}

/// Chain construction errors.
#[derive(Debug, Error)]
pub enum ChainError {
    /// File system operation failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A required input or earlier-stage artifact does not exist
    #[error("Missing artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// Segment parsing or building failed
    #[error("JFIF error: {0}")]
    Format(#[from] JfifError),

    /// Image has more segments than split file names can order
    #[error("Image has {count} segments, split file names order at most {max}")]
    TooManySegments {
        /// Segments up to end of image
        count: usize,
        /// Largest supported count
        max: usize,
    },

    /// Parsed segments do not rebuild the bytes they were read from
    #[error("Segments do not rebuild the source image: {0}")]
    RoundTrip(String),

    /// Oracle failed in a way retrying cannot fix
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// A constructed prefix landed on the wrong block offset
    #[error("Length {len} is not {residue} mod 64")]
    Misaligned {
        /// Actual length
        len: usize,
        /// Required residue
        residue: usize,
    },

    /// Filled halves grew by a different amount than in earlier parts
    #[error("Filled halves grow the prefix by {actual} bytes, earlier parts grew it by {expected}")]
    FillDrift {
        /// Growth seen in earlier parts
        expected: usize,
        /// Growth in this part
        actual: usize,
    },

    /// Retry policy gave up on a part
    #[error("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        #[source]
        last: OracleError,
    },

    /// Part index outside 1..=16
    #[error("Invalid part index {0}, expected 1..=16")]
    InvalidPart(usize),

    /// Wrong number of long branches handed to the variant assembler
    #[error("Expected {expected} long variants, got {actual}")]
    VariantCount {
        /// Required count
        expected: usize,
        /// Supplied count
        actual: usize,
    },

    /// Shared prefix longer than the blob it should be stripped from
    #[error("Shared prefix of {prefix_len} bytes exceeds {data_len}-byte input for digit {digit:x}")]
    PrefixTooLong {
        /// Output digit
        digit: usize,
        /// Shared prefix length
        prefix_len: usize,
        /// Length of the blob
        data_len: usize,
    },

    /// A long branch is longer than the terminal tail it is stitched onto
    #[error("Digit {digit:x}: stripped branch of {stripped} bytes exceeds {tail}-byte tail")]
    StitchOverflow {
        /// Output digit
        digit: usize,
        /// Stripped branch length
        stripped: usize,
        /// Tail length
        tail: usize,
    },

    /// An assembled output is not a well-formed image
    #[error("Output {digit:x} is not a valid image: {source}")]
    InvalidOutput {
        /// Output digit
        digit: usize,
        /// Parse failure
        #[source]
        source: JfifError,
    },

    /// Output digests differ
    #[error("Digests differ for outputs {digits:x?}")]
    DigestMismatch {
        /// Digits whose digest differs from output 0
        digits: Vec<usize>,
    },

    /// Error raised while building a specific part
    #[error("Part {part} failed at stage {stage}: {source}")]
    Part {
        /// Part index
        part: usize,
        /// Stage that failed
        stage: Stage,
        /// Underlying error
        #[source]
        source: Box<ChainError>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ChainError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach part and stage context, keeping the innermost context
    #[must_use]
    pub fn at(self, part: usize, stage: Stage) -> Self {
        match self {
            Self::Part { .. } => self,
            other => Self::Part {
                part,
                stage,
                source: Box::new(other),
            },
        }
    }
}

/// Result type alias for chain operations
pub type Result<T> = std::result::Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_error_recoverability() {
        assert!(
            OracleError::Timeout {
                budget: Duration::from_secs(1)
            }
            .is_recoverable()
        );
        assert!(OracleError::Failed("exit status: 1".to_string()).is_recoverable());
        assert!(
            OracleError::MissingOutput {
                path: PathBuf::from("collision1.bin")
            }
            .is_recoverable()
        );
        assert!(!OracleError::UnequalHalves { a: 1, b: 2 }.is_recoverable());
        assert!(
            !OracleError::Truncated {
                len: 10,
                prefix_len: 12
            }
            .is_recoverable()
        );
        assert!(
            !OracleError::Spawn {
                program: PathBuf::from("missing"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_part_context_message() {
        let err = ChainError::Misaligned { len: 70, residue: 12 }.at(3, Stage::CollisionPrefix);
        let msg = err.to_string();
        assert!(msg.contains("Part 3"));
        assert!(msg.contains("collision-prefix"));
        assert!(msg.contains("12 mod 64"));
    }

    #[test]
    fn test_part_context_is_not_nested() {
        let err = ChainError::InvalidPart(17)
            .at(2, Stage::ImageBody)
            .at(5, Stage::Final);
        assert!(matches!(
            err,
            ChainError::Part {
                part: 2,
                stage: Stage::ImageBody,
                ..
            }
        ));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: ChainError = ConfigError::InvalidTimeout.into();
        assert!(err.to_string().contains("timeout"));
    }
}
