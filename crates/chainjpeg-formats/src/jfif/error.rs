//! Error types for JFIF segment handling

use thiserror::Error;

/// Errors that can occur when parsing or building JFIF segments
#[derive(Debug, Error)]
pub enum JfifError {
    /// Buffer is too small to hold any JPEG
    #[error("Buffer too short for a JPEG: {0} bytes, need at least 4")]
    TooShort(usize),

    /// A segment did not start with the 0xFF marker prefix
    #[error("Segment at offset 0x{offset:x} does not start with 0xff (found 0x{found:02x})")]
    MissingMarkerPrefix {
        /// Offset of the offending byte
        offset: usize,
        /// Byte found instead of 0xFF
        found: u8,
    },

    /// Marker outside the supported set
    #[error("Unknown segment marker 0x{marker:02x} at offset 0x{offset:x}")]
    UnknownMarker {
        /// Marker byte
        marker: u8,
        /// Offset of the marker byte
        offset: usize,
    },

    /// Declared length smaller than the length field itself
    #[error("Invalid segment length {length} at offset 0x{offset:x}")]
    InvalidLength {
        /// Offset of the segment
        offset: usize,
        /// Declared length
        length: u16,
    },

    /// Data is too short for the declared structure
    #[error("Truncated data at offset 0x{offset:x}: expected {expected} bytes, got {actual} bytes")]
    TruncatedData {
        /// Offset of the segment being read
        offset: usize,
        /// Bytes required from the offset
        expected: usize,
        /// Bytes available from the offset
        actual: usize,
    },

    /// Stream ended without an end-of-image marker
    #[error("No end-of-image marker before end of data ({0} bytes)")]
    MissingEndOfImage(usize),

    /// Segment length does not fit the 16-bit length field
    #[error("Segment length {0} does not fit a 16-bit length field")]
    SegmentTooLarge(usize),

    /// Segment smaller than its own header
    #[error("Segment length {0} is smaller than the 4-byte header")]
    SegmentTooSmall(usize),

    /// Binary read/write error
    #[error("Binary parsing error: {0}")]
    BinRead(String),

    /// IO error during parsing or building
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<binrw::Error> for JfifError {
    fn from(e: binrw::Error) -> Self {
        // Keep typed errors raised inside custom BinRead impls
        match e {
            binrw::Error::Custom { err, .. } => match err.downcast::<Self>() {
                Ok(inner) => *inner,
                Err(other) => Self::BinRead(format!("{other:?}")),
            },
            other => Self::BinRead(other.to_string()),
        }
    }
}

/// Result type alias for JFIF operations
pub type Result<T> = std::result::Result<T, JfifError>;
