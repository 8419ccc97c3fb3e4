//! Byte-exact JFIF segment parsing and building
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::doc_markdown)] // JFIF terms don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
//! This crate splits JPEG/JFIF byte streams into their marker-delimited
//! segments and writes them back verbatim. It is not a decoder: it only
//! identifies segment boundaries, which is enough to cut a file into pieces
//! and splice those pieces into other files losslessly.
//!
//! # Supported Markers
//!
//! - **SOI / EOI**: start and end of image (header only)
//! - **APP0**: JFIF application data
//! - **DQT / DHT**: quantization and Huffman tables
//! - **SOF0**: baseline frame header
//! - **SOS**: start of scan, followed by entropy-coded data
//! - **COM**: comment
//!
//! Any other marker is rejected.
//!
//! # Design Principles
//!
//! - **Owned Segments**: every parsed segment owns its bytes
//! - **Verbatim Output**: segments are never re-encoded, stuffing is kept
//! - **Round-Trip Guarantee**: build(parse(data)) == data

#![warn(missing_docs)]

/// JFIF segment parser, stream type and comment-segment builders
///
/// Key features:
/// - **Lazy Parsing**: [`jfif::SegmentParser`] yields segments one at a time
/// - **Scan Handling**: entropy-coded data after SOS is captured with its
///   `FF 00` stuffing intact
/// - **Decoder View**: [`jfif::parse_image`] stops at the first end-of-image
///   marker, the way a viewer does
/// - **Comment Builders**: padding and spanning comments for splicing
///
/// See the [`jfif`] module for usage examples.
pub mod jfif;

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod test_utils;

/// Common format trait for symmetric parse/build types
pub trait ByteFormat: Sized {
    /// Parse from bytes
    fn parse(data: &[u8]) -> Result<Self, Box<dyn std::error::Error>>;

    /// Build to bytes
    fn build(&self) -> Result<Vec<u8>, Box<dyn std::error::Error>>;

    /// Verify round-trip correctness
    fn verify_round_trip(data: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
        let parsed = Self::parse(data)?;
        let rebuilt = parsed.build()?;
        if data != rebuilt.as_slice() {
            return Err("Round-trip verification failed".into());
        }
        Ok(())
    }
}
