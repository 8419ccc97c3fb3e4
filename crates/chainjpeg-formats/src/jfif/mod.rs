//! JFIF segment parsing and building
//!
//! A JFIF file is a sequence of segments, each introduced by `0xFF` and a
//! marker byte. Most segments carry a big-endian 16-bit length right after
//! the marker; SOI and EOI carry nothing. The scan header (SOS) is followed
//! by entropy-coded data that runs until the next `0xFF` not followed by
//! `0x00`.
//!
//! # Format Overview
//!
//! ```text
//! FF D8                          SOI
//! FF E0 <len> <payload>          APP0
//! FF DB <len> <payload>          DQT
//! FF C0 <len> <payload>          SOF0
//! FF C4 <len> <payload>          DHT
//! FF DA <len> <payload> <data>   SOS + entropy-coded data
//! FF D9                          EOI
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use chainjpeg_formats::jfif::{self, JfifStream, Marker};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("image.jpeg")?;
//!
//! // Lazy walk
//! for segment in jfif::SegmentParser::new(&data) {
//!     let segment = segment?;
//!     println!("{} ({} bytes)", segment.marker, segment.len());
//! }
//!
//! // Whole stream
//! let stream = JfifStream::parse(&data)?;
//! assert_eq!(stream.build(), data);
//! assert_eq!(stream.by_marker(Marker::Soi).count(), 1);
//! # Ok(())
//! # }
//! ```

pub mod comment;
pub mod error;
pub mod header;
pub mod marker;
pub mod parser;
pub mod segment;
pub mod stream;

// Re-export main types
pub use comment::{padding_comment, spanning_comment};
pub use error::{JfifError, Result};
pub use header::SegmentHeader;
pub use marker::{MARKER_PREFIX, Marker};
pub use parser::{ParsedImage, SegmentParser, parse, parse_image};
pub use segment::Segment;
pub use stream::JfifStream;
