//! Whole-file view over a segment list

use crate::jfif::error::Result;
use crate::jfif::marker::Marker;
use crate::jfif::parser;
use crate::jfif::segment::Segment;

/// Ordered segments of a complete JFIF buffer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JfifStream {
    /// Segments in source order
    pub segments: Vec<Segment>,
}

impl JfifStream {
    /// Parse every segment of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(Self {
            segments: parser::parse(data)?,
        })
    }

    /// Write the segments back verbatim
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_len());
        for segment in &self.segments {
            segment.write_to(&mut out);
        }
        out
    }

    /// Sum of all segment spans
    pub fn total_len(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    /// Segments with the given marker
    pub fn by_marker(&self, marker: Marker) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(move |s| s.marker == marker)
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the stream holds no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl crate::ByteFormat for JfifStream {
    fn parse(data: &[u8]) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        Self::parse(data).map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
    }

    fn build(&self) -> std::result::Result<Vec<u8>, Box<dyn std::error::Error>> {
        Ok(self.build())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ByteFormat;
    use crate::test_utils::{STUFFED_ENTROPY, sample_jpeg};

    #[test]
    fn test_stream_round_trip() {
        let data = sample_jpeg(9, &STUFFED_ENTROPY);
        JfifStream::verify_round_trip(&data).expect("Round trip should hold");

        let stream = JfifStream::parse(&data).unwrap();
        assert_eq!(stream.total_len(), data.len());
        assert_eq!(stream.len(), 7);
        assert_eq!(stream.by_marker(Marker::Sos).count(), 1);
    }

    #[test]
    fn test_stream_rejects_bad_input() {
        assert!(<JfifStream as ByteFormat>::parse(&[0xFF]).is_err());
    }
}
