//! Parsed JFIF segment

use crate::jfif::header::SegmentHeader;
use crate::jfif::marker::Marker;

/// One marker-delimited unit of a JFIF stream
///
/// The bytes are kept exactly as they appeared in the source: header,
/// declared payload and, for SOS only, the entropy-coded data that follows
/// the scan header. Writing the three parts back in order reproduces the
/// source bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment marker
    pub marker: Marker,
    /// Marker prefix, marker and (when present) length field
    pub header: Vec<u8>,
    /// Declared-length bytes after the length field
    pub payload: Vec<u8>,
    /// Entropy-coded scan data, `FF 00` stuffing included (SOS only)
    pub entropy_tail: Vec<u8>,
}

impl Segment {
    /// Create a segment from a decoded header and its payload
    pub fn new(header: &SegmentHeader, payload: Vec<u8>) -> Self {
        Self {
            marker: header.marker,
            header: header.to_bytes(),
            payload,
            entropy_tail: Vec::new(),
        }
    }

    /// Declared length from the header, if the marker carries one
    pub fn declared_length(&self) -> Option<u16> {
        if self.header.len() < 4 {
            return None;
        }
        Some(u16::from_be_bytes([self.header[2], self.header[3]]))
    }

    /// Whether this is a start-of-scan segment
    pub fn is_scan(&self) -> bool {
        self.marker == Marker::Sos
    }

    /// Header plus payload, without entropy data
    pub fn segment_len(&self) -> usize {
        self.header.len() + self.payload.len()
    }

    /// Total number of bytes this segment occupied in the source
    pub fn len(&self) -> usize {
        self.segment_len() + self.entropy_tail.len()
    }

    /// Whether the segment has no bytes at all
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Header and payload bytes, without entropy data
    pub fn segment_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.segment_len());
        out.extend_from_slice(&self.header);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Append the verbatim bytes of this segment to `out`
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.header);
        out.extend_from_slice(&self.payload);
        out.extend_from_slice(&self.entropy_tail);
    }

    /// Verbatim bytes of this segment
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        self.write_to(&mut out);
        out
    }
}
