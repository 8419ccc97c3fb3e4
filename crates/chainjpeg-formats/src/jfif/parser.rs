//! Segment walker
//!
//! The parser keeps a cursor into the input. At each step it decodes a
//! [`SegmentHeader`], copies the declared payload and, for SOS, scans the
//! entropy-coded data byte by byte:
//!
//! - a byte other than `0xFF` belongs to the scan data
//! - `FF 00` is a stuffed `0xFF` and both bytes belong to the scan data
//! - `FF xx` for any other `xx` is the start of the next segment
//!
//! Stuffing is not removed.

use crate::jfif::error::{JfifError, Result};
use crate::jfif::header::SegmentHeader;
use crate::jfif::marker::{MARKER_PREFIX, Marker};
use crate::jfif::segment::Segment;
use binrw::BinRead;
use binrw::io::Cursor;

/// Smallest buffer that can hold a JPEG
pub const MIN_JPEG_SIZE: usize = 4;

/// Lazy, fused iterator over the segments of a buffer
///
/// Yields segments in source order. After the first error no further items
/// are produced.
#[derive(Debug)]
pub struct SegmentParser<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> SegmentParser<'a> {
    /// Start walking `data` from offset 0
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            failed: false,
        }
    }

    /// Offset of the next segment to be read
    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_segment(&mut self) -> Result<Segment> {
        let offset = self.pos;
        let mut cursor = Cursor::new(self.data);
        cursor.set_position(offset as u64);

        let header = SegmentHeader::read_options(&mut cursor, binrw::Endian::Big, ())?;

        let span = header.span();
        let available = self.data.len() - offset;
        if span > available {
            return Err(JfifError::TruncatedData {
                offset,
                expected: span,
                actual: available,
            });
        }

        let payload_start = offset + header.header_size();
        let end = offset + span;
        let mut segment = Segment::new(&header, self.data[payload_start..end].to_vec());

        let mut next = end;
        if segment.is_scan() {
            next = entropy_end(self.data, end)?;
            segment.entropy_tail = self.data[end..next].to_vec();
        }

        tracing::trace!(
            segment = header.marker.name(),
            len = segment.len(),
            offset,
            "identified segment"
        );

        self.pos = next;
        Ok(segment)
    }
}

impl Iterator for SegmentParser<'_> {
    type Item = Result<Segment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }
        let result = self.read_segment();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

impl std::iter::FusedIterator for SegmentParser<'_> {}

/// Find where the entropy-coded data starting at `start` ends
fn entropy_end(data: &[u8], start: usize) -> Result<usize> {
    let truncated = |pos: usize| JfifError::TruncatedData {
        offset: start,
        expected: pos - start + 2,
        actual: data.len() - start,
    };

    let mut pos = start;
    loop {
        match data.get(pos) {
            None => return Err(truncated(pos)),
            Some(&byte) if byte != MARKER_PREFIX => pos += 1,
            Some(_) => match data.get(pos + 1) {
                Some(0x00) => pos += 2,
                Some(_) => return Ok(pos),
                None => return Err(truncated(pos)),
            },
        }
    }
}

fn check_min_size(data: &[u8]) -> Result<()> {
    if data.len() < MIN_JPEG_SIZE {
        return Err(JfifError::TooShort(data.len()));
    }
    Ok(())
}

/// Parse the whole buffer into segments
pub fn parse(data: &[u8]) -> Result<Vec<Segment>> {
    check_min_size(data)?;
    SegmentParser::new(data).collect()
}

/// Segments a viewer would read, up to and including end-of-image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedImage {
    /// Segments from start of buffer through the first EOI
    pub segments: Vec<Segment>,
    /// Number of bytes covered by `segments`
    pub consumed: usize,
}

impl ParsedImage {
    /// Bytes following the end-of-image marker in the source buffer
    pub fn trailing_len(&self, total: usize) -> usize {
        total.saturating_sub(self.consumed)
    }
}

/// Parse segments until the first end-of-image marker
///
/// Bytes after the marker are not inspected, so trailing data that is not
/// valid JFIF does not cause an error.
pub fn parse_image(data: &[u8]) -> Result<ParsedImage> {
    check_min_size(data)?;

    let mut segments = Vec::new();
    let mut consumed = 0;
    for segment in SegmentParser::new(data) {
        let segment = segment?;
        consumed += segment.len();
        let is_end = segment.marker == Marker::Eoi;
        segments.push(segment);
        if is_end {
            return Ok(ParsedImage { segments, consumed });
        }
    }

    Err(JfifError::MissingEndOfImage(data.len()))
}
