//! Comment segment builders
//!
//! Comment segments are the splicing tool: a reader skips a comment's
//! declared length without looking at the bytes, so a comment can pad a
//! stream to a byte boundary or hide whatever follows it.

use crate::jfif::error::{JfifError, Result};
use crate::jfif::header::{LENGTH_HEADER_SIZE, MARKER_SIZE, SegmentHeader};
use crate::jfif::marker::Marker;

fn comment_header(declared: usize) -> Result<Vec<u8>> {
    let length = u16::try_from(declared).map_err(|_| JfifError::SegmentTooLarge(declared))?;
    Ok(SegmentHeader::with_length(Marker::Com, length).to_bytes())
}

/// Self-contained comment occupying exactly `total_len` bytes
///
/// The declared length is `total_len - 2` and the body is zero filled.
pub fn padding_comment(total_len: usize) -> Result<Vec<u8>> {
    if total_len < LENGTH_HEADER_SIZE {
        return Err(JfifError::SegmentTooSmall(total_len));
    }
    let mut out = comment_header(total_len - MARKER_SIZE)?;
    out.resize(total_len, 0);
    Ok(out)
}

/// Comment of `reserved_len` bytes whose declared length also covers the
/// `covered_len` bytes written after it
///
/// The declared length is `covered_len + reserved_len - 2`.
pub fn spanning_comment(reserved_len: usize, covered_len: usize) -> Result<Vec<u8>> {
    if reserved_len < LENGTH_HEADER_SIZE {
        return Err(JfifError::SegmentTooSmall(reserved_len));
    }
    let mut out = comment_header(covered_len + reserved_len - MARKER_SIZE)?;
    out.resize(reserved_len, 0);
    Ok(out)
}
