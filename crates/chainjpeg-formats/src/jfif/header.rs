//! Fixed-position segment header
//!
//! Every segment starts with `0xFF` followed by the marker byte. All markers
//! except SOI and EOI are followed by a big-endian 16-bit length that counts
//! itself plus the payload, but not the two marker bytes:
//!
//! ```text
//! FF <marker> [<len hi> <len lo>] <payload: len - 2 bytes>
//! ```

use crate::jfif::error::{JfifError, Result};
use crate::jfif::marker::{MARKER_PREFIX, Marker};
use binrw::{BinRead, BinResult, BinWrite};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

/// Size of the marker prefix and marker byte
pub const MARKER_SIZE: usize = 2;

/// Size of a header carrying a length field
pub const LENGTH_HEADER_SIZE: usize = 4;

/// Segment header: marker and optional declared length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    /// Segment marker
    pub marker: Marker,
    /// Declared length (absent for SOI/EOI)
    pub length: Option<u16>,
}

impl SegmentHeader {
    /// Header for a marker without payload (SOI, EOI)
    pub const fn standalone(marker: Marker) -> Self {
        Self {
            marker,
            length: None,
        }
    }

    /// Header with a declared length
    pub const fn with_length(marker: Marker, length: u16) -> Self {
        Self {
            marker,
            length: Some(length),
        }
    }

    /// Encoded size of the header itself
    pub const fn header_size(&self) -> usize {
        match self.length {
            Some(_) => LENGTH_HEADER_SIZE,
            None => MARKER_SIZE,
        }
    }

    /// Number of payload bytes following the header
    pub fn payload_len(&self) -> usize {
        self.length
            .map_or(0, |len| (len as usize).saturating_sub(2))
    }

    /// Total span of header plus declared payload
    pub fn span(&self) -> usize {
        self.header_size() + self.payload_len()
    }

    /// Encode the header to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header_size());
        out.push(MARKER_PREFIX);
        out.push(self.marker.to_byte());
        if let Some(len) = self.length {
            out.extend_from_slice(&len.to_be_bytes());
        }
        out
    }

    /// Validate that the declared length is usable
    pub fn validate(&self, offset: usize) -> Result<()> {
        if self.marker.has_length() != self.length.is_some() {
            return Err(JfifError::BinRead(format!(
                "{} header at offset 0x{offset:x} has inconsistent length field",
                self.marker
            )));
        }
        if let Some(length) = self.length
            && length < 2
        {
            return Err(JfifError::InvalidLength { offset, length });
        }
        Ok(())
    }
}

fn custom_error(pos: u64, err: JfifError) -> binrw::Error {
    binrw::Error::Custom {
        pos,
        err: Box::new(err),
    }
}

fn remaining<R: Seek>(reader: &mut R, offset: u64) -> std::io::Result<usize> {
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(offset))?;
    Ok(end.saturating_sub(offset) as usize)
}

fn read_header_bytes<R: Read + Seek>(
    reader: &mut R,
    buf: &mut [u8],
    start: u64,
    expected: usize,
) -> BinResult<()> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            let actual = remaining(reader, start)?;
            Err(custom_error(
                start,
                JfifError::TruncatedData {
                    offset: start as usize,
                    expected,
                    actual,
                },
            ))
        }
        Err(e) => Err(e.into()),
    }
}

impl BinRead for SegmentHeader {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        _endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let start = reader.stream_position()?;

        let mut marker_bytes = [0u8; MARKER_SIZE];
        read_header_bytes(reader, &mut marker_bytes, start, MARKER_SIZE)?;

        if marker_bytes[0] != MARKER_PREFIX {
            return Err(custom_error(
                start,
                JfifError::MissingMarkerPrefix {
                    offset: start as usize,
                    found: marker_bytes[0],
                },
            ));
        }

        let marker = Marker::try_from(marker_bytes[1]).map_err(|_| {
            custom_error(
                start + 1,
                JfifError::UnknownMarker {
                    marker: marker_bytes[1],
                    offset: start as usize + 1,
                },
            )
        })?;

        if !marker.has_length() {
            return Ok(Self::standalone(marker));
        }

        let mut length_bytes = [0u8; 2];
        read_header_bytes(reader, &mut length_bytes, start, LENGTH_HEADER_SIZE)?;
        let length = u16::from_be_bytes(length_bytes);

        let header = Self::with_length(marker, length);
        header
            .validate(start as usize)
            .map_err(|e| custom_error(start, e))?;
        Ok(header)
    }
}

impl BinWrite for SegmentHeader {
    type Args<'a> = ();

    fn write_options<W: Write + Seek>(
        &self,
        writer: &mut W,
        _endian: binrw::Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }
}
