//! JFIF segment markers
//!
//! Only the markers found in baseline JFIF files are accepted. For a marker
//! reference see <https://en.wikipedia.org/wiki/JPEG#Syntax_and_structure>.

use crate::jfif::error::JfifError;

/// Byte that precedes every marker
pub const MARKER_PREFIX: u8 = 0xFF;

/// Segment marker (the byte following 0xFF)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Marker {
    /// Start Of Image
    Soi = 0xD8,
    /// Application segment 0 (JFIF header)
    App0 = 0xE0,
    /// Define Quantization Table
    Dqt = 0xDB,
    /// Start Of Frame, baseline DCT
    Sof0 = 0xC0,
    /// Define Huffman Table
    Dht = 0xC4,
    /// Start Of Scan
    Sos = 0xDA,
    /// End Of Image
    Eoi = 0xD9,
    /// Comment
    Com = 0xFE,
}

impl Marker {
    /// Marker byte value
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Human readable segment name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Soi => "Start Of Image",
            Self::App0 => "Application0",
            Self::Dqt => "Define Quantization Table",
            Self::Sof0 => "Start Of Frame",
            Self::Dht => "Define Huffman Table",
            Self::Sos => "Start Of Scan",
            Self::Eoi => "End Of Image",
            Self::Com => "Comment",
        }
    }

    /// Short lowercase tag, used in file names
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Soi => "soi",
            Self::App0 => "app0",
            Self::Dqt => "dqt",
            Self::Sof0 => "sof0",
            Self::Dht => "dht",
            Self::Sos => "sos",
            Self::Eoi => "eoi",
            Self::Com => "com",
        }
    }

    /// Whether a 16-bit length field follows the marker
    pub const fn has_length(self) -> bool {
        !matches!(self, Self::Soi | Self::Eoi)
    }
}

impl TryFrom<u8> for Marker {
    type Error = JfifError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0xD8 => Ok(Self::Soi),
            0xE0 => Ok(Self::App0),
            0xDB => Ok(Self::Dqt),
            0xC0 => Ok(Self::Sof0),
            0xC4 => Ok(Self::Dht),
            0xDA => Ok(Self::Sos),
            0xD9 => Ok(Self::Eoi),
            0xFE => Ok(Self::Com),
            marker => Err(JfifError::UnknownMarker { marker, offset: 0 }),
        }
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
