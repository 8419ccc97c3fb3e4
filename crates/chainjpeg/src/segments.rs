//! Split segment files and image body assembly.
//!
//! A source image is stored as one file per segment, named
//! `{index:02x}-{marker}` so that listing order equals capture order. The
//! entropy data of a scan goes to `{index:02x}-sos-entropy`, which sorts
//! straight after its scan header. Two hex digits name at most
//! [`MAX_SEGMENTS`] segments; past that the names stop sorting in capture
//! order, so splitting a larger image is an error.

use crate::error::{ChainError, Result};
use crate::fsutil;
use chainjpeg_formats::jfif::Marker;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Segment files the chain supplies itself (start of image, JFIF header)
pub const LEADING_SEGMENT_FILES: [&str; 2] = ["00-soi", "01-app0"];

/// Non-segment files kept next to the split segments
pub const SIDECAR_FILES: [&str; 2] = ["image.jpeg", "image.xcf"];

/// Segments a split image may have while its file names still sort
pub const MAX_SEGMENTS: usize = 0x100;

/// File name of segment `index`
pub fn segment_file_name(index: usize, marker: Marker) -> String {
    format!("{index:02x}-{}", marker.slug())
}

/// File name of the entropy data following scan segment `index`
pub fn entropy_file_name(index: usize) -> String {
    format!("{index:02x}-{}-entropy", Marker::Sos.slug())
}

fn is_excluded(name: &str) -> bool {
    LEADING_SEGMENT_FILES.contains(&name) || SIDECAR_FILES.contains(&name)
}

/// Provides the segment bytes of the source image for each digit
pub trait BodySource {
    /// Every segment except the leading ones, in capture order
    fn image_body(&self, digit: usize) -> Result<Vec<u8>>;

    /// Start-of-image and JFIF header segments
    fn leading_segments(&self, digit: usize) -> Result<Vec<u8>>;

    /// [`Self::image_body`], also written to `artifact`
    fn persist_image_body(&self, digit: usize, artifact: &Path) -> Result<Vec<u8>> {
        let body = self.image_body(digit)?;
        fsutil::write(artifact, &body)?;
        Ok(body)
    }
}

/// Reads split source images from `original/<digit:x>/`
#[derive(Debug, Clone)]
pub struct SegmentAssembler {
    originals: PathBuf,
}

impl SegmentAssembler {
    /// Assembler over the directory holding one subdirectory per digit
    pub fn new(originals: impl Into<PathBuf>) -> Self {
        Self {
            originals: originals.into(),
        }
    }

    /// Directory of the source image for `digit`
    pub fn source_dir(&self, digit: usize) -> PathBuf {
        self.originals.join(format!("{digit:x}"))
    }

    /// Concatenate the segment files of `dir` in name order, skipping the
    /// leading segments and sidecars
    pub fn assemble(dir: &Path) -> Result<Vec<u8>> {
        fsutil::require(dir)?;

        let mut body = Vec::new();
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir).to_path_buf();
                ChainError::io(path, std::io::Error::from(e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if is_excluded(&name) {
                continue;
            }
            let data = fsutil::read(entry.path())?;
            debug!(file = %name, size = data.len(), "Appending segment file");
            body.extend_from_slice(&data);
        }
        Ok(body)
    }

    /// [`Self::assemble`], persisting the result to `artifact`
    pub fn assemble_to(dir: &Path, artifact: &Path) -> Result<Vec<u8>> {
        let body = Self::assemble(dir)?;
        fsutil::write(artifact, &body)?;
        Ok(body)
    }
}

impl BodySource for SegmentAssembler {
    fn image_body(&self, digit: usize) -> Result<Vec<u8>> {
        Self::assemble(&self.source_dir(digit))
    }

    fn leading_segments(&self, digit: usize) -> Result<Vec<u8>> {
        let dir = self.source_dir(digit);
        let mut out = Vec::new();
        for name in LEADING_SEGMENT_FILES {
            out.extend(fsutil::read(&dir.join(name))?);
        }
        Ok(out)
    }

    fn persist_image_body(&self, digit: usize, artifact: &Path) -> Result<Vec<u8>> {
        Self::assemble_to(&self.source_dir(digit), artifact)
    }
}
