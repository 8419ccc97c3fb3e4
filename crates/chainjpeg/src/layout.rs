//! On-disk layout of a chain run.
//!
//! ```text
//! <root>/collisions/<color>/
//! ├── original/<digit:x>/          split segments of each source image
//! ├── prefixes/nibble-NN.bin       shared prefix for a nibble
//! └── chains/nibble-NN/
//!     ├── part-01/ .. part-16/     per-part artifacts
//!     └── jpegs/<digit:x>.jpeg     final outputs
//! ```
//!
//! Artifacts are named by pipeline stage so a stopped run can be inspected
//! or resumed from any part.

use crate::part::Stage;
use std::path::{Path, PathBuf};

/// Persisted intermediate file of a part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// Input prefix of the part
    StartingPrefix,
    /// Comment padding the prefix to 7 mod 64
    PaddingComment,
    /// Oracle input
    CollisionPrefix,
    /// First oracle output as returned
    RawHalfA,
    /// Second oracle output as returned
    RawHalfB,
    /// First oracle output after filling
    FilledHalfA,
    /// Second oracle output after filling
    FilledHalfB,
    /// Segments of the source image for this part
    ImageBody,
    /// Comment hiding the image body
    BodyComment,
    /// Branch continuing the chain
    ShortVariant,
    /// Branch showing this part's image
    LongVariant,
    /// Terminal blob of part 16
    Final,
}

impl Artifact {
    /// File name inside the part directory
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::StartingPrefix => "01-starting-prefix",
            Self::PaddingComment => "02-padding-comment",
            Self::CollisionPrefix => "03-collision-prefix",
            Self::RawHalfA => "04-collision-a",
            Self::RawHalfB => "04-collision-b",
            Self::FilledHalfA => "05-collision-a-filled",
            Self::FilledHalfB => "05-collision-b-filled",
            Self::ImageBody => "06-image-body",
            Self::BodyComment => "07-body-comment",
            Self::ShortVariant => "08-short",
            Self::LongVariant => "08-long",
            Self::Final => "09-final",
        }
    }

    /// Stage that produces this artifact
    pub const fn stage(self) -> Stage {
        match self {
            Self::StartingPrefix => Stage::StartingPrefix,
            Self::PaddingComment => Stage::PaddingComment,
            Self::CollisionPrefix => Stage::CollisionPrefix,
            Self::RawHalfA | Self::RawHalfB => Stage::Oracle,
            Self::FilledHalfA | Self::FilledHalfB => Stage::HalfFill,
            Self::ImageBody => Stage::ImageBody,
            Self::BodyComment => Stage::BodyComment,
            Self::ShortVariant | Self::LongVariant => Stage::Variants,
            Self::Final => Stage::Final,
        }
    }
}

/// Paths of one colour scheme and nibble
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    color: String,
    nibble: u8,
}

impl Layout {
    /// Layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>, color: impl Into<String>, nibble: u8) -> Self {
        Self {
            root: root.into(),
            color: color.into(),
            nibble,
        }
    }

    /// Project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Nibble index
    pub const fn nibble(&self) -> u8 {
        self.nibble
    }

    /// Directory of the colour scheme
    pub fn color_dir(&self) -> PathBuf {
        self.root.join("collisions").join(&self.color)
    }

    /// Parent of all split source images
    pub fn originals_dir(&self) -> PathBuf {
        self.color_dir().join("original")
    }

    /// Split segments of the source image for `digit`
    pub fn original_dir(&self, digit: usize) -> PathBuf {
        self.originals_dir().join(format!("{digit:x}"))
    }

    /// Shared prefix blob for this nibble
    pub fn shared_prefix(&self) -> PathBuf {
        self.color_dir()
            .join("prefixes")
            .join(format!("nibble-{:02}.bin", self.nibble))
    }

    /// Working directory of this nibble
    pub fn nibble_dir(&self) -> PathBuf {
        self.color_dir()
            .join("chains")
            .join(format!("nibble-{:02}", self.nibble))
    }

    /// Working directory of a part
    pub fn part_dir(&self, part: usize) -> PathBuf {
        self.nibble_dir().join(format!("part-{part:02}"))
    }

    /// Path of a part artifact
    pub fn artifact(&self, part: usize, artifact: Artifact) -> PathBuf {
        self.part_dir(part).join(artifact.file_name())
    }

    /// Directory receiving the final JPEGs
    pub fn jpegs_dir(&self) -> PathBuf {
        self.nibble_dir().join("jpegs")
    }

    /// Output JPEG for `digit`
    pub fn output_jpeg(&self, digit: usize) -> PathBuf {
        self.jpegs_dir().join(format!("{digit:x}.jpeg"))
    }
}
