//! One step of the sixteen-part chain.
//!
//! A part is built in two halves around the oracle call: [`PreparedPart`]
//! holds everything derived before the call, [`PreparedPart::complete`]
//! turns an oracle answer into a finished [`ChainPart`].

use crate::error::{ChainError, OracleError, Result};
use crate::oracle::CollisionPair;
use crate::padding;
use std::fmt;

/// Number of parts in a chain
pub const PART_COUNT: usize = 16;

/// Index of the terminal part
pub const FINAL_PART: usize = PART_COUNT;

/// Pipeline stage, used to label errors and artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Loading the starting prefix
    StartingPrefix,
    /// Sizing the padding comment
    PaddingComment,
    /// Assembling the oracle input
    CollisionPrefix,
    /// Waiting on the oracle
    Oracle,
    /// Filling the oracle halves
    HalfFill,
    /// Assembling the source image body
    ImageBody,
    /// Sizing the body comment
    BodyComment,
    /// Writing short and long branches
    Variants,
    /// Terminal part
    Final,
}

impl Stage {
    /// Kebab-case label
    pub const fn label(self) -> &'static str {
        match self {
            Self::StartingPrefix => "starting-prefix",
            Self::PaddingComment => "padding-comment",
            Self::CollisionPrefix => "collision-prefix",
            Self::Oracle => "oracle",
            Self::HalfFill => "half-fill",
            Self::ImageBody => "image-body",
            Self::BodyComment => "body-comment",
            Self::Variants => "variants",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fail unless `index` names a part that calls the oracle
pub fn check_branch_index(index: usize) -> Result<()> {
    if (1..FINAL_PART).contains(&index) {
        Ok(())
    } else {
        Err(ChainError::InvalidPart(index))
    }
}

/// Part state before the oracle call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPart {
    /// Part index, 1..=15
    pub index: usize,
    /// Bytes the part extends
    pub starting_prefix: Vec<u8>,
    /// Comment aligning the prefix to 7 mod 64
    pub padding_comment: Vec<u8>,
    /// Oracle input, 12 mod 64 bytes long
    pub collision_prefix: Vec<u8>,
}

impl PreparedPart {
    /// Derive padding and oracle input for part `index`
    pub fn new(index: usize, starting_prefix: Vec<u8>) -> Result<Self> {
        check_branch_index(index)?;

        let padding_comment = padding::padding_comment(starting_prefix.len())
            .map_err(|e| e.at(index, Stage::PaddingComment))?;
        let collision_prefix = padding::collision_prefix(&starting_prefix, &padding_comment)
            .map_err(|e| e.at(index, Stage::CollisionPrefix))?;

        Ok(Self {
            index,
            starting_prefix,
            padding_comment,
            collision_prefix,
        })
    }

    /// Build the part from an oracle answer and the part's image body
    pub fn complete(self, pair: CollisionPair, image_body: Vec<u8>) -> Result<ChainPart> {
        let index = self.index;
        let prefix_len = self.collision_prefix.len();
        if pair.len() < prefix_len {
            return Err(ChainError::from(OracleError::Truncated {
                len: pair.len(),
                prefix_len,
            })
            .at(index, Stage::Oracle));
        }

        let (half_a, half_b) = pair.into_halves();
        let filled_a = padding::fill_half(half_a.clone());
        let filled_b = padding::fill_half(half_b.clone());

        let body_comment =
            padding::body_comment(image_body.len()).map_err(|e| e.at(index, Stage::BodyComment))?;

        let short_variant = concat(&[&filled_a, &body_comment, &image_body]);
        let long_variant = concat(&[&filled_b, &body_comment, &image_body]);

        Ok(ChainPart {
            index,
            starting_prefix: self.starting_prefix,
            padding_comment: self.padding_comment,
            collision_prefix: self.collision_prefix,
            half_a,
            half_b,
            filled_a,
            filled_b,
            image_body,
            body_comment,
            short_variant,
            long_variant,
        })
    }
}

/// Every artifact of a finished part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainPart {
    /// Part index, 1..=15
    pub index: usize,
    /// Bytes the part extends
    pub starting_prefix: Vec<u8>,
    /// Comment aligning the prefix to 7 mod 64
    pub padding_comment: Vec<u8>,
    /// Oracle input
    pub collision_prefix: Vec<u8>,
    /// First oracle half as returned
    pub half_a: Vec<u8>,
    /// Second oracle half as returned
    pub half_b: Vec<u8>,
    /// First half with fill appended
    pub filled_a: Vec<u8>,
    /// Second half with fill appended
    pub filled_b: Vec<u8>,
    /// Source image segments for this part
    pub image_body: Vec<u8>,
    /// Comment covering `image_body`
    pub body_comment: Vec<u8>,
    /// `filled_a ++ body_comment ++ image_body`, next part's prefix
    pub short_variant: Vec<u8>,
    /// `filled_b ++ body_comment ++ image_body`
    pub long_variant: Vec<u8>,
}

impl ChainPart {
    /// Bytes the filled halves add on top of the oracle input
    pub fn fill_growth(&self) -> usize {
        self.filled_a.len() - self.collision_prefix.len()
    }
}

/// Product of building one part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartOutcome {
    /// Parts 1..=15
    Branch {
        /// Prefix of the next part
        short: Vec<u8>,
        /// Head of one output image
        long: Vec<u8>,
    },
    /// Part 16
    Final(Vec<u8>),
}

impl From<&ChainPart> for PartOutcome {
    fn from(part: &ChainPart) -> Self {
        Self::Branch {
            short: part.short_variant.clone(),
            long: part.long_variant.clone(),
        }
    }
}

/// Terminal blob: `starting_prefix ++ image_body`
pub fn final_blob(starting_prefix: &[u8], image_body: &[u8]) -> Vec<u8> {
    concat(&[starting_prefix, image_body])
}

fn concat(pieces: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pieces.iter().map(|p| p.len()).sum());
    for piece in pieces {
        out.extend_from_slice(piece);
    }
    out
}
