//! Final output assembly.
//!
//! Output 0 is the terminal blob with the shared prefix stripped. Output
//! `d` for `d` in 1..=15 is the stripped long branch of part `d`, padded
//! out with the remainder of output 0 so every output has the same length
//! and the same trailing bytes.

use crate::error::{ChainError, Result};
use crate::fsutil;
use crate::layout::{Artifact, Layout};
use crate::part::FINAL_PART;
use std::path::PathBuf;
use tracing::info;

/// Number of output images, one per hex digit
pub const OUTPUT_COUNT: usize = 16;

fn strip(data: &[u8], shared_prefix_len: usize, digit: usize) -> Result<&[u8]> {
    data.get(shared_prefix_len..)
        .ok_or(ChainError::PrefixTooLong {
            digit,
            prefix_len: shared_prefix_len,
            data_len: data.len(),
        })
}

/// Build the sixteen outputs
///
/// `long_variants[i]` is the long branch of part `i + 1` and becomes output
/// `i + 1`.
pub fn assemble_outputs(
    final_blob: &[u8],
    shared_prefix_len: usize,
    long_variants: &[Vec<u8>],
) -> Result<Vec<Vec<u8>>> {
    if long_variants.len() != OUTPUT_COUNT - 1 {
        return Err(ChainError::VariantCount {
            expected: OUTPUT_COUNT - 1,
            actual: long_variants.len(),
        });
    }

    let tail = strip(final_blob, shared_prefix_len, 0)?;
    let mut outputs = Vec::with_capacity(OUTPUT_COUNT);
    outputs.push(tail.to_vec());

    for (i, long) in long_variants.iter().enumerate() {
        let digit = i + 1;
        let stripped = strip(long, shared_prefix_len, digit)?;
        if stripped.len() > tail.len() {
            return Err(ChainError::StitchOverflow {
                digit,
                stripped: stripped.len(),
                tail: tail.len(),
            });
        }
        let mut output = Vec::with_capacity(tail.len());
        output.extend_from_slice(stripped);
        output.extend_from_slice(&tail[stripped.len()..]);
        outputs.push(output);
    }
    Ok(outputs)
}

/// Loads persisted parts and writes the output JPEGs
#[derive(Debug, Clone)]
pub struct VariantAssembler {
    layout: Layout,
}

impl VariantAssembler {
    /// Assembler over `layout`
    pub const fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// Assemble outputs from the persisted artifacts without writing them
    pub fn load(&self) -> Result<Vec<Vec<u8>>> {
        let shared_prefix_len = fsutil::file_len(&self.layout.shared_prefix())?;
        let final_blob = fsutil::read(&self.layout.artifact(FINAL_PART, Artifact::Final))?;
        let long_variants = (1..FINAL_PART)
            .map(|part| fsutil::read(&self.layout.artifact(part, Artifact::LongVariant)))
            .collect::<Result<Vec<_>>>()?;
        assemble_outputs(&final_blob, shared_prefix_len, &long_variants)
    }

    /// Write `jpegs/{digit:x}.jpeg` for every digit
    pub fn write_all(&self) -> Result<Vec<PathBuf>> {
        let outputs = self.load()?;
        let mut written = Vec::with_capacity(outputs.len());
        for (digit, output) in outputs.iter().enumerate() {
            let path = self.layout.output_jpeg(digit);
            fsutil::write(&path, output)?;
            written.push(path);
        }
        info!(
            dir = %self.layout.jpegs_dir().display(),
            count = written.len(),
            "Wrote output images"
        );
        Ok(written)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn longs(len: usize) -> Vec<Vec<u8>> {
        (1..OUTPUT_COUNT)
            .map(|d| {
                let mut v = b"SP".to_vec();
                v.extend(std::iter::repeat_n(d as u8, len));
                v
            })
            .collect()
    }

    #[test]
    fn test_stitching() {
        let final_blob = b"SPabcdefgh".to_vec();
        let outputs = assemble_outputs(&final_blob, 2, &longs(3)).unwrap();

        assert_eq!(outputs.len(), OUTPUT_COUNT);
        assert_eq!(outputs[0], b"abcdefgh");
        assert_eq!(outputs[1], [1, 1, 1, b'd', b'e', b'f', b'g', b'h']);
        assert_eq!(outputs[15], [15, 15, 15, b'd', b'e', b'f', b'g', b'h']);
        assert!(outputs.iter().all(|o| o.len() == 8));
    }

    #[test]
    fn test_branch_longer_than_tail_is_fatal() {
        let final_blob = b"SPab".to_vec();
        let err = assemble_outputs(&final_blob, 2, &longs(3)).unwrap_err();
        assert!(matches!(
            err,
            ChainError::StitchOverflow {
                digit: 1,
                stripped: 3,
                tail: 2
            }
        ));
    }

    #[test]
    fn test_variant_count() {
        let err = assemble_outputs(b"SPab", 2, &longs(1)[..14]).unwrap_err();
        assert!(matches!(
            err,
            ChainError::VariantCount {
                expected: 15,
                actual: 14
            }
        ));
    }

    #[test]
    fn test_prefix_longer_than_input() {
        let err = assemble_outputs(b"S", 2, &longs(1)).unwrap_err();
        assert!(matches!(err, ChainError::PrefixTooLong { digit: 0, .. }));
    }

    #[test]
    fn test_write_all_requires_artifacts() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path(), "test", 1);
        fsutil::write(&layout.shared_prefix(), b"SP").unwrap();

        let err = VariantAssembler::new(layout.clone()).write_all().unwrap_err();
        assert!(matches!(
            err,
            ChainError::MissingArtifact(path) if path == layout.artifact(FINAL_PART, Artifact::Final)
        ));
    }

    #[test]
    fn test_write_all() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path(), "test", 1);
        fsutil::write(&layout.shared_prefix(), b"SP").unwrap();
        fsutil::write(&layout.artifact(FINAL_PART, Artifact::Final), b"SPabcdefgh").unwrap();
        for (i, long) in longs(4).iter().enumerate() {
            fsutil::write(&layout.artifact(i + 1, Artifact::LongVariant), long).unwrap();
        }

        let written = VariantAssembler::new(layout.clone()).write_all().unwrap();
        assert_eq!(written.len(), OUTPUT_COUNT);
        assert_eq!(std::fs::read(layout.output_jpeg(0)).unwrap(), b"abcdefgh");
        assert_eq!(
            std::fs::read(layout.output_jpeg(10)).unwrap(),
            [10, 10, 10, 10, b'e', b'f', b'g', b'h']
        );
    }

    proptest! {
        /// Every output keeps its own head and the shared tail
        #[test]
        fn outputs_share_length_and_tail(
            tail in proptest::collection::vec(any::<u8>(), 16..64),
            head_len in 0usize..16,
        ) {
            let mut final_blob = b"SP".to_vec();
            final_blob.extend_from_slice(&tail);
            let outputs = assemble_outputs(&final_blob, 2, &longs(head_len)).unwrap();
            for (digit, output) in outputs.iter().enumerate().skip(1) {
                prop_assert_eq!(output.len(), tail.len());
                prop_assert!(output[..head_len].iter().all(|&b| b as usize == digit));
                prop_assert_eq!(&output[head_len..], &tail[head_len..]);
            }
        }
    }
}
