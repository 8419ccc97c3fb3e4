//! Length arithmetic for chain parts.
//!
//! Every part lines its prefix up on fixed offsets inside a 64-byte digest
//! block before the oracle sees it. The constants below are contract values
//! found by experiment against the oracle, not derived from first principles:
//!
//! | constant | value | meaning |
//! |---|---|---|
//! | [`PADDED_RESIDUE`] | 7 | prefix + padding comment ends 7 bytes into a block |
//! | [`COLLISION_RESIDUE`] | 12 | prefix handed to the oracle ends 12 bytes into a block |
//! | [`RESERVED_COMMENT_LEN`] | 0x100 | declared length of the short comment opened by the trailer |
//! | [`HALF_FILL_LEN`] | 137 | `0x100 + 2 - 0x79`, where 0x79 bytes of that comment are already in the oracle output |

use crate::error::{ChainError, Result};
use chainjpeg_formats::jfif;

/// Digest block size
pub const BLOCK_SIZE: usize = 64;

/// Block offset reached by starting prefix plus padding comment
pub const PADDED_RESIDUE: usize = 7;

/// Block offset the oracle input must end on
pub const COLLISION_RESIDUE: usize = 12;

/// Smallest padding comment (marker plus length field)
pub const MIN_PADDING_LEN: usize = 4;

/// Opens a comment of declared length 0x100 whose first data byte is 0
pub const COLLISION_TRAILER: [u8; 5] = [0xFF, 0xFE, 0x01, 0x00, 0x00];

/// Zero bytes appended to both oracle halves
pub const HALF_FILL_LEN: usize = 137;

/// Size of the body comment, and of the comment the short half opens
pub const RESERVED_COMMENT_LEN: usize = 0x100;

/// Size of the padding comment for a starting prefix of `prefix_len` bytes
///
/// The result is at least [`MIN_PADDING_LEN`] and brings the total to
/// [`PADDED_RESIDUE`] mod [`BLOCK_SIZE`].
pub fn padding_len(prefix_len: usize) -> usize {
    let target = prefix_len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE + PADDED_RESIDUE;
    let len = target - prefix_len;
    if len >= MIN_PADDING_LEN {
        return len;
    }
    let target = (prefix_len + BLOCK_SIZE).div_ceil(BLOCK_SIZE) * BLOCK_SIZE + PADDED_RESIDUE;
    target - prefix_len
}

/// Padding comment for a starting prefix of `prefix_len` bytes
pub fn padding_comment(prefix_len: usize) -> Result<Vec<u8>> {
    Ok(jfif::padding_comment(padding_len(prefix_len))?)
}

/// Fail unless `len` is `residue` mod [`BLOCK_SIZE`]
pub fn check_alignment(len: usize, residue: usize) -> Result<()> {
    if len % BLOCK_SIZE != residue {
        return Err(ChainError::Misaligned { len, residue });
    }
    Ok(())
}

/// Oracle input: `starting_prefix ++ padding_comment ++ COLLISION_TRAILER`
pub fn collision_prefix(starting_prefix: &[u8], padding_comment: &[u8]) -> Result<Vec<u8>> {
    let mut out =
        Vec::with_capacity(starting_prefix.len() + padding_comment.len() + COLLISION_TRAILER.len());
    out.extend_from_slice(starting_prefix);
    out.extend_from_slice(padding_comment);
    check_alignment(out.len(), PADDED_RESIDUE)?;
    out.extend_from_slice(&COLLISION_TRAILER);
    check_alignment(out.len(), COLLISION_RESIDUE)?;
    Ok(out)
}

/// Extend an oracle half to the end of the short comment
pub fn fill_half(mut half: Vec<u8>) -> Vec<u8> {
    half.resize(half.len() + HALF_FILL_LEN, 0);
    half
}

/// Comment that hides an image body of `body_len` bytes
///
/// It occupies [`RESERVED_COMMENT_LEN`] bytes and declares
/// `body_len + RESERVED_COMMENT_LEN - 2`.
pub fn body_comment(body_len: usize) -> Result<Vec<u8>> {
    Ok(jfif::spanning_comment(RESERVED_COMMENT_LEN, body_len)?)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_padding_for_58_byte_prefix() {
        assert_eq!(padding_len(58), 13);
        assert_eq!((58 + 13) % BLOCK_SIZE, 7);
    }

    #[test]
    fn test_padding_for_61_byte_prefix() {
        assert_eq!(padding_len(61), 10);
    }

    #[test]
    fn test_padding_on_block_boundary() {
        assert_eq!(padding_len(0), 7);
        assert_eq!(padding_len(64), 7);
        assert_eq!(padding_len(128), 7);
    }

    #[test]
    fn test_padding_range_0_to_128() {
        for len in 0..=128 {
            let pad = padding_len(len);
            assert!(pad >= MIN_PADDING_LEN, "L={len} gave {pad}");
            assert_eq!((len + pad) % BLOCK_SIZE, PADDED_RESIDUE, "L={len}");
            assert!(pad < BLOCK_SIZE + PADDED_RESIDUE, "L={len} gave {pad}");
        }
    }

    #[test]
    fn test_padding_comment_declares_own_length() {
        let comment = padding_comment(58).unwrap();
        assert_eq!(comment.len(), 13);
        assert_eq!(&comment[..4], &[0xFF, 0xFE, 0x00, 11]);
        assert!(comment[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_collision_prefix_alignment() {
        for len in [0usize, 1, 58, 61, 63, 64, 65, 500] {
            let start = vec![0xAB; len];
            let comment = padding_comment(len).unwrap();
            let prefix = collision_prefix(&start, &comment).unwrap();
            assert_eq!(prefix.len() % BLOCK_SIZE, COLLISION_RESIDUE);
            assert!(prefix.ends_with(&COLLISION_TRAILER));
            assert!(prefix.starts_with(&start));
        }
    }

    #[test]
    fn test_collision_prefix_rejects_wrong_padding() {
        let start = vec![0u8; 58];
        let comment = jfif::padding_comment(12).unwrap();
        assert!(matches!(
            collision_prefix(&start, &comment),
            Err(ChainError::Misaligned { len: 70, residue: 7 })
        ));
    }

    #[test]
    fn test_fill_half() {
        let filled = fill_half(vec![1, 2, 3]);
        assert_eq!(filled.len(), 3 + HALF_FILL_LEN);
        assert_eq!(&filled[..3], &[1, 2, 3]);
        assert!(filled[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_body_comment_covers_body() {
        let comment = body_comment(1000).unwrap();
        assert_eq!(comment.len(), RESERVED_COMMENT_LEN);
        let declared = u16::from_be_bytes([comment[2], comment[3]]) as usize;
        assert_eq!(declared, 1000 + RESERVED_COMMENT_LEN - 2);
    }

    #[test]
    fn test_body_comment_too_large() {
        assert!(body_comment(0x10000).is_err());
    }

    proptest! {
        /// Padding always lands on the padded residue
        #[test]
        fn padding_alignment_holds(len in 0usize..1_000_000) {
            let pad = padding_len(len);
            prop_assert!(pad >= MIN_PADDING_LEN);
            prop_assert_eq!((len + pad) % BLOCK_SIZE, PADDED_RESIDUE);
        }
    }
}
