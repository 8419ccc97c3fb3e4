//! Split a JPEG into one file per segment.

use crate::error::{ChainError, Result};
use crate::fsutil;
use crate::segments::{MAX_SEGMENTS, entropy_file_name, segment_file_name};
use chainjpeg_formats::ByteFormat;
use chainjpeg_formats::jfif::{self, JfifStream};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Write every segment of `data` to `out_dir`, returning the files written
///
/// The whole image is parsed and checked before anything is written, so a
/// malformed input or one with more than [`MAX_SEGMENTS`] segments leaves
/// `out_dir` untouched. Bytes after the end-of-image marker are not written.
pub fn split_jpeg(data: &[u8], out_dir: &Path) -> Result<Vec<PathBuf>> {
    let image = jfif::parse_image(data)?;
    if image.segments.len() > MAX_SEGMENTS {
        return Err(ChainError::TooManySegments {
            count: image.segments.len(),
            max: MAX_SEGMENTS,
        });
    }
    JfifStream::verify_round_trip(&data[..image.consumed])
        .map_err(|e| ChainError::RoundTrip(e.to_string()))?;

    let trailing = image.trailing_len(data.len());
    if trailing > 0 {
        warn!(trailing, "Ignoring bytes after end of image");
    }

    fsutil::create_dir_all(out_dir)?;
    let mut written = Vec::with_capacity(image.segments.len() + 1);
    for (index, segment) in image.segments.iter().enumerate() {
        let path = out_dir.join(segment_file_name(index, segment.marker));
        fsutil::write(&path, &segment.segment_bytes())?;
        written.push(path);

        if !segment.entropy_tail.is_empty() {
            let path = out_dir.join(entropy_file_name(index));
            fsutil::write(&path, &segment.entropy_tail)?;
            written.push(path);
        }
    }
    Ok(written)
}

/// [`split_jpeg`] on a file
pub fn split_file(input: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let data = fsutil::read(input)?;
    let written = split_jpeg(&data, out_dir)?;
    info!(
        input = %input.display(),
        output = %out_dir.display(),
        files = written.len(),
        "Split image"
    );
    Ok(written)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils::synthetic_jpeg;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_split_writes_one_file_per_segment() {
        let dir = TempDir::new().unwrap();
        let data = synthetic_jpeg(9);

        let written = split_jpeg(&data, dir.path()).unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![
            "00-soi",
            "01-app0",
            "02-dqt",
            "03-sof0",
            "04-dht",
            "05-sos",
            "05-sos-entropy",
            "06-eoi",
        ]);

        let mut joined = Vec::new();
        for path in &written {
            joined.extend(std::fs::read(path).unwrap());
        }
        assert_eq!(joined, data);
    }

    #[test]
    fn test_split_ignores_trailing_bytes() {
        let dir = TempDir::new().unwrap();
        let mut data = synthetic_jpeg(2);
        let len = data.len();
        data.extend_from_slice(b"trailer");

        let written = split_jpeg(&data, dir.path()).unwrap();
        let total: usize = written
            .iter()
            .map(|p| std::fs::read(p).unwrap().len())
            .sum();
        assert_eq!(total, len);
    }

    #[test]
    fn test_split_rejects_malformed_input_without_writing() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let data = [0xFF, 0xD8, 0xFF, 0x01, 0x00, 0x02];

        let err = split_jpeg(&data, &out).unwrap_err();
        assert!(matches!(err, ChainError::Format(_)));
        assert!(!out.exists());
    }

    /// SOI, `comments` empty comments, EOI
    fn comment_run(comments: usize) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        for _ in 0..comments {
            data.extend_from_slice(&[0xFF, 0xFE, 0x00, 0x02]);
        }
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn test_split_at_segment_limit() {
        let dir = TempDir::new().unwrap();
        let data = comment_run(MAX_SEGMENTS - 2);

        let written = split_jpeg(&data, dir.path()).unwrap();
        assert_eq!(written.len(), MAX_SEGMENTS);
        let last = written.last().unwrap().file_name().unwrap();
        assert_eq!(last.to_string_lossy(), "ff-eoi");

        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        names.sort();
        assert_eq!(names, written);
    }

    #[test]
    fn test_split_rejects_unsortable_segment_count() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let data = comment_run(MAX_SEGMENTS - 1);

        let err = split_jpeg(&data, &out).unwrap_err();
        assert!(matches!(
            err,
            ChainError::TooManySegments {
                count: 0x101,
                max: 0x100
            }
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_split_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("image.jpeg");
        std::fs::write(&input, synthetic_jpeg(1)).unwrap();

        let written = split_file(&input, &dir.path().join("segments")).unwrap();
        assert_eq!(written.len(), 8);
    }
}
