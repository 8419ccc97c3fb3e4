//! Output verification.
//!
//! With real collisions every `shared_prefix ++ output[d]` has the same MD5
//! digest, and every output parses as an image up to its end-of-image
//! marker.

use crate::error::{ChainError, Result};
use chainjpeg_formats::jfif;

/// Hex MD5 of `shared_prefix ++ output`
pub fn digest(shared_prefix: &[u8], output: &[u8]) -> String {
    let mut context = md5::Context::new();
    context.consume(shared_prefix);
    context.consume(output);
    hex::encode(context.compute().0)
}

/// Per-digit digests of a set of outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestReport {
    digests: Vec<String>,
}

impl DigestReport {
    /// Digest every output behind the shared prefix
    pub fn compute(shared_prefix: &[u8], outputs: &[Vec<u8>]) -> Self {
        Self {
            digests: outputs
                .iter()
                .map(|output| digest(shared_prefix, output))
                .collect(),
        }
    }

    /// Digests indexed by digit
    pub fn digests(&self) -> &[String] {
        &self.digests
    }

    /// Digits whose digest differs from digit 0
    pub fn mismatched(&self) -> Vec<usize> {
        let Some(first) = self.digests.first() else {
            return Vec::new();
        };
        self.digests
            .iter()
            .enumerate()
            .filter(|(_, d)| *d != first)
            .map(|(digit, _)| digit)
            .collect()
    }

    /// Whether every output has the same digest
    pub fn all_equal(&self) -> bool {
        self.mismatched().is_empty()
    }
}

/// Parse every output up to its end-of-image marker
pub fn check_structure(outputs: &[Vec<u8>]) -> Result<()> {
    for (digit, output) in outputs.iter().enumerate() {
        let image = jfif::parse_image(output)
            .map_err(|source| ChainError::InvalidOutput { digit, source })?;
        tracing::debug!(
            digit,
            segments = image.segments.len(),
            trailing = image.trailing_len(output.len()),
            "Output parses"
        );
    }
    Ok(())
}
