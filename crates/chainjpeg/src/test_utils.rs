//! Synthetic source images and stub oracles for unit tests

use crate::error::OracleError;
use crate::oracle::{CollisionOracle, CollisionPair};
use crate::split::split_jpeg;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;

fn push_segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    let len = u16::try_from(payload.len() + 2).expect("payload fits a segment");
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
}

/// Small well-formed JPEG whose tables and scan depend on `seed`
pub fn synthetic_jpeg(seed: u8) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    push_segment(
        &mut out,
        0xE0,
        b"JFIF\0\x01\x01\x00\x00\x01\x00\x01\x00\x00",
    );
    let mut dqt = vec![0x00];
    dqt.extend(std::iter::repeat_n(seed, 64));
    push_segment(&mut out, 0xDB, &dqt);
    push_segment(&mut out, 0xC0, &[0x08, 0x00, 0x10, 0x00, 0x10, 0x01, 0x01, 0x11, 0x00]);
    let mut dht = vec![0x00, 0x01];
    dht.extend_from_slice(&[0x00; 15]);
    dht.push(seed);
    push_segment(&mut out, 0xC4, &dht);
    push_segment(&mut out, 0xDA, &[0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
    out.extend_from_slice(&[seed, 0xFF, 0x00, seed.wrapping_add(1), 0x42]);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// Split a synthetic image for `digit` into `dir`
pub fn write_source(dir: &Path, digit: usize) {
    let seed = u8::try_from(digit).expect("digit fits a byte") + 1;
    split_jpeg(&synthetic_jpeg(seed), dir).expect("split synthetic image");
}

/// Halves shaped like real oracle output: the prefix plus 116 bytes, the
/// second half bumping the trailer's declared length to 0x200
pub fn structured_pair(prefix: &[u8]) -> CollisionPair {
    let mut a = prefix.to_vec();
    a.resize(prefix.len() + 116, 0);
    let mut b = a.clone();
    let n = prefix.len();
    b[n - 3] = 0x02;
    CollisionPair::new(a, b).expect("equal halves")
}

/// Oracle answering with [`structured_pair`] after a scripted run of failures
///
/// Every call leaves an `attempt-<n>` file in the work directory.
#[derive(Debug, Default)]
pub struct StubOracle {
    failures: Mutex<Vec<OracleError>>,
    calls: Mutex<Vec<usize>>,
}

impl StubOracle {
    /// Oracle that fails with `failures` (in order) before succeeding
    pub fn failing(failures: Vec<OracleError>) -> Self {
        let mut failures = failures;
        failures.reverse();
        Self {
            failures: Mutex::new(failures),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Prefix lengths seen, one per call
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl CollisionOracle for StubOracle {
    async fn collide(&self, workdir: &Path, prefix: &[u8]) -> Result<CollisionPair, OracleError> {
        let attempt = {
            let mut calls = self.calls.lock().expect("lock");
            calls.push(prefix.len());
            calls.len() - 1
        };
        std::fs::write(workdir.join(format!("attempt-{attempt}")), b"scratch")
            .expect("write scratch");
        if let Some(err) = self.failures.lock().expect("lock").pop() {
            return Err(err);
        }
        Ok(structured_pair(prefix))
    }
}
