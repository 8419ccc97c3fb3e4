//! Test utilities for building small synthetic JFIF streams
//!
//! The streams are structurally valid (every segment is well formed) but do
//! not decode to a meaningful picture.

/// Append a segment with a length field
pub fn push_segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    let len = u16::try_from(payload.len() + 2).expect("payload fits a segment");
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
}

/// APP0 JFIF header payload
pub fn app0_payload() -> Vec<u8> {
    let mut payload = b"JFIF\0".to_vec();
    payload.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    payload
}

/// Build a minimal baseline JPEG whose tables are seeded with `seed` and
/// whose scan carries `entropy` verbatim.
pub fn sample_jpeg(seed: u8, entropy: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    push_segment(&mut out, 0xE0, &app0_payload());

    let mut dqt = vec![0x00];
    dqt.extend(std::iter::repeat_n(seed, 64));
    push_segment(&mut out, 0xDB, &dqt);

    push_segment(
        &mut out,
        0xC0,
        &[0x08, 0x00, 0x08, 0x00, 0x08, 0x01, 0x01, 0x11, 0x00],
    );

    let mut dht = vec![0x00];
    dht.extend_from_slice(&[0x01; 1]);
    dht.extend_from_slice(&[0x00; 15]);
    dht.push(seed);
    push_segment(&mut out, 0xC4, &dht);

    push_segment(&mut out, 0xDA, &[0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
    out.extend_from_slice(entropy);

    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// Entropy data containing a stuffed 0xFF
pub const STUFFED_ENTROPY: [u8; 4] = [0x12, 0xFF, 0x00, 0x34];
