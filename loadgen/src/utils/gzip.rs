//! gzip (de)compression of request payloads.
//!
//! The load generator compresses every batch before it hits the wire,
//! the mock log sink inflates them again.

use std::io::{Read as _, Write as _};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};

pub fn compress(payload: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(payload.len() / 4), Compression::default());
    encoder.write_all(payload)?;
    encoder.finish()
}

pub fn decompress(payload: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(payload);
    let mut out = Vec::with_capacity(payload.len() * 4);
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
