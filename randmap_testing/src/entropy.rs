//! A crude randomness check: a random byte stream must not be compressible.
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

/// Get the size of `bytes` compressed with gzip at the best compression level.
pub fn gzip_len(bytes: &[u8]) -> usize {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(bytes)
        .expect("Writing into memory must not fail");
    encoder
        .finish()
        .expect("Writing into memory must not fail")
        .len()
}
