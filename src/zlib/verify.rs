use std::io::Read;

use flate2::read::ZlibDecoder;

use super::adler32::adler32;
use crate::error::{Error, Result};

/// Decode `compressed` with an independent inflater and check it reproduces
/// `original` (length first, then Adler-32)
pub fn verify(compressed: &[u8], original: &[u8]) -> Result<()> {
    let mut decoded = Vec::with_capacity(original.len());
    ZlibDecoder::new(compressed)
        .read_to_end(&mut decoded)
        .map_err(|e| Error::Decode(e.to_string()))?;

    if decoded.len() != original.len() {
        return Err(Error::SizeMismatch {
            expected: original.len() as u64,
            found: decoded.len() as u64,
        });
    }

    let expected = adler32(original);
    let found = adler32(&decoded);
    if expected != found || decoded != original {
        return Err(Error::ChecksumMismatch { expected, found });
    }

    Ok(())
}
