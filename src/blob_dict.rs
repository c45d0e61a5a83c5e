//! Ordered, append-only collection of SPIR-V blobs with content dedup (C2).
use indexmap::IndexMap;

use crate::compress;
use crate::error::PackageError;
use crate::hash::fnv1a;

/// Ordered sequence of byte blobs addressed by `u32` index.
///
/// [BlobDictionary::add] deduplicates by content: a byte-identical blob
/// reuses its existing index rather than appending a duplicate. The FNV hash
/// is only a pre-filter; a hash collision always falls back to `==`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobDictionary {
    blobs: Vec<Vec<u8>>,
    by_hash: IndexMap<u64, Vec<u32>>,
}

impl BlobDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blobs(blobs: Vec<Vec<u8>>) -> Self {
        let mut dict = Self::new();
        for blob in blobs {
            dict.add_no_dedup(blob);
        }
        dict
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&[u8]> {
        self.blobs.get(index as usize).map(Vec::as_slice)
    }

    /// Insert `bytes`, reusing an existing index if an identical blob is
    /// already present.
    pub fn add(&mut self, bytes: &[u8]) -> u32 {
        let hash = fnv1a(bytes);
        if let Some(candidates) = self.by_hash.get(&hash) {
            for &index in candidates {
                if self.blobs[index as usize] == bytes {
                    return index;
                }
            }
        }
        self.add_no_dedup(bytes.to_vec())
    }

    /// Insert `bytes` unconditionally, for raw ingest where dedup is
    /// explicitly disabled (see [crate::rewrite::RewriteConfig::disable_dedup]).
    pub fn add_no_dedup(&mut self, bytes: Vec<u8>) -> u32 {
        let hash = fnv1a(&bytes);
        let index = self.blobs.len() as u32;
        self.blobs.push(bytes);
        self.by_hash.entry(hash).or_default().push(index);
        index
    }

    /// Encode as a `DictionarySpirv` chunk payload: a `count: u32 LE` header,
    /// an index of `(offset, compressed_size, decompressed_size)` triples,
    /// then the concatenated compressed blobs, each 4-byte aligned.
    pub fn encode(&self) -> Result<Vec<u8>, compress::CodecError> {
        let mut compressed_blobs = Vec::with_capacity(self.blobs.len());
        for blob in &self.blobs {
            compressed_blobs.push(compress::compress_blob(blob)?);
        }

        let header_len = 4 + self.blobs.len() * 12;
        let mut index = Vec::with_capacity(header_len);
        let mut data = Vec::new();

        for (blob, compressed) in self.blobs.iter().zip(&compressed_blobs) {
            while data.len() % 4 != 0 {
                data.push(0);
            }
            let offset = data.len() as u32;
            index.extend_from_slice(&offset.to_le_bytes());
            index.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
            index.extend_from_slice(&(blob.len() as u32).to_le_bytes());
            data.extend_from_slice(compressed);
        }

        let mut out = Vec::with_capacity(4 + index.len() + data.len());
        out.extend_from_slice(&(self.blobs.len() as u32).to_le_bytes());
        out.extend_from_slice(&index);
        out.extend_from_slice(&data);
        Ok(out)
    }

    /// Decode a `DictionarySpirv` chunk payload, decompressing every blob.
    pub fn decode(payload: &[u8]) -> Result<Self, PackageError> {
        let internal = |reason: String| PackageError::InternalEncodingError { reason };

        if payload.len() < 4 {
            return Err(internal("DictionarySpirv payload shorter than its count field".into()));
        }
        let count = u32::from_le_bytes(payload[0..4].try_into().unwrap()) as usize;

        let index_start = 4;
        let index_len = count * 12;
        let index_end = index_start
            .checked_add(index_len)
            .filter(|&end| end <= payload.len())
            .ok_or_else(|| internal("DictionarySpirv index table runs past payload end".into()))?;

        let data = &payload[index_end..];
        let mut dict = Self::new();

        for i in 0..count {
            let entry = &payload[index_start + i * 12..index_start + i * 12 + 12];
            let offset = u32::from_le_bytes(entry[0..4].try_into().unwrap()) as usize;
            let compressed_size = u32::from_le_bytes(entry[4..8].try_into().unwrap()) as usize;
            let decompressed_size = u32::from_le_bytes(entry[8..12].try_into().unwrap()) as usize;

            let compressed = data
                .get(offset..offset + compressed_size)
                .ok_or_else(|| internal(format!("blob {i} compressed range runs past payload end")))?;

            let blob = compress::decompress_blob(compressed, decompressed_size)
                .map_err(|e| internal(format!("blob {i} failed to decompress: {e}")))?;
            dict.add_no_dedup(blob);
        }

        Ok(dict)
    }
}
