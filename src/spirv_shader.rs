//! Encode/decode a `MaterialSpirv` chunk of records referencing blob indices
//! in a [BlobDictionary](crate::blob_dict::BlobDictionary) (C5).
use crate::error::PackageError;
use crate::package::ShaderKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct SpirvShaderRecord {
    pub key: ShaderKey,
    pub blob_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpirvShaderChunk {
    pub records: Vec<SpirvShaderRecord>,
}

impl SpirvShaderChunk {
    /// Decode a `MaterialSpirv` chunk payload: `record_count: u64`, then
    /// `record_count` fixed `(model, variant, stage, blob_index)` tuples.
    pub fn decode(payload: &[u8]) -> Result<Self, PackageError> {
        let internal = |reason: String| PackageError::InternalEncodingError { reason };

        if payload.len() < 8 {
            return Err(internal("material chunk shorter than its record_count header".into()));
        }
        let record_count = u64::from_le_bytes(payload[0..8].try_into().unwrap()) as usize;

        let entry_size = 7;
        let entries_end = 8
            .checked_add(record_count * entry_size)
            .filter(|&end| end <= payload.len())
            .ok_or_else(|| internal("material chunk record region runs past payload end".into()))?;

        let mut records = Vec::with_capacity(record_count);
        for i in 0..record_count {
            let entry = &payload[8 + i * entry_size..8 + i * entry_size + entry_size];
            records.push(SpirvShaderRecord {
                key: ShaderKey::new(entry[0], entry[1], entry[2]),
                blob_index: u32::from_le_bytes(entry[3..7].try_into().unwrap()),
            });
        }
        debug_assert_eq!(entries_end, 8 + record_count * entry_size);

        Ok(Self { records })
    }

    /// Encode into a `MaterialSpirv` chunk payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + self.records.len() * 7);
        out.extend_from_slice(&(self.records.len() as u64).to_le_bytes());
        for record in &self.records {
            out.push(record.key.model);
            out.push(record.key.variant);
            out.push(record.key.stage);
            out.extend_from_slice(&record.blob_index.to_le_bytes());
        }
        out
    }
}
