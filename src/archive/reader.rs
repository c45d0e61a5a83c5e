//! Load a compressed archive and resolve its internal offsets on demand (C7).
//!
//! Per §9's Decision, offsets are never materialized as pointers: every
//! accessor resolves against the owned, decompressed buffer at call time.
use std::cell::RefCell;

use log::debug;

use crate::archive::spec::{ArchiveFeature, Blending, Shading};
use crate::archive::writer::{FLAG_RECORD_SIZE, HEADER_SIZE, MAGIC, SPEC_RECORD_SIZE};
use crate::compress;
use crate::engine::{MaterialBuilder, MaterialHandle};
use crate::error::ArchiveError;

/// A loaded, relocated archive. Owns the decompressed buffer; every view
/// borrows from it.
pub struct ArchiveReader {
    buffer: Vec<u8>,
    specs_count: u32,
    specs_offset: u64,
    material_cache: RefCell<Vec<Option<MaterialHandle>>>,
}

impl ArchiveReader {
    /// Decompress `compressed` and relocate its offsets (§4.7).
    pub fn load(compressed: &[u8]) -> Result<Self, ArchiveError> {
        let expected_size = compress::decompressed_size(compressed).map_err(|e| ArchiveError::CorruptArchive {
            reason: format!("could not determine decompressed size: {e}"),
        })?;
        let buffer = compress::decompress(compressed, expected_size).map_err(|e| ArchiveError::CorruptArchive {
            reason: format!("failed to decompress archive: {e}"),
        })?;

        if buffer.len() < HEADER_SIZE as usize {
            return Err(ArchiveError::CorruptArchive {
                reason: format!("archive shorter than its {HEADER_SIZE}-byte header"),
            });
        }
        if &buffer[0..4] != MAGIC {
            return Err(ArchiveError::CorruptArchive {
                reason: "bad magic".to_string(),
            });
        }
        let specs_count = u32::from_le_bytes(buffer[8..12].try_into().unwrap());
        let specs_offset = u64::from_le_bytes(buffer[12..20].try_into().unwrap());
        if specs_offset % 8 != 0 {
            return Err(ArchiveError::AlignmentAssertion {
                what: "specs_offset",
                offset: specs_offset,
            });
        }

        debug!("loaded archive: {} bytes, {specs_count} specs", buffer.len());

        let material_cache = RefCell::new(vec![None; specs_count as usize]);
        Ok(Self {
            buffer,
            specs_count,
            specs_offset,
            material_cache,
        })
    }

    pub fn specs_count(&self) -> u32 {
        self.specs_count
    }

    /// Resolve `specs[index]`, validating the invariants from §8.
    pub fn spec(&self, index: u32) -> Result<ArchiveSpecView<'_>, ArchiveError> {
        if index >= self.specs_count {
            return Err(ArchiveError::CorruptArchive {
                reason: format!("spec index {index} out of range (specs_count={})", self.specs_count),
            });
        }

        let offset = self.specs_offset as usize + index as usize * SPEC_RECORD_SIZE as usize;
        let entry = self
            .buffer
            .get(offset..offset + SPEC_RECORD_SIZE as usize)
            .ok_or_else(|| ArchiveError::CorruptArchive {
                reason: format!("spec record {index} runs past archive end"),
            })?;

        let shading = Shading::from_wire(u32::from_le_bytes(entry[0..4].try_into().unwrap()));
        let blending = Blending::from_wire(u32::from_le_bytes(entry[4..8].try_into().unwrap()));
        let flags_count = u32::from_le_bytes(entry[8..12].try_into().unwrap());
        let flags_offset = u64::from_le_bytes(entry[12..20].try_into().unwrap());
        let package_byte_count = u64::from_le_bytes(entry[20..28].try_into().unwrap());
        let package_offset = u64::from_le_bytes(entry[28..36].try_into().unwrap());

        if flags_offset % 8 != 0 {
            return Err(ArchiveError::AlignmentAssertion {
                what: "flags_offset",
                offset: flags_offset,
            });
        }

        let flags_end = flags_offset
            .checked_add(flags_count as u64 * FLAG_RECORD_SIZE as u64)
            .ok_or_else(|| ArchiveError::CorruptArchive {
                reason: format!("spec {index}: flags region overflows (flags_offset={flags_offset}, flags_count={flags_count})"),
            })?;
        if flags_end > self.buffer.len() as u64 {
            return Err(ArchiveError::CorruptArchive {
                reason: format!(
                    "spec {index}: flags region [{flags_offset}, {flags_end}) runs past archive end ({})",
                    self.buffer.len()
                ),
            });
        }

        let package_end = package_offset.checked_add(package_byte_count).ok_or_else(|| ArchiveError::CorruptArchive {
            reason: format!(
                "spec {index}: package region overflows (package_offset={package_offset}, package_byte_count={package_byte_count})"
            ),
        })?;
        if package_end > self.buffer.len() as u64 {
            return Err(ArchiveError::CorruptArchive {
                reason: format!(
                    "spec {index}: package region [{package_offset}, {package_end}) runs past archive end ({})",
                    self.buffer.len()
                ),
            });
        }

        Ok(ArchiveSpecView {
            buffer: &self.buffer,
            shading,
            blending,
            flags_count,
            flags_offset,
            package_byte_count,
            package_offset,
        })
    }

    pub fn specs(&self) -> Result<Vec<ArchiveSpecView<'_>>, ArchiveError> {
        (0..self.specs_count).map(|i| self.spec(i)).collect()
    }

    /// Build (or return the cached) material handle for `index`, via `builder`.
    pub fn material(&self, index: u32, builder: &dyn MaterialBuilder) -> Result<MaterialHandle, ArchiveError> {
        let spec = self.spec(index)?;
        if let Some(handle) = self.material_cache.borrow()[index as usize] {
            return Ok(handle);
        }
        let package = spec.package().to_vec();
        let handle = builder.build_material(&package);
        self.material_cache.borrow_mut()[index as usize] = Some(handle);
        Ok(handle)
    }
}

/// A resolved view over one archived spec. Every field is read on demand
/// against the reader's buffer; nothing is copied eagerly.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveSpecView<'a> {
    buffer: &'a [u8],
    pub shading: Option<Shading>,
    pub blending: Option<Blending>,
    flags_count: u32,
    flags_offset: u64,
    package_byte_count: u64,
    package_offset: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveFlagView<'a> {
    pub name: &'a str,
    pub value: ArchiveFeature,
}

impl<'a> ArchiveSpecView<'a> {
    /// `spec()` has already validated that the flags region fits the buffer;
    /// a per-flag `name_offset` is still arbitrary attacker-controlled data,
    /// so it is resolved defensively and falls back to an empty name rather
    /// than panicking.
    pub fn flags(&self) -> Vec<ArchiveFlagView<'a>> {
        let mut out = Vec::with_capacity(self.flags_count as usize);
        for i in 0..self.flags_count {
            let offset = self.flags_offset as usize + i as usize * FLAG_RECORD_SIZE as usize;
            let entry = &self.buffer[offset..offset + FLAG_RECORD_SIZE as usize];
            let name_offset = u64::from_le_bytes(entry[0..8].try_into().unwrap()) as usize;
            let value_raw = u64::from_le_bytes(entry[8..16].try_into().unwrap());

            let name = self
                .buffer
                .get(name_offset..)
                .map(|name_bytes| {
                    let nul = name_bytes.iter().position(|&b| b == 0).unwrap_or(name_bytes.len());
                    std::str::from_utf8(&name_bytes[..nul]).unwrap_or("")
                })
                .unwrap_or("");
            let value = ArchiveFeature::from_wire(value_raw).unwrap_or(ArchiveFeature::Unsupported);

            out.push(ArchiveFlagView { name, value });
        }
        out
    }

    pub fn flag(&self, name: &str) -> Option<ArchiveFeature> {
        self.flags().into_iter().find(|f| f.name == name).map(|f| f.value)
    }

    pub fn package(&self) -> &'a [u8] {
        let start = self.package_offset as usize;
        let end = start + self.package_byte_count as usize;
        &self.buffer[start..end]
    }
}
