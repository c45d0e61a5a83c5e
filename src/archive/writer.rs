//! Pack materials and their specs into a single compressed archive buffer (C8).
use log::debug;

use crate::archive::spec::{ArchiveFeature, Blending, MaterialEntry, Shading};
use crate::archive::specfile::{self, ParsedLine};
use crate::compress;
use crate::error::{ArchiveError, SpecFileError};

pub(crate) const MAGIC: &[u8; 4] = b"UBER";
pub(crate) const HEADER_SIZE: u64 = 32;
pub(crate) const SPEC_RECORD_SIZE: u64 = 36;
pub(crate) const FLAG_RECORD_SIZE: u64 = 16;

fn pad_to(buf: &mut Vec<u8>, align: usize) {
    while buf.len() % align != 0 {
        buf.push(0);
    }
}

/// Accumulates materials and emits a single compressed archive (§4.8).
#[derive(Debug, Default)]
pub struct ArchiveWriter {
    materials: Vec<MaterialEntry>,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_material(&mut self, entry: MaterialEntry) {
        self.materials.push(entry);
    }

    /// Build a [MaterialEntry] from `package_bytes` and the assignments parsed
    /// out of a spec-file's text, then add it.
    pub fn add_material_from_spec_file(
        &mut self,
        package_bytes: Vec<u8>,
        spec_file_name: &str,
        spec_file_text: &str,
    ) -> Result<(), SpecFileError> {
        let mut entry = MaterialEntry::new(package_bytes);
        for line in specfile::parse(spec_file_name, spec_file_text)? {
            match line {
                ParsedLine::BlendingMode(b) => entry.blending = Some(b),
                ParsedLine::ShadingModel(s) => entry.shading = Some(s),
                ParsedLine::Feature(name, value) => {
                    entry.flags.insert(name, value);
                }
            }
        }
        self.materials.push(entry);
        Ok(())
    }

    /// Serialize the accumulated materials into the uncompressed archive
    /// layout (§6), before the final compression pass.
    fn build_raw(&self) -> Vec<u8> {
        fn round_up_8(n: u64) -> u64 {
            (n + 7) & !7
        }

        let specs_count = self.materials.len() as u64;

        let specs_region_start = HEADER_SIZE;
        let specs_region_end = specs_region_start + specs_count * SPEC_RECORD_SIZE;
        let flags_region_start = round_up_8(specs_region_end);

        let total_flags: u64 = self.materials.iter().map(|m| m.flags.len() as u64).sum();
        let flags_region_end = flags_region_start + total_flags * FLAG_RECORD_SIZE;
        let names_region_start = round_up_8(flags_region_end);

        // Per-spec flags_offset and per-flag name_offset, computed ahead of
        // the actual write pass below.
        let mut flags_offsets = Vec::with_capacity(self.materials.len());
        let mut name_offsets: Vec<Vec<u64>> = Vec::with_capacity(self.materials.len());
        let mut running_flag = flags_region_start;
        let mut running_name = names_region_start;
        for material in &self.materials {
            flags_offsets.push(running_flag);
            running_flag += material.flags.len() as u64 * FLAG_RECORD_SIZE;

            let mut offsets = Vec::with_capacity(material.flags.len());
            for name in material.flags.keys() {
                offsets.push(running_name);
                running_name += name.len() as u64 + 1;
            }
            name_offsets.push(offsets);
        }

        let mut names_bytes = Vec::new();
        for material in &self.materials {
            for name in material.flags.keys() {
                names_bytes.extend_from_slice(name.as_bytes());
                names_bytes.push(0);
            }
        }
        let mut packages_region_start = names_region_start + names_bytes.len() as u64;
        while packages_region_start % 8 != 0 {
            packages_region_start += 1;
        }

        let mut package_offsets = Vec::with_capacity(self.materials.len());
        let mut running_package = packages_region_start;
        for material in &self.materials {
            package_offsets.push(running_package);
            running_package += material.package_bytes.len() as u64;
            while running_package % 8 != 0 {
                running_package += 1;
            }
        }

        let mut out = Vec::with_capacity(running_package as usize);

        // Header.
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&0u32.to_le_bytes()); // version
        out.extend_from_slice(&(specs_count as u32).to_le_bytes());
        out.extend_from_slice(&specs_region_start.to_le_bytes());
        out.resize(HEADER_SIZE as usize, 0);

        // Spec records.
        for (i, material) in self.materials.iter().enumerate() {
            out.extend_from_slice(&Shading::to_wire(material.shading).to_le_bytes());
            out.extend_from_slice(&Blending::to_wire(material.blending).to_le_bytes());
            out.extend_from_slice(&(material.flags.len() as u32).to_le_bytes());
            out.extend_from_slice(&flags_offsets[i].to_le_bytes());
            out.extend_from_slice(&(material.package_bytes.len() as u64).to_le_bytes());
            out.extend_from_slice(&package_offsets[i].to_le_bytes());
        }
        pad_to(&mut out, 8);
        debug_assert_eq!(out.len() as u64, flags_region_start);

        // Flag records.
        for (i, material) in self.materials.iter().enumerate() {
            for (idx, (_name, value)) in material.flags.iter().enumerate() {
                out.extend_from_slice(&name_offsets[i][idx].to_le_bytes());
                out.extend_from_slice(&value.to_wire().to_le_bytes());
            }
        }
        pad_to(&mut out, 8);
        debug_assert_eq!(out.len() as u64, names_region_start);

        out.extend_from_slice(&names_bytes);
        while (out.len() as u64) < packages_region_start {
            out.push(0);
        }
        debug_assert_eq!(out.len() as u64, packages_region_start);

        for material in &self.materials {
            out.extend_from_slice(&material.package_bytes);
            pad_to(&mut out, 8);
        }

        out
    }

    /// Compress the accumulated materials into a single archive buffer, at
    /// the codec's maximum level (§4.8 step 4).
    pub fn write(&self) -> Result<Vec<u8>, ArchiveError> {
        let raw = self.build_raw();
        debug!(
            "writing archive: {} materials, {} raw bytes",
            self.materials.len(),
            raw.len()
        );
        compress::compress(&raw).map_err(|e| ArchiveError::CorruptArchive {
            reason: format!("failed to compress archive: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::reader::ArchiveReader;
    use indexmap::IndexMap;

    #[test]
    fn round_trip_two_materials() {
        let mut writer = ArchiveWriter::new();

        let mut flags_a = IndexMap::new();
        flags_a.insert("hasBaseColorMap".to_string(), ArchiveFeature::Required);
        writer.add_material(MaterialEntry {
            package_bytes: b"package A".to_vec(),
            shading: Some(Shading::Lit),
            blending: Some(Blending::Opaque),
            flags: flags_a,
        });

        writer.add_material(MaterialEntry {
            package_bytes: b"package B".to_vec(),
            shading: None,
            blending: None,
            flags: IndexMap::new(),
        });

        let compressed = writer.write().unwrap();
        let reader = ArchiveReader::load(&compressed).unwrap();

        assert_eq!(reader.specs_count(), 2);
        let spec0 = reader.spec(0).unwrap();
        assert_eq!(spec0.shading, Some(Shading::Lit));
        assert_eq!(spec0.blending, Some(Blending::Opaque));
        let flags = spec0.flags();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].name, "hasBaseColorMap");
        assert_eq!(flags[0].value, ArchiveFeature::Required);
        assert_eq!(spec0.package(), b"package A");

        let spec1 = reader.spec(1).unwrap();
        assert_eq!(spec1.shading, None);
        assert_eq!(spec1.blending, None);
        assert_eq!(spec1.package(), b"package B");
    }
}
