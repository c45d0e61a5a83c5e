//! Material packages: a [ChunkContainer] holding at most one dictionary chunk
//! and one material chunk, indexed by [ShaderKey].
use crate::chunk::{ChunkContainer, ChunkTag};
use crate::error::PackageError;
use crate::spirv_shader::SpirvShaderChunk;
use crate::text_shader::TextShaderChunk;

/// `(model, variant, stage)`, uniquely identifying a shader record within a
/// material package. `variant` is an opaque caller-assigned byte; keys are
/// not required to be sorted within a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct ShaderKey {
    pub model: u8,
    pub variant: u8,
    pub stage: u8,
}

impl ShaderKey {
    pub fn new(model: u8, variant: u8, stage: u8) -> Self {
        Self {
            model,
            variant,
            stage,
        }
    }
}

/// The shader backend a package targets, determined by which material chunk
/// is present (§4.6 step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Glsl,
    Metal,
    Spirv,
}

impl Backend {
    pub fn material_tag(self) -> ChunkTag {
        match self {
            Backend::Glsl => ChunkTag::MATERIAL_GLSL,
            Backend::Metal => ChunkTag::MATERIAL_METAL,
            Backend::Spirv => ChunkTag::MATERIAL_SPIRV,
        }
    }

    pub fn dictionary_tag(self) -> ChunkTag {
        match self {
            Backend::Glsl | Backend::Metal => ChunkTag::DICTIONARY_TEXT,
            Backend::Spirv => ChunkTag::DICTIONARY_SPIRV,
        }
    }
}

/// Determine the backend a package targets from the chunks it contains.
pub fn detect_backend(container: &ChunkContainer) -> Result<Backend, PackageError> {
    if container.has(ChunkTag::MATERIAL_SPIRV) {
        Ok(Backend::Spirv)
    } else if container.has(ChunkTag::MATERIAL_GLSL) {
        Ok(Backend::Glsl)
    } else if container.has(ChunkTag::MATERIAL_METAL) {
        Ok(Backend::Metal)
    } else {
        Err(PackageError::UnsupportedBackend)
    }
}

/// An owning, parsed material package.
///
/// Holds the raw bytes and re-derives a borrowing [ChunkContainer] on demand,
/// which sidesteps a self-referential struct while keeping the "owns its
/// buffer, borrows slices from it" ownership model from the data model.
#[derive(Debug, Clone)]
pub struct MaterialPackage {
    bytes: Vec<u8>,
}

impl MaterialPackage {
    /// Parse `bytes` as a [ChunkContainer] and validate it is a well-formed
    /// material package (§3: known-shape dictionary/material chunks, no
    /// dangling indices, no duplicate keys).
    pub fn parse(bytes: Vec<u8>) -> Result<Self, PackageError> {
        let package = Self { bytes };
        package.validate()?;
        Ok(package)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn container(&self) -> ChunkContainer<'_> {
        // Safe to unwrap: validated in `parse` and packages are otherwise
        // only constructed by the rewriter from known-good chunk streams.
        ChunkContainer::parse(&self.bytes).expect("MaterialPackage invariant: bytes parse as a chunk container")
    }

    pub fn backend(&self) -> Result<Backend, PackageError> {
        detect_backend(&self.container())
    }

    fn validate(&self) -> Result<(), PackageError> {
        let container = ChunkContainer::parse(&self.bytes)?;
        let backend = detect_backend(&container)?;

        match backend {
            Backend::Glsl | Backend::Metal => {
                let dict_payload = container
                    .payload(ChunkTag::DICTIONARY_TEXT)
                    .unwrap_or(&[0, 0, 0, 0]);
                let dict = crate::string_dict::StringDictionary::decode(dict_payload)?;
                let mat_payload = container.payload(backend.material_tag()).unwrap();
                let chunk = TextShaderChunk::decode(mat_payload)?;

                let mut seen = std::collections::HashSet::new();
                for record in &chunk.records {
                    if !seen.insert(record.key) {
                        return Err(PackageError::DuplicateShaderKey {
                            model: record.key.model,
                            variant: record.key.variant,
                            stage: record.key.stage,
                        });
                    }
                    for &index in &record.line_indices {
                        if index as usize >= dict.len() {
                            return Err(PackageError::LineIndexOutOfRange {
                                index,
                                size: dict.len(),
                            });
                        }
                    }
                }
            }
            Backend::Spirv => {
                let dict_payload = container
                    .payload(ChunkTag::DICTIONARY_SPIRV)
                    .unwrap_or(&[0, 0, 0, 0]);
                let dict = crate::blob_dict::BlobDictionary::decode(dict_payload)?;
                let mat_payload = container.payload(ChunkTag::MATERIAL_SPIRV).unwrap();
                let chunk = SpirvShaderChunk::decode(mat_payload)?;

                let mut seen = std::collections::HashSet::new();
                for record in &chunk.records {
                    if !seen.insert(record.key) {
                        return Err(PackageError::DuplicateShaderKey {
                            model: record.key.model,
                            variant: record.key.variant,
                            stage: record.key.stage,
                        });
                    }
                    if record.blob_index as usize >= dict.len() {
                        return Err(PackageError::BlobIndexOutOfRange {
                            index: record.blob_index,
                            size: dict.len(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}
