//! Replace a single shader record in a material package, copying every other
//! chunk through bit-exact (C6, §4.6).
use log::debug;

use crate::blob_dict::BlobDictionary;
use crate::chunk::{write_chunk, ChunkContainer, ChunkTag};
use crate::compiler::ShaderCompiler;
use crate::error::PackageError;
use crate::package::{detect_backend, Backend, ShaderKey};
use crate::spirv_shader::SpirvShaderChunk;
use crate::string_dict::StringDictionary;
use crate::text_shader::{TextShaderChunk, TextShaderRecord};

/// Caller-supplied collaborators for a rewrite (§10.3).
pub struct RewriteConfig {
    pub compiler: Box<dyn ShaderCompiler>,
    /// Skip content-dedup when inserting the replacement SPIR-V blob, for
    /// tests exercising raw ingest.
    pub disable_dedup: bool,
}

/// Replace the record at `(model, variant, stage)` in `package_bytes` with
/// `new_source`, returning a freshly serialized package.
///
/// `new_source` is GLSL/MSL source text for the text backends, or GLSL source
/// to be compiled to SPIR-V for the SPIR-V backend.
pub fn rewrite(
    package_bytes: &[u8],
    model: u8,
    variant: u8,
    stage: u8,
    new_source: &[u8],
    config: &RewriteConfig,
) -> Result<Vec<u8>, PackageError> {
    let container = ChunkContainer::parse(package_bytes)?;
    let backend = detect_backend(&container)?;
    let target = ShaderKey::new(model, variant, stage);

    debug!("rewriting {:?} shader {:?}", backend, target);

    let dict_tag = backend.dictionary_tag();
    let mat_tag = backend.material_tag();

    let (dict_payload, mat_payload) = match backend {
        Backend::Glsl | Backend::Metal => {
            rewrite_text(&container, mat_tag, target, new_source)?
        }
        Backend::Spirv => rewrite_spirv(&container, target, stage, model, new_source, config)?,
    };

    let mut out = Vec::with_capacity(package_bytes.len() + dict_payload.len() + mat_payload.len());
    for (tag, payload) in container.chunks() {
        if tag == dict_tag || tag == mat_tag {
            continue;
        }
        write_chunk(&mut out, tag, payload);
    }
    write_chunk(&mut out, dict_tag, &dict_payload);
    write_chunk(&mut out, mat_tag, &mat_payload);

    Ok(out)
}

fn rewrite_text(
    container: &ChunkContainer,
    mat_tag: ChunkTag,
    target: ShaderKey,
    new_source: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), PackageError> {
    let old_dict_payload = container.payload(ChunkTag::DICTIONARY_TEXT).unwrap_or(&[0, 0, 0, 0]);
    let old_dict = StringDictionary::decode(old_dict_payload)?;

    let mat_payload = container
        .payload(mat_tag)
        .expect("backend detection guarantees the material chunk is present");
    let chunk = TextShaderChunk::decode(mat_payload)?;
    let mut records = chunk.decode_all_text(&old_dict)?;

    let pos = records
        .iter()
        .position(|r| r.key == target)
        .ok_or(PackageError::NoSuchShader {
            model: target.model,
            variant: target.variant,
            stage: target.stage,
        })?;

    let new_text = String::from_utf8(new_source.to_vec()).map_err(|e| PackageError::InternalEncodingError {
        reason: format!("replacement source is not valid UTF-8: {e}"),
    })?;
    records[pos] = TextShaderRecord {
        key: target,
        text: new_text,
    };

    let mut new_dict = StringDictionary::new();
    let new_mat_payload = TextShaderChunk::from_records(records).encode_with_dictionary(&mut new_dict)?;

    Ok((new_dict.encode(), new_mat_payload))
}

fn rewrite_spirv(
    container: &ChunkContainer,
    target: ShaderKey,
    stage: u8,
    model: u8,
    new_source: &[u8],
    config: &RewriteConfig,
) -> Result<(Vec<u8>, Vec<u8>), PackageError> {
    let old_dict_payload = container.payload(ChunkTag::DICTIONARY_SPIRV).unwrap_or(&[0, 0, 0, 0]);
    let old_dict = BlobDictionary::decode(old_dict_payload)?;

    let mat_payload = container
        .payload(ChunkTag::MATERIAL_SPIRV)
        .expect("backend detection guarantees the material chunk is present");
    let mut chunk = SpirvShaderChunk::decode(mat_payload)?;

    let pos = chunk
        .records
        .iter()
        .position(|r| r.key == target)
        .ok_or(PackageError::NoSuchShader {
            model: target.model,
            variant: target.variant,
            stage: target.stage,
        })?;

    let compiled = config
        .compiler
        .compile(new_source, stage, model)
        .map_err(|diagnostic| PackageError::CompileError {
            diagnostic: diagnostic.to_string(),
        })?;

    let mut new_dict = old_dict;
    let new_index = if config.disable_dedup {
        new_dict.add_no_dedup(compiled)
    } else {
        new_dict.add(&compiled)
    };
    chunk.records[pos].blob_index = new_index;

    let new_dict_payload = new_dict
        .encode()
        .map_err(|e| PackageError::InternalEncodingError {
            reason: format!("failed to compress SPIR-V dictionary: {e}"),
        })?;

    Ok((new_dict_payload, chunk.encode()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::write_chunk;
    use crate::compiler::NullCompiler;
    use crate::package::MaterialPackage;
    use crate::spirv_shader::SpirvShaderRecord;

    fn config() -> RewriteConfig {
        RewriteConfig {
            compiler: Box::new(NullCompiler),
            disable_dedup: false,
        }
    }

    #[test]
    fn text_rewrite_replaces_one_record_and_drops_unused_lines() {
        let key = ShaderKey::new(1, 7, 0);
        let mut dict = StringDictionary::new();
        let mat_payload = TextShaderChunk::from_records(vec![TextShaderRecord {
            key,
            text: "#version 310 es\nvoid main(){}\n".to_string(),
        }])
        .encode_with_dictionary(&mut dict)
        .unwrap();

        let mut bytes = Vec::new();
        write_chunk(&mut bytes, ChunkTag::DICTIONARY_TEXT, &dict.encode());
        write_chunk(&mut bytes, ChunkTag::MATERIAL_GLSL, &mat_payload);

        let new_bytes = rewrite(
            &bytes,
            1,
            7,
            0,
            b"void main(){ gl_Position=vec4(0); }",
            &config(),
        )
        .unwrap();

        let package = MaterialPackage::parse(new_bytes).unwrap();
        let container = package.container();
        let new_dict = StringDictionary::decode(container.payload(ChunkTag::DICTIONARY_TEXT).unwrap()).unwrap();
        let chunk = TextShaderChunk::decode(container.payload(ChunkTag::MATERIAL_GLSL).unwrap()).unwrap();
        let records = chunk.decode_all_text(&new_dict).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "void main(){ gl_Position=vec4(0); }\n");
        assert_eq!(new_dict.len(), 1);
    }

    #[test]
    fn spirv_rewrite_preserves_shared_blob_for_other_record() {
        let key_a = ShaderKey::new(2, 0, 0);
        let key_b = ShaderKey::new(2, 0, 1);

        let mut dict = BlobDictionary::new();
        let index = dict.add(&[1, 2, 3, 4]);
        let mat_payload = SpirvShaderChunk {
            records: vec![
                SpirvShaderRecord {
                    key: key_a,
                    blob_index: index,
                },
                SpirvShaderRecord {
                    key: key_b,
                    blob_index: index,
                },
            ],
        }
        .encode();

        let mut bytes = Vec::new();
        write_chunk(&mut bytes, ChunkTag::DICTIONARY_SPIRV, &dict.encode().unwrap());
        write_chunk(&mut bytes, ChunkTag::MATERIAL_SPIRV, &mat_payload);

        let new_bytes = rewrite(&bytes, 2, 0, 0, &[9, 9, 9, 9], &config()).unwrap();

        let package = MaterialPackage::parse(new_bytes).unwrap();
        let container = package.container();
        let new_dict = BlobDictionary::decode(container.payload(ChunkTag::DICTIONARY_SPIRV).unwrap()).unwrap();
        let chunk = SpirvShaderChunk::decode(container.payload(ChunkTag::MATERIAL_SPIRV).unwrap()).unwrap();

        assert_eq!(new_dict.len(), 2);
        let record_a = chunk.records.iter().find(|r| r.key == key_a).unwrap();
        let record_b = chunk.records.iter().find(|r| r.key == key_b).unwrap();
        assert_ne!(record_a.blob_index, record_b.blob_index);
        assert_eq!(new_dict.get(record_b.blob_index), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn unknown_chunk_passes_through_byte_exact() {
        let key = ShaderKey::new(1, 0, 0);
        let mut dict = StringDictionary::new();
        let mat_payload = TextShaderChunk::from_records(vec![TextShaderRecord {
            key,
            text: "a\n".to_string(),
        }])
        .encode_with_dictionary(&mut dict)
        .unwrap();

        let mut bytes = Vec::new();
        write_chunk(&mut bytes, ChunkTag(0xDEADBEEF01020304), &[0x01, 0x02, 0x03]);
        write_chunk(&mut bytes, ChunkTag::DICTIONARY_TEXT, &dict.encode());
        write_chunk(&mut bytes, ChunkTag::MATERIAL_GLSL, &mat_payload);

        let new_bytes = rewrite(&bytes, 1, 0, 0, b"b", &config()).unwrap();
        let container = ChunkContainer::parse(&new_bytes).unwrap();
        assert_eq!(
            container.payload(ChunkTag(0xDEADBEEF01020304)),
            Some(&[0x01u8, 0x02, 0x03][..])
        );
    }

    #[test]
    fn no_such_shader_fails() {
        let key = ShaderKey::new(1, 0, 0);
        let mut dict = StringDictionary::new();
        let mat_payload = TextShaderChunk::from_records(vec![TextShaderRecord {
            key,
            text: "a\n".to_string(),
        }])
        .encode_with_dictionary(&mut dict)
        .unwrap();

        let mut bytes = Vec::new();
        write_chunk(&mut bytes, ChunkTag::DICTIONARY_TEXT, &dict.encode());
        write_chunk(&mut bytes, ChunkTag::MATERIAL_GLSL, &mat_payload);

        let err = rewrite(&bytes, 9, 9, 9, b"b", &config()).unwrap_err();
        assert!(matches!(err, PackageError::NoSuchShader { .. }));
    }
}
