//! End-to-end scenario 2 (§8): replacing one SPIR-V record preserves the
//! blob still referenced by another record.
use pretty_assertions::assert_eq;

use ubershade_lib::blob_dict::BlobDictionary;
use ubershade_lib::chunk::{write_chunk, ChunkContainer, ChunkTag};
use ubershade_lib::compiler::NullCompiler;
use ubershade_lib::package::ShaderKey;
use ubershade_lib::spirv_shader::{SpirvShaderChunk, SpirvShaderRecord};
use ubershade_lib::{rewrite, RewriteConfig};

#[test]
fn replacing_one_record_preserves_the_others_blob() {
    let key_a = ShaderKey::new(2, 0, 0);
    let key_b = ShaderKey::new(2, 0, 1);

    let mut dict = BlobDictionary::new();
    let shared = dict.add(&[1, 2, 3, 4, 5, 6, 7, 8]);
    let mat_payload = SpirvShaderChunk {
        records: vec![
            SpirvShaderRecord {
                key: key_a,
                blob_index: shared,
            },
            SpirvShaderRecord {
                key: key_b,
                blob_index: shared,
            },
        ],
    }
    .encode();

    let mut bytes = Vec::new();
    write_chunk(&mut bytes, ChunkTag::DICTIONARY_SPIRV, &dict.encode().unwrap());
    write_chunk(&mut bytes, ChunkTag::MATERIAL_SPIRV, &mat_payload);

    let config = RewriteConfig {
        compiler: Box::new(NullCompiler),
        disable_dedup: false,
    };
    let new_bytes = rewrite(&bytes, 2, 0, 0, &[9, 9, 9, 9, 9, 9], &config).unwrap();

    let container = ChunkContainer::parse(&new_bytes).unwrap();
    let new_dict = BlobDictionary::decode(container.payload(ChunkTag::DICTIONARY_SPIRV).unwrap()).unwrap();
    let chunk = SpirvShaderChunk::decode(container.payload(ChunkTag::MATERIAL_SPIRV).unwrap()).unwrap();

    assert_eq!(new_dict.len(), 2);
    let record_a = chunk.records.iter().find(|r| r.key == key_a).unwrap();
    let record_b = chunk.records.iter().find(|r| r.key == key_b).unwrap();
    assert_ne!(record_a.blob_index, record_b.blob_index);
    assert_eq!(new_dict.get(record_b.blob_index), Some(&[1u8, 2, 3, 4, 5, 6, 7, 8][..]));
}

#[test]
fn compile_failure_surfaces_as_compile_error() {
    use ubershade_lib::compiler::FailingCompiler;
    use ubershade_lib::PackageError;

    let key = ShaderKey::new(2, 0, 0);
    let mut dict = BlobDictionary::new();
    let index = dict.add(&[1, 2, 3, 4]);
    let mat_payload = SpirvShaderChunk {
        records: vec![SpirvShaderRecord { key, blob_index: index }],
    }
    .encode();

    let mut bytes = Vec::new();
    write_chunk(&mut bytes, ChunkTag::DICTIONARY_SPIRV, &dict.encode().unwrap());
    write_chunk(&mut bytes, ChunkTag::MATERIAL_SPIRV, &mat_payload);

    let config = RewriteConfig {
        compiler: Box::new(FailingCompiler),
        disable_dedup: false,
    };
    let err = rewrite(&bytes, 2, 0, 0, b"garbage", &config).unwrap_err();
    assert!(matches!(err, PackageError::CompileError { .. }));
}
