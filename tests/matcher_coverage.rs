//! End-to-end scenario 6 (§8): feature coverage rules for the matcher.
use std::collections::HashMap;

use pretty_assertions::assert_eq;

use indexmap::IndexMap;
use ubershade_lib::archive::matcher::{ArchiveMatcher, ArchiveRequirements};
use ubershade_lib::archive::reader::ArchiveReader;
use ubershade_lib::archive::spec::{ArchiveFeature, Blending, MaterialEntry, Shading};
use ubershade_lib::archive::writer::ArchiveWriter;

fn requirements_with_normal_map() -> ArchiveRequirements {
    let mut features = HashMap::new();
    features.insert("normalMap".to_string(), true);
    ArchiveRequirements {
        shading_model: Shading::Lit,
        blending_mode: Blending::Opaque,
        features,
    }
}

fn material(flag: Option<ArchiveFeature>) -> MaterialEntry {
    let mut flags = IndexMap::new();
    if let Some(value) = flag {
        flags.insert("normalMap".to_string(), value);
    }
    MaterialEntry {
        package_bytes: b"pkg".to_vec(),
        shading: Some(Shading::Lit),
        blending: Some(Blending::Opaque),
        flags,
    }
}

#[test]
fn unsupported_flag_is_rejected() {
    let mut writer = ArchiveWriter::new();
    writer.add_material(material(Some(ArchiveFeature::Unsupported)));
    let archive = ArchiveReader::load(&writer.write().unwrap()).unwrap();

    assert_eq!(ArchiveMatcher.select(&archive, &requirements_with_normal_map()).unwrap(), None);
}

#[test]
fn optional_flag_is_accepted() {
    let mut writer = ArchiveWriter::new();
    writer.add_material(material(Some(ArchiveFeature::Optional)));
    let archive = ArchiveReader::load(&writer.write().unwrap()).unwrap();

    assert_eq!(ArchiveMatcher.select(&archive, &requirements_with_normal_map()).unwrap(), Some(0));
}

#[test]
fn missing_flag_is_rejected() {
    let mut writer = ArchiveWriter::new();
    writer.add_material(material(None));
    let archive = ArchiveReader::load(&writer.write().unwrap()).unwrap();

    assert_eq!(ArchiveMatcher.select(&archive, &requirements_with_normal_map()).unwrap(), None);
}

#[test]
fn required_flag_not_requested_is_rejected() {
    let mut writer = ArchiveWriter::new();
    writer.add_material(material(Some(ArchiveFeature::Required)));
    let archive = ArchiveReader::load(&writer.write().unwrap()).unwrap();

    let reqs = ArchiveRequirements {
        shading_model: Shading::Lit,
        blending_mode: Blending::Opaque,
        features: HashMap::new(),
    };
    assert_eq!(ArchiveMatcher.select(&archive, &reqs).unwrap(), None);
}
