//! Select the first archived spec that satisfies a mesh's requirements (C9).
use std::collections::HashMap;

use log::{debug, trace};

use crate::archive::reader::ArchiveReader;
use crate::archive::spec::{ArchiveFeature, Blending, Shading};
use crate::error::ArchiveError;

/// What a mesh needs from the material it will be matched against.
#[derive(Debug, Clone)]
pub struct ArchiveRequirements {
    pub shading_model: Shading,
    pub blending_mode: Blending,
    /// `name -> true` means the mesh exercises that capability.
    pub features: HashMap<String, bool>,
}

/// Stateless; kept as a unit struct for symmetry with [crate::rewrite::RewriteConfig]
/// and forward compatibility with a default-fallback toggle (§10.3).
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveMatcher;

impl ArchiveMatcher {
    /// Return the index of the first suitable spec, per the four predicates
    /// in §4.9, or `None` if no spec matches.
    pub fn select(&self, archive: &ArchiveReader, reqs: &ArchiveRequirements) -> Result<Option<u32>, ArchiveError> {
        for index in 0..archive.specs_count() {
            let spec = archive.spec(index)?;

            if let Some(blending) = spec.blending {
                if blending != reqs.blending_mode {
                    trace!("spec {index} rejected: blending mismatch");
                    continue;
                }
            }
            if let Some(shading) = spec.shading {
                if shading != reqs.shading_model {
                    trace!("spec {index} rejected: shading mismatch");
                    continue;
                }
            }

            let mut covered = true;
            for (name, &used) in &reqs.features {
                if !used {
                    continue;
                }
                match spec.flag(name) {
                    Some(ArchiveFeature::Optional) | Some(ArchiveFeature::Required) => {}
                    _ => {
                        covered = false;
                        break;
                    }
                }
            }
            if !covered {
                trace!("spec {index} rejected: missing feature coverage");
                continue;
            }

            let mut satisfied = true;
            for flag in spec.flags() {
                if flag.value == ArchiveFeature::Required && !reqs.features.get(flag.name).copied().unwrap_or(false) {
                    satisfied = false;
                    break;
                }
            }
            if !satisfied {
                trace!("spec {index} rejected: unsatisfied required flag");
                continue;
            }

            debug!("spec {index} selected");
            return Ok(Some(index));
        }

        debug!("no spec matched requirements");
        Ok(None)
    }
}
