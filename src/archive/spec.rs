//! The logical data model for an archived material spec: shading model,
//! blending mode, and feature flags (§3, §6).
use indexmap::IndexMap;

/// Sentinel wire value meaning "unconstrained" for shading/blending.
pub const INVALID: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum Shading {
    Unlit,
    Lit,
    Subsurface,
    Cloth,
    SpecularGlossiness,
}

impl Shading {
    pub fn as_str(self) -> &'static str {
        match self {
            Shading::Unlit => "unlit",
            Shading::Lit => "lit",
            Shading::Subsurface => "subsurface",
            Shading::Cloth => "cloth",
            Shading::SpecularGlossiness => "specularGlossiness",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "unlit" => Shading::Unlit,
            "lit" => Shading::Lit,
            "subsurface" => Shading::Subsurface,
            "cloth" => Shading::Cloth,
            "specularGlossiness" => Shading::SpecularGlossiness,
            _ => return None,
        })
    }

    pub(crate) fn to_wire(value: Option<Self>) -> u32 {
        match value {
            None => INVALID,
            Some(Shading::Unlit) => 0,
            Some(Shading::Lit) => 1,
            Some(Shading::Subsurface) => 2,
            Some(Shading::Cloth) => 3,
            Some(Shading::SpecularGlossiness) => 4,
        }
    }

    pub(crate) fn from_wire(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Shading::Unlit),
            1 => Some(Shading::Lit),
            2 => Some(Shading::Subsurface),
            3 => Some(Shading::Cloth),
            4 => Some(Shading::SpecularGlossiness),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum Blending {
    Opaque,
    Transparent,
    Add,
    Masked,
    Fade,
    Multiply,
    Screen,
}

impl Blending {
    pub fn as_str(self) -> &'static str {
        match self {
            Blending::Opaque => "opaque",
            Blending::Transparent => "transparent",
            Blending::Add => "add",
            Blending::Masked => "masked",
            Blending::Fade => "fade",
            Blending::Multiply => "multiply",
            Blending::Screen => "screen",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "opaque" => Blending::Opaque,
            "transparent" => Blending::Transparent,
            "add" => Blending::Add,
            "masked" => Blending::Masked,
            "fade" => Blending::Fade,
            "multiply" => Blending::Multiply,
            "screen" => Blending::Screen,
            _ => return None,
        })
    }

    pub(crate) fn to_wire(value: Option<Self>) -> u32 {
        match value {
            None => INVALID,
            Some(Blending::Opaque) => 0,
            Some(Blending::Transparent) => 1,
            Some(Blending::Add) => 2,
            Some(Blending::Masked) => 3,
            Some(Blending::Fade) => 4,
            Some(Blending::Multiply) => 5,
            Some(Blending::Screen) => 6,
        }
    }

    pub(crate) fn from_wire(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Blending::Opaque),
            1 => Some(Blending::Transparent),
            2 => Some(Blending::Add),
            3 => Some(Blending::Masked),
            4 => Some(Blending::Fade),
            5 => Some(Blending::Multiply),
            6 => Some(Blending::Screen),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum ArchiveFeature {
    Unsupported,
    Optional,
    Required,
}

impl ArchiveFeature {
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveFeature::Unsupported => "unsupported",
            ArchiveFeature::Optional => "optional",
            ArchiveFeature::Required => "required",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "unsupported" => ArchiveFeature::Unsupported,
            "optional" => ArchiveFeature::Optional,
            "required" => ArchiveFeature::Required,
            _ => return None,
        })
    }

    pub(crate) fn to_wire(self) -> u64 {
        match self {
            ArchiveFeature::Unsupported => 0,
            ArchiveFeature::Optional => 1,
            ArchiveFeature::Required => 2,
        }
    }

    pub(crate) fn from_wire(raw: u64) -> Option<Self> {
        match raw {
            0 => Some(ArchiveFeature::Unsupported),
            1 => Some(ArchiveFeature::Optional),
            2 => Some(ArchiveFeature::Required),
            _ => None,
        }
    }
}

/// One material to be archived, as given to [crate::archive::writer::ArchiveWriter].
#[derive(Debug, Clone)]
pub struct MaterialEntry {
    pub package_bytes: Vec<u8>,
    pub shading: Option<Shading>,
    pub blending: Option<Blending>,
    pub flags: IndexMap<String, ArchiveFeature>,
}

impl MaterialEntry {
    pub fn new(package_bytes: Vec<u8>) -> Self {
        Self {
            package_bytes,
            shading: None,
            blending: None,
            flags: IndexMap::new(),
        }
    }
}
