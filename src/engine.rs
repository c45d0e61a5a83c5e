//! The rendering-engine boundary: turning package bytes into an opaque handle
//! the engine understands (§10.6).
//!
//! The real resource (GPU pipeline state, descriptor sets, ...) is out of
//! scope; this crate only defines the seam [ArchiveReader](crate::archive::reader::ArchiveReader)
//! calls through.

/// An opaque handle to an engine-side built material. Equality/ordering are
/// only meaningful to the `MaterialBuilder` that produced the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

/// `build_material(package_bytes) -> MaterialHandle`, as a black-box collaborator.
pub trait MaterialBuilder {
    fn build_material(&self, package_bytes: &[u8]) -> MaterialHandle;
}

/// A test double that assigns sequential handles without building anything.
#[derive(Debug, Default)]
pub struct CountingMaterialBuilder {
    next: std::cell::Cell<u64>,
}

impl MaterialBuilder for CountingMaterialBuilder {
    fn build_material(&self, _package_bytes: &[u8]) -> MaterialHandle {
        let id = self.next.get();
        self.next.set(id + 1);
        MaterialHandle(id)
    }
}
