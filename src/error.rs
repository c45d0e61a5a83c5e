//! Error types for the container, package, archive, and spec-file parsers.
use thiserror::Error;

use crate::chunk::ChunkTag;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("chunk {tag:?} declares size {size} which runs past the end of the buffer (len {len})")]
    ChunkOverrunsBuffer {
        tag: ChunkTag,
        size: u32,
        len: usize,
    },

    #[error("buffer ends with {remaining} trailing bytes, not enough for another chunk header")]
    TruncatedHeader { remaining: usize },
}

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("package is not a well-formed chunk container")]
    MalformedPackage(#[from] ContainerError),

    #[error("package has no MaterialGlsl, MaterialMetal, or MaterialSpirv chunk")]
    UnsupportedBackend,

    #[error("no shader record matches model={model}, variant={variant}, stage={stage}")]
    NoSuchShader { model: u8, variant: u8, stage: u8 },

    #[error("shader compilation failed: {diagnostic}")]
    CompileError { diagnostic: String },

    #[error("line dictionary would need more than 65535 entries")]
    TooManyLines,

    #[error("internal encoding error: {reason}")]
    InternalEncodingError { reason: String },

    #[error("duplicate shader key model={model}, variant={variant}, stage={stage}")]
    DuplicateShaderKey { model: u8, variant: u8, stage: u8 },

    #[error("line index {index} out of range for dictionary of size {size}")]
    LineIndexOutOfRange { index: u16, size: usize },

    #[error("blob index {index} out of range for dictionary of size {size}")]
    BlobIndexOutOfRange { index: u32, size: usize },
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive is corrupt: {reason}")]
    CorruptArchive { reason: String },

    #[error("alignment assertion failed for {what} at offset {offset}: implementation bug, not data")]
    AlignmentAssertion { what: &'static str, offset: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
#[error("{file}:{line}:{col}: {msg}")]
pub struct SpecFileError {
    pub file: String,
    pub line: usize,
    pub col: usize,
    pub msg: String,
}
