//! Material package and ubershader archive codec for a real-time rendering
//! engine: chunked container parsing, line- and blob-deduplicated shader
//! storage, single-shader rewrite, and archive packing/matching.
pub mod archive;
pub mod blob_dict;
pub mod chunk;
pub mod compiler;
pub mod compress;
pub mod engine;
pub mod error;
pub mod hash;
pub mod package;
pub mod rewrite;
pub mod spirv_shader;
pub mod string_dict;
pub mod text_shader;

pub use chunk::{ChunkContainer, ChunkTag};
pub use error::{ArchiveError, PackageError, SpecFileError};
pub use package::{Backend, MaterialPackage, ShaderKey};
pub use rewrite::{rewrite, RewriteConfig};
