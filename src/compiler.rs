//! The external shader compiler boundary: GLSL source in, SPIR-V words out.
//!
//! The compiler itself is out of scope; this module only defines the trait
//! seam [crate::rewrite::rewrite] calls through, plus test doubles.
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileDiagnostic(pub String);

impl fmt::Display for CompileDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CompileDiagnostic {}

/// `compile(source, stage, model) -> bytes`, as a black-box collaborator.
pub trait ShaderCompiler {
    fn compile(&self, source: &[u8], stage: u8, model: u8) -> Result<Vec<u8>, CompileDiagnostic>;
}

/// A test double that treats `source` as already-compiled SPIR-V words and
/// pads it to a 4-byte boundary, without exercising a real compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCompiler;

impl ShaderCompiler for NullCompiler {
    fn compile(&self, source: &[u8], _stage: u8, _model: u8) -> Result<Vec<u8>, CompileDiagnostic> {
        let mut words = source.to_vec();
        while words.len() % 4 != 0 {
            words.push(0);
        }
        Ok(words)
    }
}

/// A test double that always fails, for exercising [crate::error::PackageError::CompileError].
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingCompiler;

impl ShaderCompiler for FailingCompiler {
    fn compile(&self, _source: &[u8], _stage: u8, _model: u8) -> Result<Vec<u8>, CompileDiagnostic> {
        Err(CompileDiagnostic("simulated compile failure".to_string()))
    }
}
