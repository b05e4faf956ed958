/// Shader bytecode loading
///
/// The engine consumes precompiled bytecode only. Where it comes from is
/// decided by a [`ShaderLoader`]; [`FileShaderLoader`] reads it from disk.

use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::{engine_diagnostic, engine_init_err};

/// Entry point used by both pipeline stages
pub const SHADER_ENTRY_POINT: &str = "main";

/// Source of shader bytecode
pub trait ShaderLoader {
    /// Read the whole bytecode blob behind `path`
    fn load(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Reads bytecode files from the filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileShaderLoader;

impl ShaderLoader for FileShaderLoader {
    fn load(&self, path: &Path) -> Result<Vec<u8>> {
        let bytes = std::fs::read(path).map_err(|e| {
            engine_init_err!("mcvk::shader", "Failed to open shader '{}': {}", path.display(), e)
        })?;
        engine_diagnostic!("mcvk::shader", "Loaded '{}' ({} bytes)", path.display(), bytes.len());
        Ok(bytes)
    }
}

/// Vertex and fragment bytecode of the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderBytecode {
    pub vertex: Vec<u8>,
    pub fragment: Vec<u8>,
}

impl ShaderBytecode {
    pub fn load(loader: &dyn ShaderLoader, vertex: &Path, fragment: &Path) -> Result<Self> {
        Ok(Self {
            vertex: loader.load(vertex)?,
            fragment: loader.load(fragment)?,
        })
    }

    /// Load the shader pair named by `config` from disk
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::load(&FileShaderLoader, &config.vertex_shader_path, &config.fragment_shader_path)
    }
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
