//! WGSL sources for every pass, read from a shader directory with the copies
//! compiled into the binary as fallback.

use std::path::{Path, PathBuf};

/// The six shader modules the renderer builds its pipelines from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    VertexWriteGBuffers,
    FragmentWriteGBuffers,
    VertexTextureQuad,
    FragmentGBuffersDebugView,
    FragmentDeferredRendering,
    LightUpdate,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 6] = [
        Self::VertexWriteGBuffers,
        Self::FragmentWriteGBuffers,
        Self::VertexTextureQuad,
        Self::FragmentGBuffersDebugView,
        Self::FragmentDeferredRendering,
        Self::LightUpdate,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::VertexWriteGBuffers => "vertexWriteGBuffers.wgsl",
            Self::FragmentWriteGBuffers => "fragmentWriteGBuffers.wgsl",
            Self::VertexTextureQuad => "vertexTextureQuad.wgsl",
            Self::FragmentGBuffersDebugView => "fragmentGBuffersDebugView.wgsl",
            Self::FragmentDeferredRendering => "fragmentDeferredRendering.wgsl",
            Self::LightUpdate => "lightUpdate.wgsl",
        }
    }

    /// Source compiled into the binary.
    pub fn embedded(self) -> &'static str {
        match self {
            Self::VertexWriteGBuffers => include_str!("../shaders/vertexWriteGBuffers.wgsl"),
            Self::FragmentWriteGBuffers => include_str!("../shaders/fragmentWriteGBuffers.wgsl"),
            Self::VertexTextureQuad => include_str!("../shaders/vertexTextureQuad.wgsl"),
            Self::FragmentGBuffersDebugView => {
                include_str!("../shaders/fragmentGBuffersDebugView.wgsl")
            }
            Self::FragmentDeferredRendering => {
                include_str!("../shaders/fragmentDeferredRendering.wgsl")
            }
            Self::LightUpdate => include_str!("../shaders/lightUpdate.wgsl"),
        }
    }
}

#[derive(Debug)]
pub enum ShaderError {
    Io { path: PathBuf, error: std::io::Error },
    Empty(PathBuf),
}

impl std::fmt::Display for ShaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, error } => {
                write!(f, "Failed to read shader {}: {}", path.display(), error)
            }
            Self::Empty(path) => write!(f, "Shader {} is empty", path.display()),
        }
    }
}

impl std::error::Error for ShaderError {}

/// Resolved WGSL source for every stage.
#[derive(Debug, Clone)]
pub struct ShaderLibrary {
    sources: Vec<(ShaderStage, String)>,
}

impl ShaderLibrary {
    /// Only the sources compiled into the binary.
    pub fn embedded() -> Self {
        Self {
            sources: ShaderStage::ALL
                .iter()
                .map(|&stage| (stage, stage.embedded().to_string()))
                .collect(),
        }
    }

    /// Read each stage from `dir`, using the embedded copy for files that do
    /// not exist. A file that exists but cannot be read is an error.
    pub fn load(dir: Option<&Path>) -> Result<Self, ShaderError> {
        let mut sources = Vec::with_capacity(ShaderStage::ALL.len());
        for stage in ShaderStage::ALL {
            let source = match dir.map(|d| d.join(stage.file_name())) {
                Some(path) if path.exists() => {
                    let text = std::fs::read_to_string(&path).map_err(|error| {
                        ShaderError::Io {
                            path: path.clone(),
                            error,
                        }
                    })?;
                    if text.trim().is_empty() {
                        return Err(ShaderError::Empty(path));
                    }
                    tracing::debug!("Loaded shader {:?}", path);
                    text
                }
                Some(path) => {
                    tracing::warn!("Shader {:?} not found, using built-in copy", path);
                    stage.embedded().to_string()
                }
                None => stage.embedded().to_string(),
            };
            sources.push((stage, source));
        }
        Ok(Self { sources })
    }

    pub fn source(&self, stage: ShaderStage) -> &str {
        self.sources
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, src)| src.as_str())
            .unwrap_or_else(|| stage.embedded())
    }

    pub fn create_module(&self, device: &wgpu::Device, stage: ShaderStage) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(stage.file_name()),
            source: wgpu::ShaderSource::Wgsl(self.source(stage).into()),
        })
    }
}
