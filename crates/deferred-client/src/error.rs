use deferred_core::frame::SequenceError;
use deferred_core::light::LightError;

use crate::config::ConfigError;
use crate::mesh::MeshError;
use crate::shader::ShaderError;

/// Fatal failure during one-time renderer setup.
#[derive(Debug)]
pub enum SetupError {
    EventLoop(winit::error::EventLoopError),
    Window(winit::error::OsError),
    Surface(wgpu::CreateSurfaceError),
    NoAdapter,
    /// The surface reports no usable texture format for this adapter.
    UnsupportedSurface,
    Device(wgpu::RequestDeviceError),
    Config(ConfigError),
    Mesh(MeshError),
    Shader(ShaderError),
    Lights(LightError),
    /// A wgpu object failed validation or ran out of memory on creation.
    Gpu {
        resource: &'static str,
        error: wgpu::Error,
    },
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EventLoop(e) => write!(f, "Event loop error: {}", e),
            Self::Window(e) => write!(f, "Failed to create window: {}", e),
            Self::Surface(e) => write!(f, "Failed to create surface: {}", e),
            Self::NoAdapter => write!(f, "No suitable GPU adapter found"),
            Self::UnsupportedSurface => write!(f, "Surface has no supported texture format"),
            Self::Device(e) => write!(f, "Failed to create device: {}", e),
            Self::Config(e) => write!(f, "{}", e),
            Self::Mesh(e) => write!(f, "Mesh setup failed: {}", e),
            Self::Shader(e) => write!(f, "Shader setup failed: {}", e),
            Self::Lights(e) => write!(f, "Light setup failed: {}", e),
            Self::Gpu { resource, error } => {
                write!(f, "Failed to create {}: {}", resource, error)
            }
        }
    }
}

impl std::error::Error for SetupError {}

impl From<ConfigError> for SetupError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<MeshError> for SetupError {
    fn from(e: MeshError) -> Self {
        Self::Mesh(e)
    }
}

impl From<ShaderError> for SetupError {
    fn from(e: ShaderError) -> Self {
        Self::Shader(e)
    }
}

impl From<LightError> for SetupError {
    fn from(e: LightError) -> Self {
        Self::Lights(e)
    }
}

/// Per-frame failure. The driving loop skips the frame and carries on.
#[derive(Debug)]
pub enum FrameError {
    /// Surface was lost or outdated and has been reconfigured.
    SurfaceReconfigured,
    Surface(wgpu::SurfaceError),
    Sequence(SequenceError),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SurfaceReconfigured => write!(f, "Surface reconfigured, frame skipped"),
            Self::Surface(e) => write!(f, "Surface error: {}", e),
            Self::Sequence(e) => write!(f, "Frame sequencing error: {}", e),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<SequenceError> for FrameError {
    fn from(e: SequenceError) -> Self {
        Self::Sequence(e)
    }
}

/// Run `create` inside validation and out-of-memory error scopes and turn a
/// captured error into a `SetupError` naming `resource`.
pub fn checked<T>(
    device: &wgpu::Device,
    resource: &'static str,
    create: impl FnOnce() -> T,
) -> Result<T, SetupError> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());

    match validation.or(out_of_memory) {
        Some(error) => {
            tracing::error!("Failed to create {}: {}", resource, error);
            Err(SetupError::Gpu { resource, error })
        }
        None => {
            tracing::debug!("Created {}", resource);
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_error_names_cause() {
        let err = SetupError::from(LightError::ZeroCapacity);
        assert_eq!(
            err.to_string(),
            "Light setup failed: Light capacity must be at least 1"
        );
        assert_eq!(
            SetupError::NoAdapter.to_string(),
            "No suitable GPU adapter found"
        );
    }

    #[test]
    fn test_frame_error_from_sequence() {
        use deferred_core::frame::SequencerState;
        let err = FrameError::from(SequenceError::NotReady(SequencerState::Uninitialized));
        match err {
            FrameError::Sequence(SequenceError::NotReady(state)) => {
                assert_eq!(state, SequencerState::Uninitialized)
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
