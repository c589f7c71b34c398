use crate::light::workgroup_count;
use crate::settings::RenderMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// Setup has not completed (or failed).
    Uninitialized,
    /// All resources exist; the next frame may begin.
    Ready,
    /// A frame is being recorded.
    Rendering,
}

/// One recorded step of a frame, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStep {
    WriteGBuffer,
    UpdateLights { workgroups: u32 },
    Composite(RenderMode),
}

/// The fixed pass order for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    pub passes: [PassStep; 3],
    /// Whether the camera uniform is rewritten after presenting.
    pub update_camera: bool,
}

impl FramePlan {
    pub fn new(mode: RenderMode, paused: bool, capacity: usize) -> Self {
        Self {
            passes: [
                PassStep::WriteGBuffer,
                PassStep::UpdateLights {
                    workgroups: workgroup_count(capacity),
                },
                PassStep::Composite(mode),
            ],
            update_camera: !paused,
        }
    }

    pub fn composite_mode(&self) -> RenderMode {
        match self.passes[2] {
            PassStep::Composite(mode) => mode,
            _ => RenderMode::Rendering,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    NotReady(SequencerState),
    NotRendering(SequencerState),
}

impl std::fmt::Display for SequenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady(state) => write!(f, "Cannot begin a frame while {:?}", state),
            Self::NotRendering(state) => write!(f, "Cannot end a frame while {:?}", state),
        }
    }
}

impl std::error::Error for SequenceError {}

/// Tracks the setup/frame lifecycle.
#[derive(Debug, Clone)]
pub struct FrameSequencer {
    state: SequencerState,
    frames: u64,
    consecutive_skips: u32,
}

impl Default for FrameSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSequencer {
    pub fn new() -> Self {
        Self {
            state: SequencerState::Uninitialized,
            frames: 0,
            consecutive_skips: 0,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames skipped in a row since the last presented one.
    pub fn consecutive_skips(&self) -> u32 {
        self.consecutive_skips
    }

    /// Called once every setup step has succeeded.
    pub fn mark_ready(&mut self) {
        if self.state == SequencerState::Uninitialized {
            self.state = SequencerState::Ready;
        }
    }

    pub fn begin_frame(
        &mut self,
        mode: RenderMode,
        paused: bool,
        capacity: usize,
    ) -> Result<FramePlan, SequenceError> {
        if self.state != SequencerState::Ready {
            return Err(SequenceError::NotReady(self.state));
        }
        self.state = SequencerState::Rendering;
        Ok(FramePlan::new(mode, paused, capacity))
    }

    /// Finish the frame started by `begin_frame`. `presented` is false when the
    /// frame was skipped (e.g. the surface could not be acquired).
    pub fn end_frame(&mut self, presented: bool) -> Result<(), SequenceError> {
        if self.state != SequencerState::Rendering {
            return Err(SequenceError::NotRendering(self.state));
        }
        self.state = SequencerState::Ready;
        if presented {
            self.frames += 1;
            self.consecutive_skips = 0;
        } else {
            self.consecutive_skips = self.consecutive_skips.saturating_add(1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_requires_setup() {
        let mut seq = FrameSequencer::new();
        assert_eq!(
            seq.begin_frame(RenderMode::Rendering, false, 1024),
            Err(SequenceError::NotReady(SequencerState::Uninitialized))
        );
        assert_eq!(seq.state(), SequencerState::Uninitialized);
    }

    #[test]
    fn test_state_transitions() {
        let mut seq = FrameSequencer::new();
        seq.mark_ready();
        assert_eq!(seq.state(), SequencerState::Ready);

        seq.begin_frame(RenderMode::Rendering, false, 1024).unwrap();
        assert_eq!(seq.state(), SequencerState::Rendering);
        assert!(matches!(
            seq.begin_frame(RenderMode::Rendering, false, 1024),
            Err(SequenceError::NotReady(SequencerState::Rendering))
        ));

        seq.end_frame(true).unwrap();
        assert_eq!(seq.state(), SequencerState::Ready);
        assert_eq!(seq.frames(), 1);
        assert!(seq.end_frame(true).is_err());
    }

    #[test]
    fn test_skipped_frame_not_counted() {
        let mut seq = FrameSequencer::new();
        seq.mark_ready();
        seq.begin_frame(RenderMode::GBufferView, true, 8).unwrap();
        seq.end_frame(false).unwrap();
        assert_eq!(seq.frames(), 0);
        assert_eq!(seq.state(), SequencerState::Ready);
    }

    #[test]
    fn test_consecutive_skips_reset_on_present() {
        let mut seq = FrameSequencer::new();
        seq.mark_ready();
        for expected in 1..=3 {
            seq.begin_frame(RenderMode::Rendering, false, 64).unwrap();
            seq.end_frame(false).unwrap();
            assert_eq!(seq.consecutive_skips(), expected);
        }
        seq.begin_frame(RenderMode::Rendering, false, 64).unwrap();
        seq.end_frame(true).unwrap();
        assert_eq!(seq.consecutive_skips(), 0);
        assert_eq!(seq.frames(), 1);
    }

    #[test]
    fn test_pass_order() {
        let plan = FramePlan::new(RenderMode::Rendering, false, 1024);
        assert_eq!(plan.passes[0], PassStep::WriteGBuffer);
        assert_eq!(plan.passes[1], PassStep::UpdateLights { workgroups: 16 });
        assert_eq!(plan.passes[2], PassStep::Composite(RenderMode::Rendering));
        assert!(plan.update_camera);
    }

    #[test]
    fn test_render_mode_only_changes_composite() {
        for paused in [false, true] {
            let lit = FramePlan::new(RenderMode::Rendering, paused, 128);
            let debug = FramePlan::new(RenderMode::GBufferView, paused, 128);
            assert_eq!(lit.passes[..2], debug.passes[..2]);
            assert_ne!(lit.passes[2], debug.passes[2]);
            assert_eq!(lit.update_camera, debug.update_camera);
            assert_eq!(debug.composite_mode(), RenderMode::GBufferView);
        }
    }

    #[test]
    fn test_paused_skips_camera_update() {
        let plan = FramePlan::new(RenderMode::Rendering, true, 128);
        assert!(!plan.update_camera);
        assert_eq!(plan.passes[1], PassStep::UpdateLights { workgroups: 2 });
    }
}
