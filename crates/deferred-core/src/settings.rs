use serde::{Deserialize, Serialize};

/// Which composite pass runs at the end of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Full lighting from the G-buffer.
    #[default]
    Rendering,
    /// Normals, albedo and depth side by side.
    #[serde(rename = "gbuffer-view", alias = "gbuffer")]
    GBufferView,
}

impl RenderMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Rendering => Self::GBufferView,
            Self::GBufferView => Self::Rendering,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Rendering => "rendering",
            Self::GBufferView => "gbuffer-view",
        }
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rendering" => Ok(Self::Rendering),
            "gbuffer-view" | "gbuffer" => Ok(Self::GBufferView),
            other => Err(format!(
                "unknown render mode '{}' (expected 'rendering' or 'gbuffer-view')",
                other
            )),
        }
    }
}

/// User-facing knobs that can change between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub render_mode: RenderMode,
    pub active_lights: usize,
    pub paused: bool,
}

impl RuntimeSettings {
    pub fn new(render_mode: RenderMode, active_lights: usize, paused: bool) -> Self {
        Self {
            render_mode,
            active_lights,
            paused,
        }
    }

    pub fn toggle_render_mode(&mut self) -> RenderMode {
        self.render_mode = self.render_mode.toggled();
        self.render_mode
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Shift the active light count by `delta`, kept within `[1, capacity]`.
    /// Returns the new count.
    pub fn adjust_lights(&mut self, delta: i64, capacity: usize) -> usize {
        let capacity = capacity.max(1) as i64;
        let next = (self.active_lights as i64).saturating_add(delta).clamp(1, capacity);
        self.active_lights = next as usize;
        self.active_lights
    }
}
