//! deferred.yaml configuration parsing.
//!
//! Every field has a default, so an empty file (or no file at all) runs the
//! stock demo. CLI flags are applied on top of whatever the file sets.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::Deserialize;

use deferred_core::light::MAX_LIGHTS;
use deferred_core::settings::{RenderMode, RuntimeSettings};

use crate::cli::CliArgs;
use crate::input::InputBindings;

pub const CONFIG_FILE_NAME: &str = "deferred.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct DemoConfig {
    pub window: WindowConfig,
    pub mesh: MeshConfig,
    pub lights: LightsConfig,
    pub render_mode: RenderMode,
    pub paused: bool,
    pub shaders: ShaderConfig,
    pub bindings: InputBindings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Deferred Rendering".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub path: Option<PathBuf>,
    pub scale: f32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("assets/stanford-dragon.ply")),
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    pub capacity: usize,
    pub count: usize,
    pub extent_min: [f32; 3],
    pub extent_max: [f32; 3],
    pub seed: u32,
    /// Lights added or removed per key press.
    pub step: usize,
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            capacity: MAX_LIGHTS,
            count: 128,
            extent_min: [-50.0, -30.0, -50.0],
            extent_max: [50.0, 30.0, 50.0],
            seed: 1,
            step: 16,
        }
    }
}

impl LightsConfig {
    pub fn extent(&self) -> (Vec3, Vec3) {
        (Vec3::from(self.extent_min), Vec3::from(self.extent_max))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct ShaderConfig {
    /// Directory holding the WGSL files. Embedded copies are used when unset
    /// or when a file is missing.
    pub directory: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    AlreadyExists(PathBuf),
    Io(std::io::Error),
    Parse(serde_yaml::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => write!(f, "Config not found: {}", path.display()),
            ConfigError::AlreadyExists(path) => {
                write!(f, "Config already exists: {}", path.display())
            }
            ConfigError::Io(e) => write!(f, "IO error reading {}: {}", CONFIG_FILE_NAME, e),
            ConfigError::Parse(e) => write!(f, "Failed to parse {}: {}", CONFIG_FILE_NAME, e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Walk up from `start_dir` looking for `deferred.yaml`.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Load, parse and validate a config file. Relative paths inside it are
/// resolved against the file's directory.
pub fn load_config(path: &Path) -> Result<DemoConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config = parse_config(&contents)?;
    if let Some(root) = path.parent() {
        config.resolve_paths(root);
    }
    Ok(config)
}

/// Parse YAML text into a validated config.
pub fn parse_config(contents: &str) -> Result<DemoConfig, ConfigError> {
    // An empty document deserializes to unit, not to an empty mapping.
    if contents.trim().is_empty() {
        return Ok(DemoConfig::default());
    }
    let mut config: DemoConfig = serde_yaml::from_str(contents).map_err(ConfigError::Parse)?;
    config.bindings = config.bindings.with_defaults();
    config.validate()?;
    Ok(config)
}

/// Resolve the config for this run: `--config` if given, else the nearest
/// `deferred.yaml` above `cwd`, else defaults. CLI overrides apply last.
pub fn resolve_config(args: &CliArgs, cwd: &Path) -> Result<DemoConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => match find_config(cwd) {
            Some(path) => {
                tracing::info!("Using config {}", path.display());
                load_config(&path)?
            }
            None => {
                tracing::info!("No {} found, using defaults", CONFIG_FILE_NAME);
                let mut config = DemoConfig::default();
                config.resolve_paths(cwd);
                config
            }
        },
    };
    config.apply_cli_overrides(args, cwd);
    config.validate()?;
    Ok(config)
}

/// Write the default config into `dir`, refusing to overwrite.
pub fn write_default(dir: &Path) -> Result<PathBuf, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path));
    }
    std::fs::create_dir_all(dir).map_err(ConfigError::Io)?;
    std::fs::write(&path, DEFAULT_CONFIG_YAML).map_err(ConfigError::Io)?;
    tracing::info!("Wrote {}", path.display());
    Ok(path)
}

impl DemoConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window.width, self.window.height
            )));
        }
        if !(self.mesh.scale.is_finite() && self.mesh.scale > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "mesh.scale must be positive, got {}",
                self.mesh.scale
            )));
        }

        let lights = &self.lights;
        if lights.capacity == 0 || lights.capacity > MAX_LIGHTS {
            return Err(ConfigError::Invalid(format!(
                "lights.capacity must be in 1..={}, got {}",
                MAX_LIGHTS, lights.capacity
            )));
        }
        if lights.count == 0 || lights.count > lights.capacity {
            return Err(ConfigError::Invalid(format!(
                "lights.count must be in 1..={}, got {}",
                lights.capacity, lights.count
            )));
        }
        let (min, max) = lights.extent();
        if !min.cmple(max).all() {
            return Err(ConfigError::Invalid(format!(
                "lights.extent_min {} exceeds extent_max {}",
                min, max
            )));
        }
        if lights.step == 0 {
            return Err(ConfigError::Invalid("lights.step must be at least 1".into()));
        }

        let unknown = self.bindings.unknown_keys();
        if !unknown.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "unknown key names in bindings: {}",
                unknown.join(", ")
            )));
        }
        Ok(())
    }

    pub fn resolve_paths(&mut self, root: &Path) {
        if let Some(path) = &self.mesh.path {
            if path.is_relative() {
                self.mesh.path = Some(root.join(path));
            }
        }
        if let Some(dir) = &self.shaders.directory {
            if dir.is_relative() {
                self.shaders.directory = Some(root.join(dir));
            }
        }
    }

    /// Apply CLI flags over file values. Paths given on the command line are
    /// relative to `cwd`.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs, cwd: &Path) {
        if let Some(mesh) = &args.mesh {
            self.mesh.path = Some(cwd.join(mesh));
        }
        if let Some(count) = args.lights {
            self.lights.count = count;
        }
        if let Some(mode) = args.mode {
            self.render_mode = mode;
        }
        if args.paused {
            self.paused = true;
        }
        if let Some(seed) = args.seed {
            self.lights.seed = seed;
        }
        if let Some(dir) = &args.shaders {
            self.shaders.directory = Some(cwd.join(dir));
        }
    }

    pub fn initial_settings(&self) -> RuntimeSettings {
        RuntimeSettings::new(self.render_mode, self.lights.count, self.paused)
    }
}

pub const DEFAULT_CONFIG_YAML: &str = r#"# Deferred rendering demo configuration
window:
  title: Deferred Rendering
  width: 1280
  height: 720
  vsync: true

mesh:
  # Falls back to a procedural sphere when the file is missing.
  path: assets/stanford-dragon.ply
  scale: 1.0

lights:
  capacity: 1024
  count: 128
  extent_min: [-50.0, -30.0, -50.0]
  extent_max: [50.0, 30.0, 50.0]
  seed: 1
  step: 16

render_mode: rendering
paused: false

shaders:
  # Set to a directory of .wgsl files to override the built-in shaders.
  directory: null

bindings:
  toggle_pause: [Space]
  toggle_render_mode: [M]
  more_lights: [ArrowUp]
  fewer_lights: [ArrowDown]
  quit: [Escape]
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "deferred-config-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_template_matches_defaults() {
        let parsed = parse_config(DEFAULT_CONFIG_YAML).unwrap();
        assert_eq!(parsed, DemoConfig::default());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse_config("").unwrap(), DemoConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = parse_config("lights:\n  count: 32\nrender_mode: gbuffer-view\n").unwrap();
        assert_eq!(config.lights.count, 32);
        assert_eq!(config.lights.capacity, MAX_LIGHTS);
        assert_eq!(config.render_mode, RenderMode::GBufferView);
        assert_eq!(config.window.width, 1280);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for yaml in [
            "lights:\n  count: 0\n",
            "lights:\n  capacity: 64\n  count: 65\n",
            "lights:\n  capacity: 4096\n",
            "lights:\n  extent_min: [0, 10, 0]\n  extent_max: [1, 1, 1]\n",
            "window:\n  width: 0\n",
            "mesh:\n  scale: -1.0\n",
            "bindings:\n  quit: [Hyper]\n",
        ] {
            match parse_config(yaml) {
                Err(ConfigError::Invalid(_)) => {}
                other => panic!("expected Invalid for {:?}, got {:?}", yaml, other),
            }
        }
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            parse_config("lights: [not, a, map]\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_find_config_walks_up() {
        let root = temp_dir("find");
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(CONFIG_FILE_NAME), "paused: true\n").unwrap();

        let found = find_config(&nested).unwrap();
        assert_eq!(found, root.join(CONFIG_FILE_NAME));

        let config = load_config(&found).unwrap();
        assert!(config.paused);
        assert_eq!(
            config.mesh.path,
            Some(root.join("assets/stanford-dragon.ply"))
        );
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let missing = std::env::temp_dir().join("deferred-no-such-dir/deferred.yaml");
        assert!(matches!(
            load_config(&missing),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_write_default_refuses_overwrite() {
        let dir = temp_dir("init");
        let path = write_default(&dir).unwrap();
        assert_eq!(load_config(&path).unwrap().lights.count, 128);
        assert!(matches!(
            write_default(&dir),
            Err(ConfigError::AlreadyExists(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = DemoConfig::default();
        let args = CliArgs {
            lights: Some(512),
            mode: Some(RenderMode::GBufferView),
            paused: true,
            seed: Some(9),
            shaders: Some(PathBuf::from("wgsl")),
            ..Default::default()
        };
        let cwd = Path::new("/work");
        config.apply_cli_overrides(&args, cwd);
        assert_eq!(config.lights.count, 512);
        assert_eq!(config.lights.seed, 9);
        assert_eq!(config.render_mode, RenderMode::GBufferView);
        assert!(config.paused);
        assert_eq!(config.shaders.directory, Some(PathBuf::from("/work/wgsl")));

        let settings = config.initial_settings();
        assert_eq!(settings.active_lights, 512);
        assert!(settings.paused);
    }

    #[test]
    fn test_resolve_rejects_out_of_range_override() {
        let dir = temp_dir("resolve");
        let args = CliArgs {
            lights: Some(5000),
            ..Default::default()
        };
        assert!(matches!(
            resolve_config(&args, &dir),
            Err(ConfigError::Invalid(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
