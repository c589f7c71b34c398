use std::path::PathBuf;

use clap::{Parser, Subcommand};

use deferred_core::settings::RenderMode;

#[derive(Parser, Debug, Default)]
#[command(
    name = "deferred",
    version,
    about = "Deferred shading demo: a G-buffer pass lit by up to 1024 animated point lights"
)]
pub struct CliArgs {
    /// Subcommand (init, run). Running is the default.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to a deferred.yaml (default: search upward from the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// PLY mesh to render
    #[arg(long, global = true)]
    pub mesh: Option<PathBuf>,

    /// Number of active lights at startup
    #[arg(long, global = true)]
    pub lights: Option<usize>,

    /// Composite mode: rendering or gbuffer-view
    #[arg(long, global = true)]
    pub mode: Option<RenderMode>,

    /// Start with the animation paused
    #[arg(long, global = true)]
    pub paused: bool,

    /// Seed for the initial light scatter
    #[arg(long, global = true)]
    pub seed: Option<u32>,

    /// Directory to load WGSL shaders from
    #[arg(long, global = true)]
    pub shaders: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Write a default deferred.yaml
    Init {
        /// Target directory (default: current directory)
        dir: Option<PathBuf>,
    },
    /// Open the window and render
    Run,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let args = CliArgs::parse_from([
            "deferred",
            "--lights",
            "64",
            "--mode",
            "gbuffer-view",
            "--paused",
            "--seed",
            "7",
        ]);
        assert_eq!(args.command, None);
        assert_eq!(args.lights, Some(64));
        assert_eq!(args.mode, Some(RenderMode::GBufferView));
        assert!(args.paused);
        assert_eq!(args.seed, Some(7));
        assert!(args.mesh.is_none());
    }

    #[test]
    fn test_flags_after_run_subcommand() {
        let args = CliArgs::parse_from(["deferred", "run", "--lights", "64", "--paused"]);
        assert_eq!(args.command, Some(Command::Run));
        assert_eq!(args.lights, Some(64));
        assert!(args.paused);

        let args = CliArgs::parse_from(["deferred", "--lights", "32", "run", "--mode", "gbuffer-view"]);
        assert_eq!(args.lights, Some(32));
        assert_eq!(args.mode, Some(RenderMode::GBufferView));
    }

    #[test]
    fn test_parse_init() {
        let args = CliArgs::parse_from(["deferred", "init", "demo"]);
        assert_eq!(
            args.command,
            Some(Command::Init {
                dir: Some(PathBuf::from("demo"))
            })
        );
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(CliArgs::try_parse_from(["deferred", "--mode", "wireframe"]).is_err());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }
}
