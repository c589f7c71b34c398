use clap::Parser;
use deferred_client::cli::{CliArgs, Command};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    tracing::info!("deferred v{}", env!("CARGO_PKG_VERSION"));

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: cannot read current directory: {}", e);
            std::process::exit(1);
        }
    };

    match &args.command {
        // deferred init [DIR]
        Some(Command::Init { dir }) => {
            let dir = dir.clone().unwrap_or_else(|| cwd.clone());
            match deferred_client::config::write_default(&dir) {
                Ok(path) => println!("Created {}", path.display()),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        // deferred [run] [flags]
        Some(Command::Run) | None => {
            let config = match deferred_client::config::resolve_config(&args, &cwd) {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!("{}", e);
                    std::process::exit(1);
                }
            };
            if let Err(e) = deferred_client::engine::run(config) {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        }
    }
}
