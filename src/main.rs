use clap::Parser;
use sprig::cli::commands::{Cli, Commands};
use sprig::cli::handlers;
use sprig::io::config_io;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    // Tracing is opt-in via RUST_LOG and goes to stderr so it never mixes
    // with --json output. Ignore invalid/huge filters.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cli = Cli::parse();
    let config_dir = cli.config_dir.clone();
    let dir_override = config_dir.as_deref().map(std::path::Path::new);

    match cli.command {
        None => {
            // No subcommand → launch TUI
            let dir = match config_io::config_dir(dir_override) {
                Ok(dir) => dir,
                Err(e) => {
                    eprintln!("error: {}", e);
                    std::process::exit(1);
                }
            };
            if let Err(e) = sprig::tui::run(&dir) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Init(args)) => {
            // Init is handled before config loading
            if let Err(e) = handlers::cmd_init(dir_override, args) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(_) => {
            if let Err(e) = handlers::dispatch(cli) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
