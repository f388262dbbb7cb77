//! `taskhub` — command-line front end for the task/user service.
//!
//! Configuration comes from `taskhub.toml` and `TASKHUB_*` variables (see
//! `taskhub_core::config`); the session token persists between runs in the
//! configured session directory.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use taskhub_core::load_config_from_path;
use tracing_subscriber::EnvFilter;

use crate::commands::Command;

#[derive(Debug, Parser)]
#[command(name = "taskhub", version, about = "Manage tasks and users on a taskhub server")]
struct Cli {
    /// Explicit configuration file (otherwise taskhub.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn init_logging(level: &str) {
    let filter = format!("{level},taskhub_core={level}");
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter)))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config_from_path(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.log.level);
    tracing::debug!(base_url = %config.api.base_url, session_dir = %config.session.dir.display(), "configuration loaded");

    let mut out = std::io::stdout().lock();
    match commands::run(cli.command, &config, &mut out).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", commands::describe(&err));
            ExitCode::FAILURE
        }
    }
}
