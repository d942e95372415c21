//! `blogpatch` command dispatch.

/// Clap argument definitions
mod args;

/// Config command handler
mod config;

/// `diff` command (offline classifier)
mod diff;

/// Interactive `edit` session
mod edit;

/// `pull` and `push` against the document API
mod remote;

use std::path::{Path, PathBuf};

use clap::Parser;

use blogpatch_core::config::SyncConfig;
use blogpatch_core::error::{PatchError, Result};

pub use args::Cli;
use args::Commands;

/// Main entry point for the CLI. Returns whether the command succeeded.
pub fn run_cli() -> bool {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Diff {
            old,
            new,
            field,
            files,
        } => diff::handle_diff(&old, &new, &field, files),

        Commands::Pull { blog_id, output } => load_config(cli.config.as_deref())
            .and_then(|config| remote::handle_pull(&config, blog_id, output.as_deref())),

        Commands::Push { file } => load_config(cli.config.as_deref())
            .and_then(|config| remote::handle_push(&config, &file)),

        Commands::Edit { field, blog_id } => load_config(cli.config.as_deref())
            .and_then(|config| edit::handle_edit(&config, &field, blog_id)),

        Commands::Config {
            server,
            ws,
            token,
            blog_id,
            timeout_ms,
            show,
        } => config::handle_config(
            cli.config,
            config::ConfigChanges {
                server,
                ws,
                token,
                blog_id,
                timeout_ms,
            },
            show,
        ),
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            eprintln!("Error: {}", e);
            false
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .init();
}

/// Config file in use: the override, or the default location.
fn config_path(override_path: Option<&Path>) -> Result<PathBuf> {
    match override_path {
        Some(path) => Ok(path.to_path_buf()),
        None => SyncConfig::config_path().ok_or(PatchError::NoConfigDir),
    }
}

fn load_config(override_path: Option<&Path>) -> Result<SyncConfig> {
    SyncConfig::load_from_or_default(&config_path(override_path)?)
}

/// Multi-threaded runtime for the network commands.
fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}
