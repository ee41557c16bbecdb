// SPDX-FileCopyrightText: 2026 Poller Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Poller - metrics polling daemon with pluggable inputs and outputs.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use poller_core::PollerError;
use poller_plugin::DEFAULT_MODULE_DIR;

/// Poller - metrics polling daemon.
#[derive(Parser, Debug)]
#[command(name = "poller", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Config file (TOML, JSON or YAML). Defaults to the first of
    /// /etc/poller/poller.conf, ~/.config/poller/poller.conf, ./poller.conf.
    #[arg(short, long, global = true, env = "POLLER_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory searched for dynamic plugin modules.
    #[arg(long, global = true, default_value = DEFAULT_MODULE_DIR)]
    pub module_dir: PathBuf,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve config, load plugins and serve the status surface (default).
    Serve,
    /// Resolve config and load plugins, print the plugin catalog, then exit.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(&cli.global).await,
        Commands::CheckConfig => serve::run_check_config(&cli.global),
    };

    if let Err(err) = result {
        poller_config::render_errors(&poller_config::diagnose(&err));
        std::process::exit(exit_code(&err));
    }
}

/// 1 for errors that abort startup, 2 for a lookup that found nothing.
fn exit_code(err: &PollerError) -> i32 {
    if err.is_fatal() { 1 } else { 2 }
}
