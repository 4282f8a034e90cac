// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! fwdd - the input side of a telemetry forwarding daemon.
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

use clap::{Parser, Subcommand};
use fwdd_config::{ConfigError, FwddConfig};

/// fwdd - receive telemetry events over udp, tcp, and http.
#[derive(Parser, Debug)]
#[command(name = "fwdd", version, about, long_about = None)]
struct Cli {
    /// Configuration file. Replaces the default lookup in
    /// /etc/fwdd, ~/.config/fwdd and the working directory.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start every configured input source and run until SIGINT or SIGTERM.
    Serve,
    /// Validate configuration and list the sources it would start.
    Check,
}

fn load_config(path: Option<&PathBuf>) -> Result<FwddConfig, Vec<ConfigError>> {
    match path {
        Some(path) => fwdd_config::load_and_validate_path(path),
        None => fwdd_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            fwdd_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Check) => serve::run_check(&config),
        None => {
            println!("fwdd: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("fwdd: {e}");
        std::process::exit(1);
    }
}
