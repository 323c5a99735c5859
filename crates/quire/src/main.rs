// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quire - document review service.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod commands;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use quire_config::model::QuireConfig;

/// Quire - document review service.
#[derive(Parser, Debug)]
#[command(name = "quire", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway, outbox dispatcher and reminder scheduler.
    Serve,
    /// Repair patches left half-applied between the two stores, then exit.
    Reconcile,
    /// Run one reminder scan now, deliver what it enqueued, then exit.
    Remind,
    /// Validate and print the effective configuration.
    Config,
    /// Manage user roles.
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    /// Give an existing user the admin role.
    Grant {
        /// The user's email address.
        email: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> QuireConfig {
    let loaded = match path {
        Some(path) => quire_config::load_and_validate_path(path),
        None => quire_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            quire_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quire={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let Some(command) = cli.command else {
        println!("quire: use --help for available commands");
        return;
    };

    if !matches!(command, Commands::Config) {
        init_tracing(&config.server.log_level);
    }

    let result = match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Reconcile => commands::run_reconcile(config).await,
        Commands::Remind => commands::run_remind(config).await,
        Commands::Config => commands::run_config(&config),
        Commands::Admin {
            action: AdminAction::Grant { email },
        } => commands::run_admin_grant(config, &email).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "quire exited with an error");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_flag_is_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from(["quire", "remind", "--config", "/tmp/q.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Remind)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/q.toml")));
    }

    #[test]
    fn admin_grant_takes_an_email() {
        let cli = Cli::try_parse_from(["quire", "admin", "grant", "ann@x"]).unwrap();
        match cli.command {
            Some(Commands::Admin {
                action: AdminAction::Grant { email },
            }) => assert_eq!(email, "ann@x"),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
