//! Teardown CLI - Pre-destroy cleanup operator for Kubernetes clusters

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use std::time::Duration;
use teardown_kube::ControllerConfig;

mod commands;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "teardown")]
#[command(author = "Teardown Contributors")]
#[command(version)]
#[command(about = "Scale down and delete cluster resources before the cluster is destroyed", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter, e.g. `info` or `teardown_kube=debug` (RUST_LOG takes precedence)
    #[arg(long, global = true, env = "TEARDOWN_LOG", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the CleanupRequest controller
    Run {
        /// Only watch this namespace (default: all namespaces)
        #[arg(short, long, env = "TEARDOWN_NAMESPACE")]
        namespace: Option<String>,

        /// Seconds before a failed pass is retried
        #[arg(long, env = "TEARDOWN_ERROR_REQUEUE_SECS", default_value_t = 30)]
        error_requeue_secs: u64,

        /// Deadline in seconds for every Kubernetes API call
        #[arg(long, env = "TEARDOWN_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
        request_timeout_secs: u64,
    },

    /// Print the CleanupRequest CustomResourceDefinition
    Crd,

    /// Check a cleanup request file without contacting the cluster
    Validate {
        /// CleanupRequest manifest or bare spec
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Run one cleanup pass against the current cluster context
    Apply {
        /// CleanupRequest manifest or bare spec
        #[arg(short, long)]
        file: PathBuf,

        /// Report what would be cleaned up without mutating anything
        #[arg(long)]
        dry_run: bool,

        /// Deadline in seconds for every Kubernetes API call
        #[arg(long, env = "TEARDOWN_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
        request_timeout_secs: u64,
    },
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Commands::Run {
            namespace,
            error_requeue_secs,
            request_timeout_secs,
        } => {
            commands::run::run(ControllerConfig {
                namespace,
                error_requeue: Duration::from_secs(error_requeue_secs),
                request_timeout: Duration::from_secs(request_timeout_secs),
            })
            .await
        }

        Commands::Crd => commands::crd::run(),

        Commands::Validate { file } => commands::validate::run(&file),

        Commands::Apply {
            file,
            dry_run,
            request_timeout_secs,
        } => commands::apply::run(&file, dry_run, Duration::from_secs(request_timeout_secs)).await,
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["teardown", "run"]).unwrap();
        match cli.command {
            Commands::Run {
                namespace,
                error_requeue_secs,
                request_timeout_secs,
            } => {
                assert!(namespace.is_none());
                assert_eq!(error_requeue_secs, 30);
                assert_eq!(request_timeout_secs, 30);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_apply_requires_file() {
        assert!(Cli::try_parse_from(["teardown", "apply"]).is_err());
        let cli = Cli::try_parse_from(["teardown", "apply", "-f", "req.yaml", "--dry-run"]).unwrap();
        assert!(matches!(cli.command, Commands::Apply { dry_run: true, .. }));
    }
}
