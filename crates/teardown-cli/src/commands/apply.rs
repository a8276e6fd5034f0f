//! Apply command - run one cleanup pass against the current cluster

use console::style;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use teardown_core::CleanupRequestSpec;
use teardown_kube::{DiscoveryCatalog, KubeStore, Orchestrator, TypeResolver};
use tracing::{info, warn};

use crate::error::{CliError, Result};

pub async fn run(file: &Path, force_dry_run: bool, request_timeout: Duration) -> Result<()> {
    let spec = CleanupRequestSpec::load(file)?;
    let dry_run = spec.dry_run || force_dry_run;

    let client = kube::Client::try_default()
        .await
        .map_err(|e| CliError::cluster(e.to_string()))?;

    println!(
        "{} Processing {} item(s) from {}{}",
        style("→").blue().bold(),
        spec.resources.len(),
        style(file.display()).cyan(),
        if dry_run {
            style(" (dry run)").yellow().to_string()
        } else {
            String::new()
        }
    );

    let store = Arc::new(KubeStore::with_client(client.clone()).with_request_timeout(request_timeout));
    let discovery = Arc::new(DiscoveryCatalog::new(client).with_request_timeout(request_timeout));
    let orchestrator = Orchestrator::with_resolver(store, TypeResolver::static_first(discovery));

    info!(file = %file.display(), items = spec.resources.len(), dry_run, "Starting cleanup pass");
    let result = orchestrator.process(dry_run, &spec.resources).await;
    info!(count = result.count, errors = result.errors.len(), "Cleanup pass finished");

    if result.is_success() {
        let verb = if dry_run { "Would clean up" } else { "Cleaned up" };
        println!(
            "{} {} {} resource(s)",
            style("✓").green().bold(),
            verb,
            result.count
        );
        return Ok(());
    }

    for error in &result.errors {
        warn!(error = %error, "Cleanup item failed");
        eprintln!("  {} {}", style("✗").red(), error);
    }

    Err(CliError::CleanupFailed {
        count: result.count,
        errors: result.errors.len(),
    })
}
