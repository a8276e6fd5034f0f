//! Run command - start the cleanup request controller

use console::style;
use teardown_kube::{ControllerConfig, run_controller};
use tracing::info;

use crate::error::{CliError, Result};

pub async fn run(config: ControllerConfig) -> Result<()> {
    let client = kube::Client::try_default()
        .await
        .map_err(|e| CliError::cluster(e.to_string()))?;

    eprintln!(
        "{} Watching cleanup requests in {}",
        style("→").blue().bold(),
        style(config.namespace.as_deref().unwrap_or("all namespaces")).yellow()
    );

    run_controller(client, config).await;
    info!("Controller stopped");
    Ok(())
}
