//! Validate command - offline checks of a cleanup request

use console::style;
use std::path::Path;
use teardown_core::CleanupRequestSpec;

use crate::error::{CliError, Result};

pub fn run(file: &Path) -> Result<()> {
    let spec = CleanupRequestSpec::load(file)?;

    println!(
        "{} Validating {} ({} item(s){})",
        style("→").blue().bold(),
        style(file.display()).cyan(),
        spec.resources.len(),
        if spec.dry_run { ", dry run" } else { "" }
    );

    let issues = spec.issues();
    if issues.is_empty() {
        println!("{} Validation passed", style("✓").green().bold());
        return Ok(());
    }

    for issue in &issues {
        println!("  {} {}", style("✗").red(), issue);
    }

    Err(CliError::validation_with_help(
        format!("{} invalid item(s)", issues.len()),
        "every item needs a kind and an action of `delete` or `scaleToZero`",
    ))
}
