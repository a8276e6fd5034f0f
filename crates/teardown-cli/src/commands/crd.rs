//! Crd command - print the CleanupRequest CustomResourceDefinition

use crate::error::Result;

pub fn run() -> Result<()> {
    let yaml = teardown_kube::crd_yaml()?;
    print!("{}", yaml);
    Ok(())
}
