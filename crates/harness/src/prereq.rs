//! Pre-flight prerequisite checks
//!
//! Everything is verified before any process is spawned: the first failing
//! check aborts the run, so a run never leaves partial setup behind.

use std::path::Path;
use tracing::info;

use paasport_common::{Error, Result};

use crate::runner::HarnessConfig;

/// Verify checkouts, manifests, installed dependencies and launch tooling
pub fn check_prerequisites(config: &HarnessConfig) -> Result<()> {
    ensure_dir(&config.backend.cwd, "backend checkout")?;
    ensure_file(
        &config.frontend.cwd.join("package.json"),
        "frontend manifest",
    )?;
    ensure_dir(
        &config.frontend.cwd.join("node_modules"),
        "frontend dependencies (run npm install first)",
    )?;
    ensure_tool(&config.backend.program)?;
    ensure_tool(&config.frontend.program)?;

    info!("Prerequisites OK");
    Ok(())
}

fn ensure_dir(path: &Path, what: &str) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::Prerequisite(format!(
            "{} not found at {}",
            what,
            path.display()
        )))
    }
}

fn ensure_file(path: &Path, what: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::Prerequisite(format!(
            "{} not found at {}",
            what,
            path.display()
        )))
    }
}

fn ensure_tool(program: &str) -> Result<()> {
    which::which(program)
        .map(|_| ())
        .map_err(|_| Error::Prerequisite(format!("{} not found in PATH", program)))
}
