//! Emits step outputs for the surrounding CI runner.

use std::fs::OpenOptions;
use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;

use gantry_core::response::DeploymentResult;

/// Report the `url` output: appended to the file `$GITHUB_OUTPUT` points at
/// when the runner provides one, printed otherwise. No URL emits nothing.
pub fn emit(result: &DeploymentResult) -> Result<()> {
    let Some(url) = &result.url else {
        info!("deployment response carried no URL");
        return Ok(());
    };

    info!("service URL: {url}");

    if let Ok(path) = std::env::var("GITHUB_OUTPUT")
        && !path.is_empty()
    {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .with_context(|| format!("failed to open step output file {path}"))?;
        writeln!(file, "url={url}").context("failed to write step output")?;
        return Ok(());
    }

    println!("url={url}");
    Ok(())
}
