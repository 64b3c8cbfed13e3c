//! Runs planned deployment commands and captures their output.

use std::process::Command;

use tracing::{debug, info};

use gantry_core::error::Error;
use gantry_core::plan::PlannedCommand;

/// Binary every planned command is executed with.
pub const GCLOUD: &str = "gcloud";

/// Environment the child process gets on top of the inherited one. Scoped
/// to the spawn so usage attribution never becomes ambient global state.
const CHILD_ENV: &[(&str, &str)] = &[("CLOUDSDK_METRICS_ENVIRONMENT", "gantry")];

/// Execute one planned command, returning its stdout.
///
/// A non-zero exit is fatal and carries the exact command string plus
/// whatever the process wrote to stderr.
pub fn run(command: &PlannedCommand) -> Result<String, Error> {
    let rendered = command.render(GCLOUD);
    info!("running: {rendered}");

    let output = Command::new(GCLOUD)
        .args(&command.args)
        .envs(CHILD_ENV.iter().copied())
        .output()
        .map_err(|err| Error::Process {
            command: rendered.clone(),
            stderr: format!("failed to spawn: {err}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        return Err(Error::Process {
            command: rendered,
            stderr: if stderr.is_empty() {
                "(stderr was empty)".to_string()
            } else {
                stderr.to_string()
            },
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    debug!("stdout: {}", stdout.trim());
    Ok(stdout)
}
