//! Error taxonomy for the deployment core.

use thiserror::Error;

use crate::plan::ResponseShape;

/// Errors raised while building commands, running them, or parsing their
/// responses.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or contradictory deployment options. Always detected before
    /// any external process is invoked.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A metadata file could not be read, or does not declare a resource
    /// this tool can deploy.
    #[error("invalid metadata file: {0}")]
    Metadata(String),

    /// The deployment CLI produced non-empty output that is not valid JSON
    /// for the expected shape. The raw output is kept for debugging.
    #[error("failed to parse {shape} response: {source}; raw output: {raw}")]
    Parse {
        shape: ResponseShape,
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// The deployment CLI exited non-zero.
    #[error("command failed: {command}: {stderr}")]
    Process { command: String, stderr: String },
}
