//! Gantry - Cloud Run deployment step for CI pipelines
//!
//! Usage:
//!   gantry --service app --image gcr.io/acme/app:1 --region europe-west1
//!   gantry --service app --revision-traffic app-v2=100
//!   gantry --metadata service.yaml
//!
//! Every option can also be supplied through an `INPUT_*` environment
//! variable, the way a CI runner passes step inputs.

mod executor;
mod inputs;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gantry_core::build::build_plan;
use gantry_core::metadata::FileMetadataReader;
use gantry_core::response::{DeploymentResult, parse_response};

/// Deploy a Cloud Run service or job from a CI pipeline.
#[derive(Parser, Debug)]
#[command(name = "gantry")]
#[command(version, about = "Cloud Run deployment step", long_about = None)]
struct Cli {
    /// Name of the Cloud Run service to deploy
    #[arg(long, env = "INPUT_SERVICE")]
    service: Option<String>,

    /// Name of the Cloud Run job to deploy
    #[arg(long, env = "INPUT_JOB")]
    job: Option<String>,

    /// YAML or JSON metadata file declaring the service or job to replace
    #[arg(long, env = "INPUT_METADATA")]
    metadata: Option<PathBuf>,

    /// Fully qualified container image to deploy
    #[arg(long, env = "INPUT_IMAGE")]
    image: Option<String>,

    /// Build and deploy from source at this directory
    #[arg(long, env = "INPUT_SOURCE")]
    source: Option<String>,

    /// Environment variables as KEY=value pairs, comma or newline separated
    #[arg(long, env = "INPUT_ENV_VARS")]
    env_vars: Option<String>,

    /// File with additional KEY=value environment variables
    #[arg(long, env = "INPUT_ENV_VARS_FILE")]
    env_vars_file: Option<PathBuf>,

    /// How env vars meet the ones already deployed (merge or overwrite)
    #[arg(long, env = "INPUT_ENV_VARS_UPDATE_STRATEGY", default_value = "merge")]
    env_vars_update_strategy: String,

    /// Secrets as KEY=value pairs; keys starting with / are mount paths
    #[arg(long, env = "INPUT_SECRETS")]
    secrets: Option<String>,

    /// How secrets meet the ones already deployed (merge or overwrite)
    #[arg(long, env = "INPUT_SECRETS_UPDATE_STRATEGY", default_value = "merge")]
    secrets_update_strategy: String,

    /// Labels as KEY=value pairs
    #[arg(long, env = "INPUT_LABELS")]
    labels: Option<String>,

    /// Skip the default managed-by and commit-sha labels
    #[arg(long, env = "INPUT_SKIP_DEFAULT_LABELS")]
    skip_default_labels: bool,

    /// Traffic percentages keyed by revision name (REVISION=PERCENT)
    #[arg(long, env = "INPUT_REVISION_TRAFFIC")]
    revision_traffic: Option<String>,

    /// Traffic percentages keyed by tag (TAG=PERCENT)
    #[arg(long, env = "INPUT_TAG_TRAFFIC")]
    tag_traffic: Option<String>,

    /// Traffic tag to assign to the new revision
    #[arg(long, env = "INPUT_TAG")]
    tag: Option<String>,

    /// Suffix for the new revision's name
    #[arg(long, env = "INPUT_REVISION_SUFFIX")]
    revision_suffix: Option<String>,

    /// Deploy the new revision without routing traffic to it
    #[arg(long, env = "INPUT_NO_TRAFFIC")]
    no_traffic: bool,

    /// Maximum request execution time, e.g. 300 or 5m
    #[arg(long, env = "INPUT_TIMEOUT")]
    timeout: Option<String>,

    /// Region(s) to deploy to, comma separated
    #[arg(long, env = "INPUT_REGION")]
    region: Option<String>,

    /// Google Cloud project id
    #[arg(long, env = "INPUT_PROJECT_ID")]
    project_id: Option<String>,

    /// Commit recorded in the default commit-sha label
    #[arg(long, env = "GITHUB_SHA")]
    commit_sha: Option<String>,

    /// gcloud release track to run under (alpha or beta)
    #[arg(long, env = "INPUT_GCLOUD_COMPONENT")]
    gcloud_component: Option<String>,

    /// Extra flags appended to the deploy command
    #[arg(long, env = "INPUT_FLAGS")]
    flags: Option<String>,

    /// Extra flags appended to the update-traffic command
    #[arg(long, env = "INPUT_UPDATE_TRAFFIC_FLAGS")]
    update_traffic_flags: Option<String>,

    /// Print the planned commands without executing them
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gantry=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let request = inputs::build_request(&cli)?;
    let plan = build_plan(&request, &FileMetadataReader)?;

    if cli.dry_run {
        for command in &plan.commands {
            println!("{}", command.render(executor::GCLOUD));
        }
        return Ok(());
    }

    // Commands run strictly in order; the update-traffic command depends on
    // the revision the deploy command creates, so a failure stops the run.
    let mut result = DeploymentResult::default();
    for command in &plan.commands {
        let stdout = executor::run(command)?;
        let parsed = parse_response(command.shape, &stdout, request.tag.as_deref())?;
        if parsed.url.is_some() {
            result = parsed;
        }
    }

    output::emit(&result)?;
    Ok(())
}
