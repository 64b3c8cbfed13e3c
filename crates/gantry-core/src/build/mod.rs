//! Compiles a deployment request into deployment CLI invocations.
//!
//! Validation happens before any command is produced. The decision tree is
//! ordered and the first matching shape wins:
//! 1. metadata file -> `run services|jobs replace`
//! 2. job -> `run jobs deploy`
//! 3. service without a traffic split -> `run deploy`
//! 4. service with only a traffic split -> `run services update-traffic`
//! 5. service with both -> deploy followed by update-traffic

use tracing::warn;

use crate::error::Error;
use crate::flags::parse_flags;
use crate::kv::KeyValueMap;
use crate::metadata::{MetadataReader, ResourceKind};
use crate::plan::{CommandPlan, PlannedCommand, ResponseShape};
use crate::request::{DeploymentRequest, ImageSource, Target, TrafficSpec, UpdateStrategy};


/// Compile a request into one or two planned commands.
///
/// Pure apart from a single call to `metadata` when a metadata file drives
/// the deployment. Fails fast with [`Error::Configuration`] before emitting
/// any command.
pub fn build_plan(
    request: &DeploymentRequest,
    metadata: &dyn MetadataReader,
) -> Result<CommandPlan, Error> {
    validate(request)?;

    match &request.target {
        Target::MetadataFile {
            path,
            explicit_name,
        } => {
            warn_inputs_overridden_by_metadata(request);
            let doc = metadata.read(path)?;
            if let (Some(declared), Some(explicit)) = (doc.name.as_deref(), explicit_name.as_deref())
                && declared != explicit
            {
                return Err(Error::Configuration(format!(
                    "metadata file declares name '{declared}' but '{explicit}' was given"
                )));
            }

            let mut command = new_command(request, ResponseShape::ServiceOrJobDescriptor);
            match doc.kind {
                ResourceKind::Service => command.args(["run", "services", "replace"]),
                ResourceKind::Job => command.args(["run", "jobs", "replace"]),
            };
            command.arg(path.display().to_string());
            push_common_suffix(&mut command, request, request.flags.as_deref());
            Ok(CommandPlan::single(command))
        }

        Target::Job(name) => Ok(CommandPlan::single(job_deploy_command(name, request))),

        Target::Service(name) => {
            let mut commands = Vec::new();
            if request.image_source.is_some() {
                commands.push(service_deploy_command(name, request));
            }
            if let Some(spec) = &request.traffic {
                commands.push(update_traffic_command(name, spec, request));
            }
            Ok(CommandPlan { commands })
        }
    }
}

/// Reject contradictory or incomplete requests before any output exists.
fn validate(request: &DeploymentRequest) -> Result<(), Error> {
    if let Target::Service(name) | Target::Job(name) = &request.target
        && name.trim().is_empty()
    {
        return Err(Error::Configuration("target name is empty".into()));
    }

    if request.traffic.is_some() && !request.target.is_service() {
        return Err(Error::Configuration(
            "a traffic split requires a service name".into(),
        ));
    }

    match &request.target {
        Target::Service(name)
            if request.image_source.is_none() && request.traffic.is_none() =>
        {
            Err(Error::Configuration(format!(
                "service '{name}' has nothing to apply: provide an image, a source directory, or a traffic split"
            )))
        }
        Target::Job(name) if request.image_source.is_none() => Err(Error::Configuration(
            format!("job '{name}' requires an image or a source directory"),
        )),
        _ => Ok(()),
    }
}

/// Case 2: `run jobs deploy`.
fn job_deploy_command(name: &str, request: &DeploymentRequest) -> PlannedCommand {
    let mut command = new_command(request, ResponseShape::ServiceOrJobDescriptor);
    command.args(["run", "jobs", "deploy"]).arg(name);
    push_image_source(&mut command, request);

    let env_vars = compiled_env_vars(request);
    if !env_vars.is_empty() {
        command
            .arg(request.env_var_strategy.env_vars_flag())
            .arg(env_vars.join());
    }

    if !request.secrets.is_empty() {
        // Jobs have no merge capability upstream; a merge request degrades
        // to replacing the full secret set.
        if request.secret_strategy == UpdateStrategy::Merge {
            warn!("jobs do not support merging secrets; replacing the full secret set");
        }
        command.arg("--set-secrets").arg(request.secrets.join());
    }

    let labels = compiled_labels(request);
    if !labels.is_empty() {
        command.arg("--update-labels").arg(labels.join());
    }

    push_common_suffix(&mut command, request, request.flags.as_deref());
    command
}

/// Case 3 (and the first half of case 5): `run deploy`.
fn service_deploy_command(name: &str, request: &DeploymentRequest) -> PlannedCommand {
    let mut command = new_command(request, ResponseShape::ServiceOrJobDescriptor);
    command.args(["run", "deploy"]).arg(name);
    push_image_source(&mut command, request);

    let env_vars = compiled_env_vars(request);
    if !env_vars.is_empty() {
        command
            .arg(request.env_var_strategy.env_vars_flag())
            .arg(env_vars.join());
    }

    if !request.secrets.is_empty() {
        command
            .arg(request.secret_strategy.secrets_flag())
            .arg(request.secrets.join());
    }

    if let Some(tag) = &request.tag {
        command.arg("--tag").arg(tag);
    }
    if let Some(suffix) = &request.revision_suffix {
        command.arg("--revision-suffix").arg(suffix);
    }
    if request.no_traffic {
        command.arg("--no-traffic");
    }
    if let Some(timeout) = &request.timeout {
        command.arg("--timeout").arg(timeout);
    }

    let labels = compiled_labels(request);
    if !labels.is_empty() {
        command.arg("--update-labels").arg(labels.join());
    }

    push_common_suffix(&mut command, request, request.flags.as_deref());
    command
}

/// Case 4 (and the second half of case 5): `run services update-traffic`.
fn update_traffic_command(
    name: &str,
    spec: &TrafficSpec,
    request: &DeploymentRequest,
) -> PlannedCommand {
    let mut command = new_command(request, ResponseShape::TrafficAssignmentList);
    command
        .args(["run", "services", "update-traffic"])
        .arg(name)
        .arg(spec.flag())
        .arg(spec.split().join());
    push_common_suffix(&mut command, request, request.update_traffic_flags.as_deref());
    command
}

/// Start a command, emitting the release-track token when one is selected.
fn new_command(request: &DeploymentRequest, shape: ResponseShape) -> PlannedCommand {
    let mut command = PlannedCommand::new(shape);
    if let Some(component) = request.component {
        command.arg(component.as_arg());
    }
    command
}

fn push_image_source(command: &mut PlannedCommand, request: &DeploymentRequest) {
    match &request.image_source {
        Some(ImageSource::Image(image)) => {
            command.arg("--image").arg(image);
        }
        Some(ImageSource::SourceDir(source)) => {
            command.arg("--source").arg(source);
        }
        None => {}
    }
}

/// Suffix shared by every command: machine-readable output, regions,
/// project, then raw pass-through flags last so they can override anything
/// emitted earlier.
fn push_common_suffix(
    command: &mut PlannedCommand,
    request: &DeploymentRequest,
    raw_flags: Option<&str>,
) {
    command.args(["--format", "json"]);

    let regions: Vec<&str> = request
        .regions
        .iter()
        .map(|region| region.trim())
        .filter(|region| !region.is_empty())
        .collect();
    if !regions.is_empty() {
        command.arg("--region").arg(regions.join(","));
    }

    if let Some(project) = &request.project_id {
        command.arg("--project").arg(project);
    }

    if let Some(raw) = raw_flags {
        command.args(parse_flags(raw));
    }
}

/// File-sourced env vars with the explicit pairs merged on top.
fn compiled_env_vars(request: &DeploymentRequest) -> KeyValueMap {
    let mut env_vars = request.file_env_vars.clone();
    env_vars.merge(&request.env_vars);
    env_vars
}

/// Default labels with the user labels merged on top.
fn compiled_labels(request: &DeploymentRequest) -> KeyValueMap {
    let mut labels = KeyValueMap::new();
    if !request.skip_default_labels {
        labels.insert("managed-by", "github-actions");
        if let Some(sha) = &request.commit_sha {
            labels.insert("commit-sha", sha);
        }
    }
    labels.merge(&request.labels);
    labels
}

/// The metadata file is authoritative; everything that would otherwise
/// shape the deployment is dropped, loudly.
fn warn_inputs_overridden_by_metadata(request: &DeploymentRequest) {
    let mut ignored = Vec::new();
    if request.image_source.is_some() {
        ignored.push("image/source");
    }
    if !request.env_vars.is_empty() || !request.file_env_vars.is_empty() {
        ignored.push("env vars");
    }
    if !request.secrets.is_empty() {
        ignored.push("secrets");
    }
    if !request.labels.is_empty() {
        ignored.push("labels");
    }
    if request.tag.is_some() {
        ignored.push("tag");
    }
    if request.revision_suffix.is_some() {
        ignored.push("revision suffix");
    }
    if request.no_traffic {
        ignored.push("no-traffic");
    }
    if request.timeout.is_some() {
        ignored.push("timeout");
    }
    if !ignored.is_empty() {
        warn!(
            "metadata file is authoritative; ignoring: {}",
            ignored.join(", ")
        );
    }
}
