//! Parses the deployment CLI's JSON responses into stable outputs.
//!
//! Empty-ish output (`""`, `"{}"`, `"[]"`) is a legitimate terminal state
//! meaning "nothing to extract"; only non-empty text that fails to parse is
//! an error.

use serde::Deserialize;

use crate::error::Error;
use crate::plan::ResponseShape;

/// Final outputs extracted from a deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentResult {
    /// Best URL for the deployed resource, when one could be determined.
    pub url: Option<String>,
}

/// Extract outputs from one command's stdout.
///
/// `traffic_tag` is the tag requested at deploy time; when the response
/// shape is a resource descriptor and the tag already has a dedicated URL,
/// that URL supersedes the service's default one.
pub fn parse_response(
    shape: ResponseShape,
    stdout: &str,
    traffic_tag: Option<&str>,
) -> Result<DeploymentResult, Error> {
    if is_blank(stdout) {
        return Ok(DeploymentResult::default());
    }
    match shape {
        ResponseShape::ServiceOrJobDescriptor => parse_descriptor(stdout, traffic_tag),
        ResponseShape::TrafficAssignmentList => parse_traffic_list(stdout),
    }
}

/// The output forms that mean "nothing to extract": empty text, the empty
/// object, and the empty list.
fn is_blank(stdout: &str) -> bool {
    matches!(stdout.trim(), "" | "{}" | "[]")
}

fn parse_descriptor(stdout: &str, traffic_tag: Option<&str>) -> Result<DeploymentResult, Error> {
    let descriptor: ResourceDescriptor =
        serde_json::from_str(stdout).map_err(|source| Error::Parse {
            shape: ResponseShape::ServiceOrJobDescriptor,
            raw: stdout.to_string(),
            source,
        })?;

    let status = descriptor.status.unwrap_or_default();
    let mut url = status.url;

    // A requested tag that has not propagated yet is not an error; the
    // default status URL stands in until it does.
    if let Some(tag) = traffic_tag
        && let Some(tagged_url) = status
            .traffic
            .iter()
            .find(|target| target.tag.as_deref() == Some(tag))
            .and_then(|target| target.url.clone())
    {
        url = Some(tagged_url);
    }

    Ok(DeploymentResult { url })
}

fn parse_traffic_list(stdout: &str) -> Result<DeploymentResult, Error> {
    let assignments: Vec<TrafficAssignment> =
        serde_json::from_str(stdout).map_err(|source| Error::Parse {
            shape: ResponseShape::TrafficAssignmentList,
            raw: stdout.to_string(),
            source,
        })?;

    let mut url = assignments
        .first()
        .and_then(|assignment| assignment.service_url.clone());

    // Prefer a tagged canary URL over the bare service URL: the first
    // assignment in array order with any per-tag URL wins.
    if let Some(tagged_url) = assignments
        .iter()
        .find(|assignment| !assignment.urls.is_empty())
        .and_then(|assignment| assignment.urls.first().cloned())
    {
        url = Some(tagged_url);
    }

    Ok(DeploymentResult { url })
}

/// Wire form of a service or job resource descriptor.
#[derive(Debug, Deserialize)]
struct ResourceDescriptor {
    #[serde(default)]
    status: Option<ResourceStatus>,
}

#[derive(Debug, Default, Deserialize)]
struct ResourceStatus {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    traffic: Vec<TrafficTarget>,
}

#[derive(Debug, Deserialize)]
struct TrafficTarget {
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Wire form of one update-traffic assignment row.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrafficAssignment {
    #[serde(default)]
    service_url: Option<String>,
    #[serde(default)]
    urls: Vec<String>,
}
