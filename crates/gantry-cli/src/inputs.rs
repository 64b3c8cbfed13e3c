//! Converts raw CLI and environment inputs into a typed deployment request.
//!
//! CI runners pass unset inputs as empty strings, so blank values are
//! treated as absent throughout.

use std::path::Path;

use anyhow::{Context, Result};

use gantry_core::kv::KeyValueMap;
use gantry_core::request::{DeploymentRequest, ImageSource, Target, TrafficSpec};

use crate::Cli;

/// Build the typed request from the raw option surface.
pub fn build_request(cli: &Cli) -> Result<DeploymentRequest> {
    // Paths coming from env vars can be blank the same way strings can.
    let metadata = cli
        .metadata
        .clone()
        .filter(|path| !path.as_os_str().is_empty());
    let env_vars_file = cli
        .env_vars_file
        .clone()
        .filter(|path| !path.as_os_str().is_empty());

    let target = Target::resolve(
        none_if_blank(cli.service.as_deref()),
        none_if_blank(cli.job.as_deref()),
        metadata,
    )?;

    let mut request = DeploymentRequest::new(target);

    request.image_source = ImageSource::resolve(
        none_if_blank(cli.image.as_deref()),
        none_if_blank(cli.source.as_deref()),
    )?;

    request.env_vars = parse_kv_input(cli.env_vars.as_deref(), "env vars")?;
    if let Some(path) = &env_vars_file {
        request.file_env_vars = load_kv_file(path)?;
    }
    request.secrets = parse_kv_input(cli.secrets.as_deref(), "secrets")?;
    request.labels = parse_kv_input(cli.labels.as_deref(), "labels")?;

    request.env_var_strategy = cli
        .env_vars_update_strategy
        .parse()
        .context("invalid env vars update strategy")?;
    request.secret_strategy = cli
        .secrets_update_strategy
        .parse()
        .context("invalid secrets update strategy")?;

    request.traffic = TrafficSpec::resolve(
        parse_optional_kv(cli.revision_traffic.as_deref(), "revision traffic")?,
        parse_optional_kv(cli.tag_traffic.as_deref(), "tag traffic")?,
    )?;

    request.tag = none_if_blank(cli.tag.as_deref());
    request.revision_suffix = none_if_blank(cli.revision_suffix.as_deref());
    request.no_traffic = cli.no_traffic;
    request.timeout = none_if_blank(cli.timeout.as_deref());

    request.regions = split_csv(cli.region.as_deref());
    request.project_id = none_if_blank(cli.project_id.as_deref());
    request.commit_sha = none_if_blank(cli.commit_sha.as_deref());
    request.skip_default_labels = cli.skip_default_labels;

    request.component = match none_if_blank(cli.gcloud_component.as_deref()) {
        Some(raw) => Some(raw.parse()?),
        None => None,
    };

    request.flags = none_if_blank(cli.flags.as_deref());
    request.update_traffic_flags = none_if_blank(cli.update_traffic_flags.as_deref());

    Ok(request)
}

fn none_if_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

fn parse_kv_input(value: Option<&str>, what: &str) -> Result<KeyValueMap> {
    match value {
        Some(raw) if !raw.trim().is_empty() => {
            KeyValueMap::parse(raw).with_context(|| format!("invalid {what}"))
        }
        _ => Ok(KeyValueMap::new()),
    }
}

fn parse_optional_kv(value: Option<&str>, what: &str) -> Result<Option<KeyValueMap>> {
    let map = parse_kv_input(value, what)?;
    Ok(if map.is_empty() { None } else { Some(map) })
}

fn load_kv_file(path: &Path) -> Result<KeyValueMap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read env vars file {}", path.display()))?;
    KeyValueMap::parse(&text)
        .with_context(|| format!("invalid env vars file {}", path.display()))
}

fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|raw| raw.split(',').map(String::from).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gantry").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn minimal_service_request() {
        let cli = cli(&["--service", "app", "--image", "gcr.io/acme/app:1"]);
        let request = build_request(&cli).unwrap();
        assert_eq!(request.target, Target::Service("app".into()));
        assert_eq!(
            request.image_source,
            Some(ImageSource::Image("gcr.io/acme/app:1".into()))
        );
    }

    #[test]
    fn blank_inputs_are_treated_as_absent() {
        let cli = cli(&["--service", "app", "--image", "img", "--tag", "  "]);
        let request = build_request(&cli).unwrap();
        assert_eq!(request.tag, None);
    }

    #[test]
    fn env_vars_blob_is_parsed() {
        let cli = cli(&[
            "--service",
            "app",
            "--image",
            "img",
            "--env-vars",
            "FOO=bar,ZIP=zap",
        ]);
        let request = build_request(&cli).unwrap();
        assert_eq!(request.env_vars.join(), "FOO=bar,ZIP=zap");
    }

    #[test]
    fn revision_and_tag_traffic_together_is_rejected() {
        let cli = cli(&[
            "--service",
            "app",
            "--revision-traffic",
            "v2=100",
            "--tag-traffic",
            "stable=100",
        ]);
        assert!(build_request(&cli).is_err());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let cli = cli(&[
            "--service",
            "app",
            "--image",
            "img",
            "--env-vars-update-strategy",
            "replace",
        ]);
        assert!(build_request(&cli).is_err());
    }

    #[test]
    fn unknown_component_is_rejected() {
        let cli = cli(&[
            "--service",
            "app",
            "--image",
            "img",
            "--gcloud-component",
            "stable",
        ]);
        assert!(build_request(&cli).is_err());
    }

    #[test]
    fn regions_pass_through_untrimmed() {
        // The builder owns trimming and empty-entry dropping.
        let cli = cli(&["--service", "app", "--image", "img", "--region", "a, b"]);
        let request = build_request(&cli).unwrap();
        assert_eq!(request.regions, vec!["a", " b"]);
    }
}
