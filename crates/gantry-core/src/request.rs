//! Typed deployment request model.
//!
//! Mutually exclusive options are tagged unions resolved once at the input
//! boundary, so "exactly one of N" invariants hold by construction and the
//! builder can match exhaustively.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;
use crate::kv::KeyValueMap;

/// What the deployment operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A named Cloud Run service.
    Service(String),
    /// A named Cloud Run job.
    Job(String),
    /// A service or job declared by a metadata file. The file is
    /// authoritative; an explicitly given name is kept only so the builder
    /// can reject a mismatch with the declared name.
    MetadataFile {
        path: PathBuf,
        explicit_name: Option<String>,
    },
}

impl Target {
    /// Resolve the target from the three raw name inputs.
    ///
    /// A metadata file takes precedence over names. Naming both a service
    /// and a job is contradictory and rejected outright.
    pub fn resolve(
        service: Option<String>,
        job: Option<String>,
        metadata_file: Option<PathBuf>,
    ) -> Result<Self, Error> {
        match (service, job, metadata_file) {
            (Some(service), Some(job), _) => Err(Error::Configuration(format!(
                "only one of service ('{service}') or job ('{job}') may be set"
            ))),
            (service, job, Some(path)) => Ok(Self::MetadataFile {
                path,
                explicit_name: service.or(job),
            }),
            (Some(name), None, None) => Ok(Self::Service(name)),
            (None, Some(name), None) => Ok(Self::Job(name)),
            (None, None, None) => Err(Error::Configuration(
                "provide a service name, a job name, or a metadata file".into(),
            )),
        }
    }

    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service(_))
    }

    /// The service name, when this target is a service.
    pub fn service_name(&self) -> Option<&str> {
        match self {
            Self::Service(name) => Some(name),
            _ => None,
        }
    }
}

/// Where the container for a deploy comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A fully qualified container image reference.
    Image(String),
    /// A source directory to build and deploy from.
    SourceDir(String),
}

impl ImageSource {
    /// Resolve from the two raw inputs; setting both is contradictory.
    pub fn resolve(
        image: Option<String>,
        source: Option<String>,
    ) -> Result<Option<Self>, Error> {
        match (image, source) {
            (Some(_), Some(_)) => Err(Error::Configuration(
                "only one of image or source directory may be set".into(),
            )),
            (Some(image), None) => Ok(Some(Self::Image(image))),
            (None, Some(source)) => Ok(Some(Self::SourceDir(source))),
            (None, None) => Ok(None),
        }
    }
}

/// A requested traffic split, by revision name or by tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrafficSpec {
    /// Percentages keyed by revision name.
    ToRevisions(KeyValueMap),
    /// Percentages keyed by tag.
    ToTags(KeyValueMap),
}

impl TrafficSpec {
    /// Resolve from the two raw inputs; setting both is contradictory.
    pub fn resolve(
        revisions: Option<KeyValueMap>,
        tags: Option<KeyValueMap>,
    ) -> Result<Option<Self>, Error> {
        match (revisions, tags) {
            (Some(_), Some(_)) => Err(Error::Configuration(
                "only one of revision traffic or tag traffic may be set".into(),
            )),
            (Some(split), None) => Ok(Some(Self::ToRevisions(split))),
            (None, Some(split)) => Ok(Some(Self::ToTags(split))),
            (None, None) => Ok(None),
        }
    }

    /// The update-traffic flag this split is passed with.
    pub fn flag(&self) -> &'static str {
        match self {
            Self::ToRevisions(_) => "--to-revisions",
            Self::ToTags(_) => "--to-tags",
        }
    }

    /// The percentage split itself.
    pub fn split(&self) -> &KeyValueMap {
        match self {
            Self::ToRevisions(split) | Self::ToTags(split) => split,
        }
    }
}

/// Whether a key/value set is unioned with the upstream state or replaces
/// it wholesale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateStrategy {
    #[default]
    Merge,
    Overwrite,
}

impl UpdateStrategy {
    /// The env-var flag this strategy maps to.
    pub fn env_vars_flag(self) -> &'static str {
        match self {
            Self::Merge => "--update-env-vars",
            Self::Overwrite => "--set-env-vars",
        }
    }

    /// The secrets flag this strategy maps to.
    pub fn secrets_flag(self) -> &'static str {
        match self {
            Self::Merge => "--update-secrets",
            Self::Overwrite => "--set-secrets",
        }
    }
}

impl FromStr for UpdateStrategy {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Error> {
        match raw {
            "merge" => Ok(Self::Merge),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(Error::Configuration(format!(
                "unknown update strategy '{other}', expected 'merge' or 'overwrite'"
            ))),
        }
    }
}

/// Release track of the deployment CLI to run commands under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Alpha,
    Beta,
}

impl Component {
    /// The leading command token this component emits.
    pub fn as_arg(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Beta => "beta",
        }
    }
}

impl FromStr for Component {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Error> {
        match raw {
            "alpha" => Ok(Self::Alpha),
            "beta" => Ok(Self::Beta),
            other => Err(Error::Configuration(format!(
                "unknown gcloud component '{other}', expected 'alpha' or 'beta'"
            ))),
        }
    }
}

/// The validated, typed form of all user-supplied deployment options.
///
/// Constructed once per invocation at the input boundary; the builder never
/// mutates it.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub target: Target,
    pub image_source: Option<ImageSource>,

    /// Explicit env var pairs; win over `file_env_vars` on collision.
    pub env_vars: KeyValueMap,
    /// Supplementary env vars sourced from a file.
    pub file_env_vars: KeyValueMap,
    /// Secrets; keys starting with `/` are mount paths (volume secrets),
    /// all other keys are env-var-backed secrets.
    pub secrets: KeyValueMap,
    /// User labels; win over the injected defaults on collision.
    pub labels: KeyValueMap,

    pub env_var_strategy: UpdateStrategy,
    pub secret_strategy: UpdateStrategy,

    pub traffic: Option<TrafficSpec>,
    /// Traffic tag assigned to the new revision, and preferred when
    /// extracting the URL from the deploy response.
    pub tag: Option<String>,
    pub revision_suffix: Option<String>,
    pub no_traffic: bool,
    pub timeout: Option<String>,

    pub regions: Vec<String>,
    pub project_id: Option<String>,
    /// Revision recorded in the default `commit-sha` label.
    pub commit_sha: Option<String>,
    pub skip_default_labels: bool,
    pub component: Option<Component>,

    /// Raw pass-through flags appended to the deploy/replace command.
    pub flags: Option<String>,
    /// Raw pass-through flags appended to the update-traffic command.
    pub update_traffic_flags: Option<String>,
}

impl DeploymentRequest {
    /// A request with the given target and everything else unset.
    pub fn new(target: Target) -> Self {
        Self {
            target,
            image_source: None,
            env_vars: KeyValueMap::new(),
            file_env_vars: KeyValueMap::new(),
            secrets: KeyValueMap::new(),
            labels: KeyValueMap::new(),
            env_var_strategy: UpdateStrategy::default(),
            secret_strategy: UpdateStrategy::default(),
            traffic: None,
            tag: None,
            revision_suffix: None,
            no_traffic: false,
            timeout: None,
            regions: Vec::new(),
            project_id: None,
            commit_sha: None,
            skip_default_labels: false,
            component: None,
            flags: None,
            update_traffic_flags: None,
        }
    }
}
