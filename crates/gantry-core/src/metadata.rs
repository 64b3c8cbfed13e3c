//! Declarative metadata files and the capability used to read them.
//!
//! A metadata file is a YAML or JSON document whose `kind` and
//! `metadata.name` fields are the only parts the builder inspects.

use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

/// Resource kind declared by a metadata file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Service,
    Job,
}

/// The fields of a metadata document the builder inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDocument {
    pub kind: ResourceKind,
    pub name: Option<String>,
}

/// Reads and parses a declarative metadata file.
///
/// The builder performs no file I/O of its own; it calls this capability
/// once when a metadata file drives the deployment.
pub trait MetadataReader {
    fn read(&self, path: &Path) -> Result<MetadataDocument, Error>;
}

/// Production reader: JSON for `.json` files, YAML otherwise.
#[derive(Debug, Default)]
pub struct FileMetadataReader;

impl MetadataReader for FileMetadataReader {
    fn read(&self, path: &Path) -> Result<MetadataDocument, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| Error::Metadata(format!("failed to read {}: {err}", path.display())))?;

        let raw: RawDocument = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&text)
                .map_err(|err| Error::Metadata(format!("{}: {err}", path.display())))?
        } else {
            serde_yaml_ng::from_str(&text)
                .map_err(|err| Error::Metadata(format!("{}: {err}", path.display())))?
        };

        let kind = match raw.kind.as_str() {
            "Service" => ResourceKind::Service,
            "Job" => ResourceKind::Job,
            other => {
                return Err(Error::Metadata(format!(
                    "{} declares unsupported kind '{other}', expected 'Service' or 'Job'",
                    path.display()
                )));
            }
        };

        Ok(MetadataDocument {
            kind,
            name: raw.metadata.and_then(|meta| meta.name),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    metadata: Option<RawObjectMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct RawObjectMeta {
    #[serde(default)]
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_service_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "service.yaml",
            "apiVersion: serving.knative.dev/v1\nkind: Service\nmetadata:\n  name: my-service\n",
        );

        let doc = FileMetadataReader.read(&path).unwrap();
        assert_eq!(doc.kind, ResourceKind::Service);
        assert_eq!(doc.name.as_deref(), Some("my-service"));
    }

    #[test]
    fn reads_job_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "job.json",
            r#"{"kind": "Job", "metadata": {"name": "nightly"}}"#,
        );

        let doc = FileMetadataReader.read(&path).unwrap();
        assert_eq!(doc.kind, ResourceKind::Job);
        assert_eq!(doc.name.as_deref(), Some("nightly"));
    }

    #[test]
    fn missing_name_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "service.yaml", "kind: Service\n");

        let doc = FileMetadataReader.read(&path).unwrap();
        assert_eq!(doc.name, None);
    }

    #[test]
    fn unsupported_kind_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "other.yaml", "kind: Deployment\n");

        let err = FileMetadataReader.read(&path).unwrap_err();
        assert!(err.to_string().contains("Deployment"));
    }

    #[test]
    fn missing_file_is_a_metadata_error() {
        let err = FileMetadataReader
            .read(Path::new("/does/not/exist.yaml"))
            .unwrap_err();
        assert!(matches!(err, Error::Metadata(_)));
    }
}
