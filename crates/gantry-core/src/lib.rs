//! Gantry Core Library
//!
//! Compiles declarative Cloud Run deployment options into gcloud
//! invocations and parses the JSON responses back into a small set of
//! stable outputs (primarily the service URL).

pub mod build;
pub mod error;
pub mod flags;
pub mod kv;
pub mod metadata;
pub mod plan;
pub mod request;
pub mod response;

/// Re-exports of commonly used types
pub mod prelude {
    // Building
    pub use crate::build::build_plan;
    pub use crate::plan::{CommandPlan, PlannedCommand, ResponseShape};
    pub use crate::request::{
        Component, DeploymentRequest, ImageSource, Target, TrafficSpec, UpdateStrategy,
    };

    // Parsing
    pub use crate::response::{DeploymentResult, parse_response};

    // Metadata
    pub use crate::metadata::{FileMetadataReader, MetadataDocument, MetadataReader, ResourceKind};

    // Shared
    pub use crate::error::Error;
    pub use crate::flags::parse_flags;
    pub use crate::kv::KeyValueMap;
}
