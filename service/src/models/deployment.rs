//! Deployment models

use std::fmt;

use serde::{Deserialize, Serialize};

/// Replica count used when the caller does not override it
pub const DEFAULT_REPLICAS: i32 = 2;

/// Port reported when nothing better is known
pub const DEFAULT_PORT: u16 = 8000;

/// Normalize a user supplied name into a registry and resource safe token.
///
/// Lowercases, replaces `_`, `.` and spaces with `-`, then strips leading and
/// trailing `-`. Idempotent; may return an empty string.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(['_', '.', ' '], "-")
        .trim_matches('-')
        .to_string()
}

/// Input of the image pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    /// Repository clone URL
    pub source_url: String,

    /// Registry safe image name
    pub image_name: String,

    /// Image tag
    pub tag: String,
}

impl BuildSpec {
    /// Create a build spec, normalizing the image name
    pub fn new(source_url: impl Into<String>, image_name: &str, tag: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            image_name: normalize_name(image_name),
            tag: tag.into(),
        }
    }
}

/// A fully qualified image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Optional registry host, e.g. `ghcr.io`
    pub registry: Option<String>,

    /// Registry account the image is pushed under
    pub username: String,

    pub name: String,
    pub tag: String,
}

impl ImageRef {
    pub fn new(
        registry: Option<&str>,
        username: impl Into<String>,
        name: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            registry: registry.filter(|r| !r.is_empty()).map(str::to_string),
            username: username.into(),
            name: name.into(),
            tag: tag.into(),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}/{}:{}", self.username, self.name, self.tag)
    }
}

/// Desired state of one Deployment + Service pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentSpec {
    /// Resource name, also the `app` selector label value
    pub name: String,
    pub image: String,
    pub port: u16,
    pub replicas: i32,
}

impl DeploymentSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            port,
            replicas: DEFAULT_REPLICAS,
        }
    }

    pub fn with_replicas(mut self, replicas: i32) -> Self {
        self.replicas = replicas;
        self
    }
}

/// A deployment as reported by the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub name: String,

    /// Desired replica count
    pub replicas: i32,

    pub available_replicas: i32,
    pub ready_replicas: i32,

    /// Image of the first container
    pub image: String,

    /// Externally reachable port
    pub port: u16,
}

/// Outcome of deleting a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub name: String,
    pub message: String,

    /// Whether the locally cached image was removed
    pub image_removed: bool,
}
