//! Image build pipeline: clone, dockerize, build, authenticate, push

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::deploy::detect::ProjectKind;
use crate::deploy::docker::ContainerBuilder;
use crate::deploy::dockerfile::{self, DockerfileOutcome};
use crate::deploy::git::SourceControl;
use crate::errors::AppError;
use crate::models::deployment::{BuildSpec, ImageRef};

const WORKDIR_PREFIX: &str = "kubeship-build-";

/// Registry account images are pushed under
#[derive(Debug, Clone)]
pub struct RegistryCredentials {
    /// Registry host, Docker Hub when unset
    pub registry: Option<String>,
    pub username: String,
    pub password: SecretString,
}

impl RegistryCredentials {
    /// Reference for `name:tag` under this account
    pub fn image_ref(&self, name: &str, tag: &str) -> ImageRef {
        ImageRef::new(self.registry.as_deref(), &self.username, name, tag)
    }
}

/// Pipeline options
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Parent of the per-build scratch directories; system temp dir when unset
    pub work_dir: Option<PathBuf>,
}

/// A pushed image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltImage {
    pub image: ImageRef,

    /// Project type detected while synthesizing the Dockerfile, `None` when the
    /// repository shipped its own
    pub detected: Option<ProjectKind>,
}

/// Builds and pushes images from source repositories
pub struct ImageBuildPipeline {
    source: Arc<dyn SourceControl>,
    builder: Arc<dyn ContainerBuilder>,
    credentials: RegistryCredentials,
    options: Options,
}

impl ImageBuildPipeline {
    pub fn new(
        source: Arc<dyn SourceControl>,
        builder: Arc<dyn ContainerBuilder>,
        credentials: RegistryCredentials,
        options: Options,
    ) -> Self {
        Self {
            source,
            builder,
            credentials,
            options,
        }
    }

    /// Run the whole pipeline. Each step short-circuits on failure and the error
    /// variant names the stage that failed.
    pub async fn build_and_push(&self, spec: &BuildSpec) -> Result<BuiltImage, AppError> {
        // Removed on drop, whichever way this function exits
        let workdir = self.create_workdir().await?;
        let root = workdir.path();
        info!(
            "Building {} from {} in {}",
            spec.image_name,
            spec.source_url,
            root.display()
        );

        self.source.clone_repo(&spec.source_url, root).await?;

        let outcome = dockerfile::ensure_dockerfile(root).await;
        if let DockerfileOutcome::WriteFailed { error, .. } = &outcome {
            warn!("Continuing without a generated Dockerfile: {}", error);
        }

        let image = self.credentials.image_ref(&spec.image_name, &spec.tag);
        let tag = image.to_string();

        self.builder.build(root, &tag).await?;
        self.builder
            .login(&self.credentials.username, &self.credentials.password)
            .await?;
        self.builder.push(&tag).await?;

        info!("Image ready: {}", tag);
        Ok(BuiltImage {
            image,
            detected: outcome.detected_kind(),
        })
    }

    async fn create_workdir(&self) -> Result<TempDir, AppError> {
        let parent = match &self.options.work_dir {
            Some(parent) => {
                tokio::fs::create_dir_all(parent).await?;
                parent.clone()
            }
            None => std::env::temp_dir(),
        };

        let workdir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(WORKDIR_PREFIX)
                .tempdir_in(parent)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Workdir creation task failed: {}", e)))??;
        Ok(workdir)
    }
}
