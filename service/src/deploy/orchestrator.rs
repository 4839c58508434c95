//! Deploy workflow: image pipeline first, cluster second

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::cluster::deployer::{ClusterDeployer, DEFAULT_TAG};
use crate::deploy::pipeline::ImageBuildPipeline;
use crate::errors::{AppError, OrchestrationFailure, OrchestrationStage};
use crate::models::deployment::{normalize_name, BuildSpec, DeploymentSpec, DEFAULT_PORT, DEFAULT_REPLICAS};

/// A successfully deployed application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployedApp {
    /// Pushed image reference
    pub image: String,

    /// Deployment and Service name
    pub deployment: String,

    pub port: u16,
}

/// Glues the image pipeline to the cluster deployer
pub struct DeploymentOrchestrator {
    pipeline: Arc<ImageBuildPipeline>,
    deployer: Arc<ClusterDeployer>,
}

impl DeploymentOrchestrator {
    pub fn new(pipeline: Arc<ImageBuildPipeline>, deployer: Arc<ClusterDeployer>) -> Self {
        Self { pipeline, deployer }
    }

    /// Build `source_url` and deploy it under the normalized `display_name`.
    ///
    /// A failure tagged `docker_build` means no image was pushed; `k8s_deploy`
    /// means the image is in the registry and only the cluster side needs a
    /// retry.
    pub async fn run(
        &self,
        source_url: &str,
        display_name: &str,
    ) -> Result<DeployedApp, OrchestrationFailure> {
        let name = normalize_name(display_name);
        if name.is_empty() {
            return Err(OrchestrationFailure::new(
                OrchestrationStage::DockerBuild,
                AppError::ValidationError("repository name is empty".to_string()),
            ));
        }
        info!("Deploying {} as {}", source_url, name);

        let spec = BuildSpec::new(source_url, &name, DEFAULT_TAG);
        let built = self.pipeline.build_and_push(&spec).await.map_err(|e| {
            error!("Image build for {} failed: {}", name, e);
            OrchestrationFailure::new(OrchestrationStage::DockerBuild, e)
        })?;

        let image = built.image.to_string();
        let port = built
            .detected
            .map(|kind| kind.default_port())
            .unwrap_or(DEFAULT_PORT);

        let deployment = DeploymentSpec::new(&name, &image, port).with_replicas(DEFAULT_REPLICAS);
        self.deployer.deploy(&deployment).await.map_err(|e| {
            error!("Cluster deploy for {} failed: {}", name, e);
            OrchestrationFailure::new(OrchestrationStage::K8sDeploy, e)
        })?;

        info!("Deployed {} (image: {}, port: {})", name, image, port);
        Ok(DeployedApp {
            image,
            deployment: name,
            port,
        })
    }
}
