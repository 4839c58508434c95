//! Application state management

use std::sync::Arc;

use tracing::{info, warn};

use crate::app::options::{AppOptions, ClusterOptions};
use crate::authn::github::{GitHubClient, OAuthProvider};
use crate::authn::session::SessionStore;
use crate::cluster::api::ClusterApi;
use crate::cluster::client::KubeClusterApi;
use crate::cluster::deployer::ClusterDeployer;
use crate::deploy::docker::{ContainerBuilder, DockerCli};
use crate::deploy::git::{GitCli, SourceControl};
use crate::deploy::orchestrator::DeploymentOrchestrator;
use crate::deploy::pipeline::ImageBuildPipeline;
use crate::errors::AppError;

/// Main application state
pub struct AppState {
    /// Service version
    pub version: String,

    /// GitHub OAuth collaborator
    pub oauth: Arc<dyn OAuthProvider>,

    /// Logged in browser sessions
    pub sessions: Arc<SessionStore>,

    /// Build then deploy workflow
    pub orchestrator: Arc<DeploymentOrchestrator>,

    /// Direct cluster operations (list, status, delete)
    pub deployer: Arc<ClusterDeployer>,
}

impl AppState {
    /// Wire the production collaborators: git and docker CLIs, the GitHub API
    /// and the Kubernetes API server
    pub async fn init(version: String, options: &AppOptions) -> Result<Self, AppError> {
        info!("Initializing application state...");

        let source: Arc<dyn SourceControl> = Arc::new(GitCli::new());
        let builder: Arc<dyn ContainerBuilder> =
            Arc::new(DockerCli::new(options.registry.registry.clone()));
        let cluster = connect_cluster(&options.cluster).await;

        let oauth = Arc::new(GitHubClient::new(
            options.oauth.clone(),
            options.github_endpoints.clone(),
        )?);

        Ok(Self::assemble(version, options, source, builder, cluster, oauth))
    }

    /// Assemble state from explicit collaborators. A `None` cluster disables
    /// every cluster operation.
    pub fn assemble(
        version: String,
        options: &AppOptions,
        source: Arc<dyn SourceControl>,
        builder: Arc<dyn ContainerBuilder>,
        cluster: Option<Arc<dyn ClusterApi>>,
        oauth: Arc<dyn OAuthProvider>,
    ) -> Self {
        let registry = options.registry.registry.clone();
        let registry_user = options.registry.username.clone();

        let deployer = Arc::new(match cluster {
            Some(api) => ClusterDeployer::new(api, builder.clone(), registry, registry_user),
            None => ClusterDeployer::disabled(builder.clone(), registry, registry_user),
        });

        let pipeline = Arc::new(ImageBuildPipeline::new(
            source,
            builder,
            options.registry.clone(),
            options.pipeline.clone(),
        ));
        let orchestrator = Arc::new(DeploymentOrchestrator::new(pipeline, deployer.clone()));

        Self {
            version,
            oauth,
            sessions: Arc::new(SessionStore::new(options.session_ttl)),
            orchestrator,
            deployer,
        }
    }
}

/// Connect to the cluster, or `None` when no credentials can be loaded
async fn connect_cluster(options: &ClusterOptions) -> Option<Arc<dyn ClusterApi>> {
    match KubeClusterApi::connect(options.kubeconfig_path.as_deref(), &options.namespace).await {
        Ok(api) => Some(Arc::new(api)),
        Err(e) => {
            warn!("Kubernetes is not configured, cluster operations are disabled: {}", e);
            None
        }
    }
}
