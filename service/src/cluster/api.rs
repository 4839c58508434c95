//! Cluster API seam

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use thiserror::Error;

/// Errors from the cluster API, with the two conditions the deployer reacts to
/// kept apart from everything else
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterApiError {
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Api(String),
}

/// Namespaced Deployment and Service verbs
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn create_deployment(&self, deployment: &Deployment) -> Result<Deployment, ClusterApiError>;

    async fn get_deployment(&self, name: &str) -> Result<Deployment, ClusterApiError>;

    /// Replace an existing Deployment with `deployment`
    async fn replace_deployment(
        &self,
        name: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterApiError>;

    async fn list_deployments(&self) -> Result<Vec<Deployment>, ClusterApiError>;

    async fn delete_deployment(&self, name: &str) -> Result<(), ClusterApiError>;

    async fn create_service(&self, service: &Service) -> Result<Service, ClusterApiError>;

    async fn get_service(&self, name: &str) -> Result<Service, ClusterApiError>;

    async fn delete_service(&self, name: &str) -> Result<(), ClusterApiError>;
}
