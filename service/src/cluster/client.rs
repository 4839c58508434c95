//! kube-rs backed cluster API client

use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::{debug, info};

use crate::cluster::api::{ClusterApi, ClusterApiError};
use crate::errors::AppError;

/// Cluster API scoped to one namespace
#[derive(Clone)]
pub struct KubeClusterApi {
    namespace: String,
    deployments: Api<Deployment>,
    services: Api<Service>,
}

impl KubeClusterApi {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            deployments: Api::namespaced(client.clone(), namespace),
            services: Api::namespaced(client, namespace),
        }
    }

    /// Connect using the kubeconfig at `kubeconfig_path`, or the default
    /// resolution (KUBECONFIG, ~/.kube/config, in-cluster) when unset
    pub async fn connect(kubeconfig_path: Option<&Path>, namespace: &str) -> Result<Self, AppError> {
        let config = match kubeconfig_path {
            Some(path) => {
                debug!("Loading kubeconfig from {}", path.display());
                let kubeconfig = Kubeconfig::read_from(path)
                    .map_err(|e| AppError::ConfigError(format!("Failed to read kubeconfig: {}", e)))?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| AppError::ConfigError(format!("Invalid kubeconfig: {}", e)))?
            }
            None => Config::infer()
                .await
                .map_err(|e| AppError::ConfigError(format!("No cluster configuration found: {}", e)))?,
        };

        let client = Client::try_from(config)
            .map_err(|e| AppError::ConfigError(format!("Failed to create cluster client: {}", e)))?;

        info!("Kubernetes client ready (namespace: {})", namespace);
        Ok(Self::new(client, namespace))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Round trip to the API server, used by diagnostics
    pub async fn ping(&self) -> Result<usize, AppError> {
        let list = self
            .deployments
            .list(&ListParams::default().limit(1))
            .await
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        Ok(list.items.len())
    }
}

fn map_err(err: kube::Error) -> ClusterApiError {
    match err {
        kube::Error::Api(ae) if ae.code == 409 => ClusterApiError::AlreadyExists(ae.message),
        kube::Error::Api(ae) if ae.code == 404 => ClusterApiError::NotFound(ae.message),
        e => ClusterApiError::Api(e.to_string()),
    }
}

#[async_trait]
impl ClusterApi for KubeClusterApi {
    async fn create_deployment(&self, deployment: &Deployment) -> Result<Deployment, ClusterApiError> {
        self.deployments
            .create(&PostParams::default(), deployment)
            .await
            .map_err(map_err)
    }

    async fn get_deployment(&self, name: &str) -> Result<Deployment, ClusterApiError> {
        self.deployments.get(name).await.map_err(map_err)
    }

    async fn replace_deployment(
        &self,
        name: &str,
        deployment: &Deployment,
    ) -> Result<Deployment, ClusterApiError> {
        self.deployments
            .replace(name, &PostParams::default(), deployment)
            .await
            .map_err(map_err)
    }

    async fn list_deployments(&self) -> Result<Vec<Deployment>, ClusterApiError> {
        let list = self
            .deployments
            .list(&ListParams::default())
            .await
            .map_err(map_err)?;
        Ok(list.items)
    }

    async fn delete_deployment(&self, name: &str) -> Result<(), ClusterApiError> {
        self.deployments
            .delete(name, &DeleteParams::default())
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn create_service(&self, service: &Service) -> Result<Service, ClusterApiError> {
        self.services
            .create(&PostParams::default(), service)
            .await
            .map_err(map_err)
    }

    async fn get_service(&self, name: &str) -> Result<Service, ClusterApiError> {
        self.services.get(name).await.map_err(map_err)
    }

    async fn delete_service(&self, name: &str) -> Result<(), ClusterApiError> {
        self.services
            .delete(name, &DeleteParams::default())
            .await
            .map_err(map_err)?;
        Ok(())
    }
}
