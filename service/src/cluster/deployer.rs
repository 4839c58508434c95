//! Cluster deployer
//!
//! Owns the Deployment + Service pair behind every deployed name. Redeploying a
//! name is the update path: an existing Deployment only has its image swapped.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::cluster::api::{ClusterApi, ClusterApiError};
use crate::cluster::manifest;
use crate::deploy::docker::ContainerBuilder;
use crate::errors::AppError;
use crate::models::deployment::{DeletionReport, DeploymentRecord, DeploymentSpec, ImageRef};

/// Tag of images built for deployments
pub const DEFAULT_TAG: &str = "latest";

/// Deploys built images to the cluster
pub struct ClusterDeployer {
    /// `None` when cluster credentials could not be loaded at startup
    api: Option<Arc<dyn ClusterApi>>,
    builder: Arc<dyn ContainerBuilder>,

    /// Account used to derive the local image tag removed on delete
    registry: Option<String>,
    registry_user: String,
}

impl ClusterDeployer {
    pub fn new(
        api: Arc<dyn ClusterApi>,
        builder: Arc<dyn ContainerBuilder>,
        registry: Option<String>,
        registry_user: impl Into<String>,
    ) -> Self {
        Self {
            api: Some(api),
            builder,
            registry,
            registry_user: registry_user.into(),
        }
    }

    /// A deployer whose every operation fails with
    /// [`AppError::ClusterNotConfigured`]
    pub fn disabled(
        builder: Arc<dyn ContainerBuilder>,
        registry: Option<String>,
        registry_user: impl Into<String>,
    ) -> Self {
        Self {
            api: None,
            builder,
            registry,
            registry_user: registry_user.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api.is_some()
    }

    fn api(&self) -> Result<&Arc<dyn ClusterApi>, AppError> {
        self.api.as_ref().ok_or(AppError::ClusterNotConfigured)
    }

    /// Create the Deployment, or swap the image of the existing one
    pub async fn create_or_update(&self, spec: &DeploymentSpec) -> Result<String, AppError> {
        let api = self.api()?;

        match api.create_deployment(&manifest::deployment(spec)).await {
            Ok(created) => {
                let name = created.metadata.name.unwrap_or_else(|| spec.name.clone());
                info!("Deployment created: {}", name);
                Ok(name)
            }
            Err(ClusterApiError::AlreadyExists(_)) => {
                info!("Deployment {} already exists, updating image", spec.name);
                self.update_image(api, &spec.name, &spec.image).await
            }
            Err(e) => {
                error!("Error creating deployment: {}", e);
                Err(AppError::ClusterCreateError(e.to_string()))
            }
        }
    }

    async fn update_image(
        &self,
        api: &Arc<dyn ClusterApi>,
        name: &str,
        image: &str,
    ) -> Result<String, AppError> {
        let mut deployment = api.get_deployment(name).await.map_err(|e| {
            error!("Error reading deployment {}: {}", name, e);
            AppError::ClusterUpdateError(e.to_string())
        })?;

        if !manifest::set_image(&mut deployment, image) {
            return Err(AppError::ClusterUpdateError(format!(
                "deployment {} has no container",
                name
            )));
        }

        let updated = api
            .replace_deployment(name, &deployment)
            .await
            .map_err(|e| {
                error!("Error updating deployment: {}", e);
                AppError::ClusterUpdateError(e.to_string())
            })?;

        let name = updated.metadata.name.unwrap_or_else(|| name.to_string());
        info!("Deployment updated: {}", name);
        Ok(name)
    }

    /// Create the Service for `name`; an existing Service is left as is
    pub async fn ensure_service(&self, name: &str, port: u16) -> Result<String, AppError> {
        let api = self.api()?;

        match api.create_service(&manifest::service(name, port)).await {
            Ok(created) => {
                let name = created.metadata.name.unwrap_or_else(|| name.to_string());
                info!("Service created: {}", name);
                Ok(name)
            }
            Err(ClusterApiError::AlreadyExists(_)) => {
                info!("Service {} already exists", name);
                Ok(name.to_string())
            }
            Err(e) => {
                error!("Error creating service: {}", e);
                Err(AppError::ClusterCreateError(e.to_string()))
            }
        }
    }

    /// Create or update the Deployment, then expose it
    pub async fn deploy(&self, spec: &DeploymentSpec) -> Result<String, AppError> {
        self.api()?;

        self.create_or_update(spec).await.map_err(|e| match e {
            AppError::ClusterUpdateError(msg) => {
                AppError::ClusterUpdateError(format!("Deployment failed: {}", msg))
            }
            other => AppError::ClusterCreateError(format!("Deployment failed: {}", other)),
        })?;

        self.ensure_service(&spec.name, spec.port)
            .await
            .map_err(|e| AppError::ClusterCreateError(format!("Service creation failed: {}", e)))?;

        Ok(format!("Application deployed successfully: {}", spec.name))
    }

    /// Current state of one deployment
    pub async fn status(&self, name: &str) -> Result<DeploymentRecord, AppError> {
        let api = self.api()?;

        let deployment = api.get_deployment(name).await.map_err(|e| match e {
            ClusterApiError::NotFound(_) => AppError::ClusterNotFound(name.to_string()),
            e => AppError::Internal(format!("Error getting deployment status: {}", e)),
        })?;

        let port = self.service_port(api, name).await;
        Ok(manifest::record(&deployment, port))
    }

    /// All deployments in the namespace, each joined with its Service
    pub async fn list(&self) -> Result<Vec<DeploymentRecord>, AppError> {
        let api = self.api()?;

        let deployments = api
            .list_deployments()
            .await
            .map_err(|e| AppError::Internal(format!("Error listing deployments: {}", e)))?;

        let mut records = Vec::with_capacity(deployments.len());
        for deployment in &deployments {
            let port = match &deployment.metadata.name {
                Some(name) => self.service_port(api, name).await,
                None => None,
            };
            records.push(manifest::record(deployment, port));
        }
        Ok(records)
    }

    async fn service_port(&self, api: &Arc<dyn ClusterApi>, name: &str) -> Option<u16> {
        match api.get_service(name).await {
            Ok(service) => manifest::exposed_port(&service),
            Err(e) => {
                warn!("Unable to read service {}: {}", name, e);
                None
            }
        }
    }

    /// Delete the Deployment and Service, then try to drop the cached image
    pub async fn delete(&self, name: &str) -> Result<DeletionReport, AppError> {
        let api = self.api()?;

        api.delete_deployment(name).await.map_err(|e| match e {
            ClusterApiError::NotFound(_) => AppError::ClusterNotFound(name.to_string()),
            e => {
                error!("Error deleting deployment {}: {}", name, e);
                AppError::Internal(e.to_string())
            }
        })?;

        let mut message = match api.delete_service(name).await {
            Ok(()) => format!("Deleted deployment and service: {}", name),
            Err(ClusterApiError::NotFound(_)) => {
                format!("Deleted deployment: {} (no service to remove)", name)
            }
            Err(e) => {
                warn!("Error deleting service {}: {}", name, e);
                format!("Deleted deployment: {} (service cleanup failed: {})", name, e)
            }
        };

        let image = ImageRef::new(
            self.registry.as_deref(),
            &self.registry_user,
            name,
            DEFAULT_TAG,
        );
        let image_removed = match self.builder.remove_image(&image.to_string()).await {
            Ok(()) => {
                message.push_str(" and cleaned up Docker image");
                true
            }
            Err(e) => {
                warn!("Could not remove Docker image {}: {}", image, e);
                message.push_str(" (image cleanup skipped - may be in use)");
                false
            }
        };

        info!("{}", message);
        Ok(DeletionReport {
            name: name.to_string(),
            message,
            image_removed,
        })
    }
}
