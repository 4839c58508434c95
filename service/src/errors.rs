//! Error types for kubeship

use serde::Serialize;
use thiserror::Error;

/// Main error type for kubeship
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Failed to clone repository: {0}")]
    CloneError(String),

    #[error("Failed to create Dockerfile: {0}")]
    DockerizeError(String),

    #[error("Failed to build Docker image: {0}")]
    BuildError(String),

    #[error("Failed to login to registry: {0}")]
    RegistryAuthError(String),

    #[error("Failed to push image: {0}")]
    PushError(String),

    #[error("{0}")]
    ClusterCreateError(String),

    #[error("{0}")]
    ClusterUpdateError(String),

    #[error("Deployment not found: {0}")]
    ClusterNotFound(String),

    #[error("Kubernetes is not configured")]
    ClusterNotConfigured,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The image pipeline stage this error belongs to, if any
    pub fn build_stage(&self) -> Option<BuildStage> {
        match self {
            AppError::CloneError(_) => Some(BuildStage::Clone),
            AppError::DockerizeError(_) => Some(BuildStage::Dockerize),
            AppError::BuildError(_) => Some(BuildStage::Build),
            AppError::RegistryAuthError(_) => Some(BuildStage::Auth),
            AppError::PushError(_) => Some(BuildStage::Push),
            _ => None,
        }
    }
}

/// Image pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStage {
    Clone,
    Dockerize,
    Build,
    Auth,
    Push,
}

/// Top-level deploy workflow stage reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationStage {
    /// The image was never pushed
    DockerBuild,

    /// The image is in the registry but the cluster rejected it
    K8sDeploy,
}

impl std::fmt::Display for OrchestrationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestrationStage::DockerBuild => write!(f, "docker_build"),
            OrchestrationStage::K8sDeploy => write!(f, "k8s_deploy"),
        }
    }
}

/// A deploy workflow failure tagged with the stage that produced it
#[derive(Error, Debug)]
#[error("{stage} failed: {error}")]
pub struct OrchestrationFailure {
    pub stage: OrchestrationStage,
    #[source]
    pub error: AppError,
}

impl OrchestrationFailure {
    pub fn new(stage: OrchestrationStage, error: AppError) -> Self {
        Self { stage, error }
    }
}
