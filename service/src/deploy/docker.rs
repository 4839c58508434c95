//! Container image builder

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::errors::AppError;

/// Container builder collaborator
#[async_trait]
pub trait ContainerBuilder: Send + Sync {
    /// Build the image in `context_dir` and tag it as `tag`
    async fn build(&self, context_dir: &Path, tag: &str) -> Result<(), AppError>;

    /// Authenticate against the registry
    async fn login(&self, username: &str, password: &SecretString) -> Result<(), AppError>;

    /// Push a previously built image
    async fn push(&self, tag: &str) -> Result<(), AppError>;

    /// Remove the locally cached image
    async fn remove_image(&self, tag: &str) -> Result<(), AppError>;
}

/// Drives the `docker` CLI
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,

    /// Registry host passed to `docker login`; Docker Hub when unset
    registry: Option<String>,
}

impl DockerCli {
    pub fn new(registry: Option<String>) -> Self {
        Self {
            binary: "docker".to_string(),
            registry: registry.filter(|r| !r.is_empty()),
        }
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl ContainerBuilder for DockerCli {
    async fn build(&self, context_dir: &Path, tag: &str) -> Result<(), AppError> {
        info!("Building image: {}", tag);

        let output = Command::new(&self.binary)
            .current_dir(context_dir)
            .args(["build", "-t", tag, "."])
            .output()
            .await
            .map_err(|e| AppError::BuildError(format!("Failed to run docker build: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Error building image: {}", stderr.trim());
            return Err(AppError::BuildError(format!(
                "docker build exited with {}: {}",
                output.status,
                last_lines(&stderr, 20)
            )));
        }

        info!("Successfully built image: {}", tag);
        Ok(())
    }

    async fn login(&self, username: &str, password: &SecretString) -> Result<(), AppError> {
        debug!("Logging into registry as {}", username);

        let mut cmd = Command::new(&self.binary);
        cmd.arg("login");
        if let Some(registry) = &self.registry {
            cmd.arg(registry);
        }
        let mut child = cmd
            .args(["-u", username, "--password-stdin"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::RegistryAuthError(format!("Failed to run docker login: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(password.expose_secret().as_bytes())
                .await
                .map_err(|e| AppError::RegistryAuthError(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| AppError::RegistryAuthError(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Error logging into registry: {}", stderr.trim());
            return Err(AppError::RegistryAuthError(stderr.trim().to_string()));
        }

        debug!("Successfully authenticated with registry");
        Ok(())
    }

    async fn push(&self, tag: &str) -> Result<(), AppError> {
        info!("Pushing image: {}", tag);

        let output = Command::new(&self.binary)
            .args(["push", tag])
            .output()
            .await
            .map_err(|e| AppError::PushError(format!("Failed to run docker push: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Error pushing image: {}", stderr.trim());
            return Err(AppError::PushError(stderr.trim().to_string()));
        }

        info!("Successfully pushed image: {}", tag);
        Ok(())
    }

    async fn remove_image(&self, tag: &str) -> Result<(), AppError> {
        debug!("Removing image: {}", tag);

        let status = Command::new(&self.binary)
            .args(["rmi", tag])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to run docker rmi: {}", e)))?;

        if !status.success() {
            return Err(AppError::Internal(format!("docker rmi {} exited with {}", tag, status)));
        }
        Ok(())
    }
}

/// Keep the tail of long tool output for error messages
fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
