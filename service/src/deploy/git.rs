//! Source checkout

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::errors::AppError;

/// Source control collaborator
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Clone `repo_url` into `target_dir`, which exists and is empty
    async fn clone_repo(&self, repo_url: &str, target_dir: &Path) -> Result<(), AppError>;
}

/// Clones with the `git` CLI
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: String,
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            binary: "git".to_string(),
        }
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SourceControl for GitCli {
    async fn clone_repo(&self, repo_url: &str, target_dir: &Path) -> Result<(), AppError> {
        info!("Cloning repository: {}", repo_url);

        let mut cmd = Command::new(&self.binary);
        cmd.args(["clone", "--depth", "1"]);
        cmd.arg(repo_url).arg(target_dir);
        // Never block on a credential prompt
        cmd.env("GIT_TERMINAL_PROMPT", "0");

        debug!("Running git clone into {}...", target_dir.display());
        let output = cmd
            .output()
            .await
            .map_err(|e| AppError::CloneError(format!("Failed to run git clone: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Error cloning repository: {}", stderr.trim());
            return Err(AppError::CloneError(format!(
                "git clone exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        info!("Successfully cloned repository");
        Ok(())
    }
}
