//! Utility functions

use colored::Colorize;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::cluster::client::KubeClusterApi;
use crate::storage::settings::Settings;

/// Version information for the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Result of one diagnostic check
#[derive(Debug, Clone)]
pub struct Check {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl Check {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Check the external tools and services a deploy depends on and print a report.
/// Returns whether every check passed.
pub async fn run_diagnostic(settings: &Settings) -> bool {
    let version = version_info();
    println!(
        "{} {} ({})",
        "kubeship".bold(),
        version.version,
        version.git_hash
    );
    println!();

    let checks = vec![
        command_check("git", "git", &["--version"]).await,
        command_check("docker", "docker", &["--version"]).await,
        command_check("docker daemon", "docker", &["info", "--format", "{{.ServerVersion}}"]).await,
        cluster_check(settings).await,
        config_check(
            "registry credentials",
            !settings.registry.username.is_empty() && settings.registry.password.is_some(),
            &settings.registry.username,
        ),
        config_check(
            "github oauth",
            !settings.github.client_id.is_empty() && settings.github.client_secret.is_some(),
            &settings.github.client_id,
        ),
    ];

    for check in &checks {
        let status = if check.passed {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        println!("  [{}] {:<22} {}", status, check.name, check.detail.dimmed());
    }

    let failed = checks.iter().filter(|c| !c.passed).count();
    println!();
    if failed == 0 {
        println!("{}", "All checks passed".green());
    } else {
        println!("{}", format!("{} check(s) failed", failed).yellow());
    }
    failed == 0
}

async fn command_check(name: &'static str, program: &str, args: &[&str]) -> Check {
    match Command::new(program).args(args).output().await {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            Check::pass(name, stdout.lines().next().unwrap_or("").trim().to_string())
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Check::fail(name, stderr.lines().next().unwrap_or("").trim().to_string())
        }
        Err(e) => Check::fail(name, format!("{} not found: {}", program, e)),
    }
}

async fn cluster_check(settings: &Settings) -> Check {
    let name = "kubernetes";
    let api = match KubeClusterApi::connect(
        settings.cluster.kubeconfig_path.as_deref(),
        &settings.cluster.namespace,
    )
    .await
    {
        Ok(api) => api,
        Err(e) => return Check::fail(name, e.to_string()),
    };

    match api.ping().await {
        Ok(_) => Check::pass(name, format!("namespace {} reachable", api.namespace())),
        Err(e) => Check::fail(name, e.to_string()),
    }
}

fn config_check(name: &'static str, configured: bool, identity: &str) -> Check {
    if configured {
        Check::pass(name, identity.to_string())
    } else {
        Check::fail(name, "not configured")
    }
}
