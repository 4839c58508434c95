//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::authn::github::{Endpoints, OAuthApp};
use crate::deploy::pipeline::{self, RegistryCredentials};
use crate::storage::settings::Settings;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// GitHub OAuth application
    pub oauth: OAuthApp,

    /// GitHub endpoints
    pub github_endpoints: Endpoints,

    /// Registry account images are pushed under
    pub registry: RegistryCredentials,

    /// Kubernetes target
    pub cluster: ClusterOptions,

    /// Image build options
    pub pipeline: pipeline::Options,

    /// Session lifetime
    pub session_ttl: chrono::Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            server: ServerOptions::default(),
            oauth: OAuthApp {
                client_id: String::new(),
                client_secret: SecretString::from(String::new()),
                redirect_uri: "http://localhost:5000/callback".to_string(),
            },
            github_endpoints: Endpoints::default(),
            registry: RegistryCredentials {
                registry: None,
                username: String::new(),
                password: SecretString::from(String::new()),
            },
            cluster: ClusterOptions::default(),
            pipeline: pipeline::Options::default(),
            session_ttl: chrono::Duration::hours(24),
        }
    }
}

impl AppOptions {
    /// Options derived from loaded settings
    pub fn from_settings(settings: &Settings) -> Self {
        let empty = || SecretString::from(String::new());

        Self {
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            oauth: OAuthApp {
                client_id: settings.github.client_id.clone(),
                client_secret: settings.github.client_secret.clone().unwrap_or_else(empty),
                redirect_uri: settings.github.redirect_uri.clone(),
            },
            registry: RegistryCredentials {
                registry: settings.registry.host.clone(),
                username: settings.registry.username.clone(),
                password: settings.registry.password.clone().unwrap_or_else(empty),
            },
            cluster: ClusterOptions {
                namespace: settings.cluster.namespace.clone(),
                kubeconfig_path: settings.cluster.kubeconfig_path.clone(),
            },
            pipeline: pipeline::Options {
                work_dir: settings.build.work_dir.clone(),
            },
            session_ttl: chrono::Duration::hours(settings.session_ttl_hours.max(1)),
            ..Default::default()
        }
    }
}

/// Lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Cluster connection options
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    pub namespace: String,

    /// Explicit kubeconfig; in-cluster or `~/.kube/config` resolution when unset
    pub kubeconfig_path: Option<PathBuf>,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            kubeconfig_path: None,
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}
