//! Settings file and environment overrides

use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,

    /// Also write a daily rolling log file here
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// GitHub OAuth application
    #[serde(default)]
    pub github: GitHubSettings,

    /// Image registry account
    #[serde(default)]
    pub registry: RegistrySettings,

    /// Kubernetes target
    #[serde(default)]
    pub cluster: ClusterSettings,

    /// Image build configuration
    #[serde(default)]
    pub build: BuildSettings,

    /// Session lifetime in hours
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

fn default_session_ttl_hours() -> i64 {
    24
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_json: false,
            log_dir: None,
            server: ServerSettings::default(),
            github: GitHubSettings::default(),
            registry: RegistrySettings::default(),
            cluster: ClusterSettings::default(),
            build: BuildSettings::default(),
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    5000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// GitHub OAuth settings
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubSettings {
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: Option<SecretString>,

    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
}

fn default_redirect_uri() -> String {
    "http://localhost:5000/callback".to_string()
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            redirect_uri: default_redirect_uri(),
        }
    }
}

/// Registry settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrySettings {
    /// Registry host, Docker Hub when unset
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: Option<SecretString>,
}

/// Cluster settings
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSettings {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Explicit kubeconfig; standard resolution when unset
    #[serde(default)]
    pub kubeconfig_path: Option<PathBuf>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            kubeconfig_path: None,
        }
    }
}

/// Build settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildSettings {
    /// Parent directory of per-build checkouts
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

impl Settings {
    /// Read `file` when it exists, then apply environment overrides
    pub async fn load(file: &File) -> Result<Self, AppError> {
        let mut settings = if file.exists().await {
            debug!("Reading settings from {}", file.path().display());
            file.read_json::<Settings>().await?
        } else {
            debug!("No settings file at {}, using defaults", file.path().display());
            Settings::default()
        };

        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Override fields from environment style variables provided by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(level) = var("LOG_LEVEL") {
            match level.parse() {
                Ok(level) => self.log_level = level,
                Err(e) => warn!("Ignoring LOG_LEVEL: {}", e),
            }
        }
        if let Some(host) = var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SERVER_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!("Ignoring SERVER_PORT={}: {}", port, e),
            }
        }
        if let Some(id) = var("GITHUB_CLIENT_ID") {
            self.github.client_id = id;
        }
        if let Some(secret) = var("GITHUB_CLIENT_SECRET") {
            self.github.client_secret = Some(SecretString::from(secret));
        }
        if let Some(uri) = var("GITHUB_REDIRECT_URI") {
            self.github.redirect_uri = uri;
        }
        if let Some(host) = var("REGISTRY_HOST") {
            self.registry.host = Some(host);
        }
        if let Some(user) = var("DOCKERHUB_USERNAME") {
            self.registry.username = user;
        }
        if let Some(password) = var("DOCKERHUB_PASSWORD") {
            self.registry.password = Some(SecretString::from(password));
        }
        if let Some(namespace) = var("K8S_NAMESPACE") {
            self.cluster.namespace = namespace;
        }
        if let Some(path) = var("KUBECONFIG_PATH") {
            self.cluster.kubeconfig_path = Some(expand_home(&path));
        }
        if let Some(dir) = var("DEPLOYMENT_DIR") {
            self.build.work_dir = Some(PathBuf::from(dir));
        }
    }

    /// Problems that will make deploys fail; the service still starts
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.github.client_id.is_empty() || self.github.client_secret.is_none() {
            warnings.push("GitHub OAuth client is not configured; login will fail".to_string());
        }
        if self.registry.username.is_empty() || self.registry.password.is_none() {
            warnings.push("Registry credentials are not configured; pushes will fail".to_string());
        }
        warnings
    }
}

/// Expand a leading `~/` using `HOME`
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}
