//! GitHub OAuth and REST client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use crate::errors::AppError;
use crate::models::repo::{RepoSummary, UserProfile};

pub const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const API_URL: &str = "https://api.github.com";

const OAUTH_SCOPE: &str = "repo read:user";
const REPOS_PER_PAGE: usize = 100;
const USER_AGENT: &str = concat!("kubeship/", env!("CARGO_PKG_VERSION"));

/// OAuth collaborator
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// URL the browser is sent to for login
    fn authorize_url(&self) -> String;

    /// Exchange an authorization code for an access token
    async fn exchange_code(&self, code: &str) -> Result<SecretString, AppError>;

    async fn user_profile(&self, token: &SecretString) -> Result<UserProfile, AppError>;

    /// Repositories of the authenticated user, most recently updated first
    async fn list_repos(&self, token: &SecretString) -> Result<Vec<RepoSummary>, AppError>;
}

/// OAuth application settings
#[derive(Debug, Clone)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
}

/// GitHub endpoints, overridable for GitHub Enterprise
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub api_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            api_url: API_URL.to_string(),
        }
    }
}

/// GitHub client for the OAuth flow and repository listing
pub struct GitHubClient {
    client: Client,
    app: OAuthApp,
    endpoints: Endpoints,
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(app: OAuthApp, endpoints: Endpoints) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            app,
            endpoints: Endpoints {
                api_url: endpoints.api_url.trim_end_matches('/').to_string(),
                ..endpoints
            },
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        token: &SecretString,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let url = format!("{}{}", self.endpoints.api_url, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("token {}", token.expose_secret()))
            .header(header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET failed: {} - {}", status, body);
            return Err(AppError::AuthError(format!("{}: {}", status, body)));
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[async_trait]
impl OAuthProvider for GitHubClient {
    fn authorize_url(&self) -> String {
        match Url::parse_with_params(
            &self.endpoints.authorize_url,
            &[
                ("client_id", self.app.client_id.as_str()),
                ("redirect_uri", self.app.redirect_uri.as_str()),
                ("scope", OAUTH_SCOPE),
            ],
        ) {
            Ok(url) => url.to_string(),
            Err(e) => {
                error!("Invalid authorize URL {}: {}", self.endpoints.authorize_url, e);
                self.endpoints.authorize_url.clone()
            }
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<SecretString, AppError> {
        debug!("POST {} (code exchange)", self.endpoints.token_url);

        let response = self
            .client
            .post(&self.endpoints.token_url)
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.app.client_id.as_str()),
                ("client_secret", self.app.client_secret.expose_secret()),
                ("code", code),
                ("redirect_uri", self.app.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            error!("Code exchange failed: {}", status);
            return Err(AppError::AuthError(format!("Code exchange failed: {}", status)));
        }

        let body: TokenResponse = response.json().await?;
        match body.access_token {
            Some(token) if !token.is_empty() => Ok(SecretString::from(token)),
            _ => Err(AppError::AuthError(format!(
                "No access token in response: {}",
                body.error_description
                    .or(body.error)
                    .unwrap_or_else(|| "unknown error".to_string())
            ))),
        }
    }

    async fn user_profile(&self, token: &SecretString) -> Result<UserProfile, AppError> {
        self.get_json("/user", token, &[]).await
    }

    async fn list_repos(&self, token: &SecretString) -> Result<Vec<RepoSummary>, AppError> {
        let mut repos = Vec::new();
        let mut page = 1u32;

        loop {
            let query = [
                ("page", page.to_string()),
                ("per_page", REPOS_PER_PAGE.to_string()),
                ("sort", "updated".to_string()),
            ];
            let batch: Vec<RepoSummary> = match self.get_json("/user/repos", token, &query).await {
                Ok(batch) => batch,
                // Keep what we have once at least one page came back
                Err(e) if page > 1 => {
                    error!("Stopping repository listing at page {}: {}", page, e);
                    break;
                }
                Err(e) => return Err(e),
            };

            let count = batch.len();
            repos.extend(batch);
            if count < REPOS_PER_PAGE {
                break;
            }
            page += 1;
        }

        debug!("Fetched {} repositories", repos.len());
        Ok(repos)
    }
}
