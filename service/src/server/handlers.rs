//! HTTP request handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::authn::session::{clear_cookie, session_cookie, session_id};
use crate::models::deployment::{DeploymentRecord, DeletionReport};
use crate::models::repo::{RepoSummary, UserProfile};
use crate::server::auth::AuthSession;
use crate::server::error::ApiError;
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub cluster_configured: bool,
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "kubeship".to_string(),
        version: state.version.clone(),
        cluster_configured: state.deployer.is_configured(),
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Landing response
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    pub login_url: String,
}

/// Landing handler: who is logged in, and where to log in
pub async fn index_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let session = match session_id(&headers) {
        Some(id) => state.sessions.get(&id).await,
        None => None,
    };

    Json(IndexResponse {
        authenticated: session.is_some(),
        user: session.map(|s| s.user),
        login_url: "/login".to_string(),
    })
}

/// Redirect the browser to the OAuth provider
pub async fn login_handler(State(state): State<Arc<ServerState>>) -> Redirect {
    Redirect::to(&state.oauth.authorize_url())
}

/// OAuth callback: exchange the code, load the profile, open a session
pub async fn callback_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let code = params
        .get("code")
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("No authorization code received"))?;

    let token = state.oauth.exchange_code(code).await.map_err(|e| {
        warn!("OAuth code exchange failed: {}", e);
        ApiError::bad_request("Failed to get access token")
    })?;

    let user = state.oauth.user_profile(&token).await.map_err(|e| {
        warn!("Unable to load user profile: {}", e);
        ApiError::bad_request("Failed to get user info")
    })?;

    info!("User {} logged in", user.login);
    let id = state.sessions.create(token, user).await;
    Ok((
        [(header::SET_COOKIE, session_cookie(&id))],
        Redirect::to("/"),
    ))
}

/// Drop the caller's session
pub async fn logout_handler(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(id) = session_id(&headers) {
        state.sessions.remove(&id).await;
    }
    ([(header::SET_COOKIE, clear_cookie())], Redirect::to("/"))
}

/// Repository list response
#[derive(Debug, Serialize)]
pub struct ReposResponse {
    pub repos: Vec<RepoSummary>,
}

/// Repositories of the logged in user
pub async fn repos_handler(
    State(state): State<Arc<ServerState>>,
    AuthSession(session): AuthSession,
) -> Result<Json<ReposResponse>, ApiError> {
    let repos = state.oauth.list_repos(&session.access_token).await?;
    Ok(Json(ReposResponse { repos }))
}

/// Deploy request body
#[derive(Debug, Deserialize)]
pub struct DeployRequest {
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub repo_name: Option<String>,
}

/// Deploy response
#[derive(Debug, Serialize)]
pub struct DeployResponse {
    pub success: bool,
    pub message: String,
    pub image: String,
    pub deployment: String,
    pub port: u16,
}

/// Build and deploy a repository
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    AuthSession(session): AuthSession,
    Json(request): Json<DeployRequest>,
) -> Result<Json<DeployResponse>, ApiError> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (repo_url, repo_name) = match (non_empty(request.repo_url), non_empty(request.repo_name)) {
        (Some(url), Some(name)) => (url, name),
        _ => return Err(ApiError::bad_request("Repository URL and name required")),
    };

    info!("{} requested a deploy of {}", session.user.login, repo_url);
    let deployed = state.orchestrator.run(&repo_url, &repo_name).await?;

    Ok(Json(DeployResponse {
        success: true,
        message: "Deployment successful".to_string(),
        image: deployed.image,
        deployment: deployed.deployment,
        port: deployed.port,
    }))
}

/// Deployment list response
#[derive(Debug, Serialize)]
pub struct DeploymentsResponse {
    pub deployments: Vec<DeploymentRecord>,
}

/// All deployments in the namespace
pub async fn deployments_handler(
    State(state): State<Arc<ServerState>>,
    _session: AuthSession,
) -> Result<Json<DeploymentsResponse>, ApiError> {
    let deployments = state.deployer.list().await?;
    Ok(Json(DeploymentsResponse { deployments }))
}

/// Deployment status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: DeploymentRecord,
}

/// Status of one deployment
pub async fn status_handler(
    State(state): State<Arc<ServerState>>,
    _session: AuthSession,
    Path(name): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let status = state.deployer.status(&name).await?;
    Ok(Json(StatusResponse { status }))
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl From<DeletionReport> for DeleteResponse {
    fn from(report: DeletionReport) -> Self {
        Self {
            success: true,
            message: report.message,
        }
    }
}

/// Delete a deployment, its service and its cached image
pub async fn delete_handler(
    State(state): State<Arc<ServerState>>,
    AuthSession(session): AuthSession,
    Path(name): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    info!("{} requested deletion of {}", session.user.login, name);
    let report = state.deployer.delete(&name).await.map_err(|e| {
        error!("Delete of {} failed: {}", name, e);
        ApiError::from(e)
    })?;
    Ok(Json(report.into()))
}
