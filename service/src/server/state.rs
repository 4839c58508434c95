//! Server state

use std::sync::Arc;

use crate::app::state::AppState;
use crate::authn::github::OAuthProvider;
use crate::authn::session::SessionStore;
use crate::cluster::deployer::ClusterDeployer;
use crate::deploy::orchestrator::DeploymentOrchestrator;

/// Server state shared across handlers
pub struct ServerState {
    pub version: String,
    pub oauth: Arc<dyn OAuthProvider>,
    pub sessions: Arc<SessionStore>,
    pub orchestrator: Arc<DeploymentOrchestrator>,
    pub deployer: Arc<ClusterDeployer>,
}

impl ServerState {
    pub fn new(
        version: String,
        oauth: Arc<dyn OAuthProvider>,
        sessions: Arc<SessionStore>,
        orchestrator: Arc<DeploymentOrchestrator>,
        deployer: Arc<ClusterDeployer>,
    ) -> Self {
        Self {
            version,
            oauth,
            sessions,
            orchestrator,
            deployer,
        }
    }
}

impl From<AppState> for ServerState {
    fn from(state: AppState) -> Self {
        Self::new(
            state.version,
            state.oauth,
            state.sessions,
            state.orchestrator,
            state.deployer,
        )
    }
}
