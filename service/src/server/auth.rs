//! Session extractor for authenticated routes

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::authn::session::{session_id, Session};
use crate::server::error::ApiError;
use crate::server::state::ServerState;

/// The caller's live session; rejects with 401 when there is none
pub struct AuthSession(pub Session);

impl FromRequestParts<Arc<ServerState>> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ServerState>,
    ) -> Result<Self, Self::Rejection> {
        let id = session_id(&parts.headers).ok_or_else(ApiError::unauthorized)?;
        let session = state.sessions.get(&id).await.ok_or_else(ApiError::unauthorized)?;
        Ok(AuthSession(session))
    }
}
