//! In-memory browser sessions

use std::collections::HashMap;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::repo::UserProfile;

pub const SESSION_COOKIE: &str = "kubeship_session";

/// A logged in user
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: SecretString,
    pub user: UserProfile,
    pub created_at: DateTime<Utc>,
}

/// Session store keyed by an opaque random id
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Store a new session and return its id
    pub async fn create(&self, access_token: SecretString, user: UserProfile) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Session {
            access_token,
            user,
            created_at: Utc::now(),
        };

        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        sessions.retain(|_, s| now - s.created_at < self.ttl);
        sessions.insert(id.clone(), session);
        debug!("Session created ({} active)", sessions.len());
        id
    }

    /// Look up a live session
    pub async fn get(&self, id: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .filter(|s| Utc::now() - s.created_at < self.ttl)
            .cloned()
    }

    pub async fn remove(&self, id: &str) {
        self.sessions.write().await.remove(id);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

/// Session id carried by the request's `Cookie` header, if any
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value establishing a session
pub fn session_cookie(id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

/// `Set-Cookie` value clearing the session
pub fn clear_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}
