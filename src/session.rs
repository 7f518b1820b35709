// ABOUTME: Authoritative in-process session membership store
// ABOUTME: Create-or-adopt creation, idempotent joins, per-session serialized mutations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;

/// Failures callers can distinguish at the HTTP boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),
    #[error("Invalid user: {0}")]
    InvalidUser(String),
    #[error("Session store lock poisoned: {0}")]
    LockPoisoned(String),
}

/// A member of a shared session. `joined_at` is set once, at insertion,
/// and never updated; the store is the sole writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    #[serde(rename = "joinedAt")]
    pub joined_at: String,
}

/// A shared chat room with an ordered member list (by join time).
/// Member ids are unique within a session; zero members is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub members: Vec<SessionUser>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Session {
    fn new(id: String) -> Self {
        Session {
            id,
            name: "New Session".to_string(),
            members: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.id == user_id)
    }
}

/// In-process session map. The outer lock only guards map shape; each
/// session carries its own mutex so mutations to one session never block
/// another, and concurrent joins to the same session serialize.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<Session>>>>>,
}

fn validate_session_id(session_id: &str) -> Result<(), StoreError> {
    if session_id.is_empty() || session_id.len() > 64 {
        return Err(StoreError::InvalidSessionId(
            "must be 1-64 characters".to_string(),
        ));
    }
    if !session_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(StoreError::InvalidSessionId(
            "must be alphanumeric with dashes/underscores".to_string(),
        ));
    }
    Ok(())
}

fn validate_user(user_id: &str, user_name: &str) -> Result<(), StoreError> {
    if user_id.trim().is_empty() {
        return Err(StoreError::InvalidUser("user id is empty".to_string()));
    }
    if user_name.trim().is_empty() {
        return Err(StoreError::InvalidUser("user name is empty".to_string()));
    }
    Ok(())
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore::default()
    }

    /// Create a session with the caller as sole member. Create-or-adopt:
    /// if the id already exists the existing session is preserved and the
    /// caller is joined into it if absent. Never overwrites.
    pub fn create(
        &self,
        session_id: &str,
        user_id: &str,
        user_name: &str,
    ) -> Result<Session, StoreError> {
        validate_session_id(session_id)?;
        validate_user(user_id, user_name)?;

        let entry = {
            let mut map = self
                .sessions
                .write()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            if let Some(existing) = map.get(session_id) {
                tracing::debug!(session_id = %session_id, user_id = %user_id, "Adopting existing session");
                Arc::clone(existing)
            } else {
                let entry = Arc::new(Mutex::new(Session::new(session_id.to_string())));
                map.insert(session_id.to_string(), Arc::clone(&entry));
                crate::metrics::record_session_created();
                tracing::info!(session_id = %session_id, creator = %user_id, "Session created");
                entry
            }
        };

        Self::append_member(&entry, user_id, user_name)
    }

    /// Join an existing session. Idempotent: re-joining neither duplicates
    /// the member nor resets `joined_at`. Unknown ids are an error — the
    /// caller's explicit intent cannot be silently substituted.
    pub fn join(
        &self,
        session_id: &str,
        user_id: &str,
        user_name: &str,
    ) -> Result<Session, StoreError> {
        validate_user(user_id, user_name)?;

        let entry = self.entry(session_id)?;
        let session = Self::append_member(&entry, user_id, user_name)?;
        crate::metrics::record_session_join();
        Ok(session)
    }

    /// Latest committed state of a session. Never returns a default or
    /// empty session for unknown ids.
    pub fn get(&self, session_id: &str) -> Result<Session, StoreError> {
        let entry = self.entry(session_id)?;
        let session = entry
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(session.clone())
    }

    /// Update the human-readable session name.
    pub fn rename(&self, session_id: &str, name: &str) -> Result<Session, StoreError> {
        let entry = self.entry(session_id)?;
        let mut session = entry
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        session.name = name.to_string();
        tracing::info!(session_id = %session_id, name = %name, "Session renamed");
        Ok(session.clone())
    }

    /// Sessions a user belongs to, for startup listing. Newest first.
    pub fn sessions_for_user(&self, user_id: &str) -> Result<Vec<Session>, StoreError> {
        let map = self
            .sessions
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let mut sessions = Vec::new();
        for entry in map.values() {
            let session = entry
                .lock()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            if session.has_member(user_id) {
                sessions.push(session.clone());
            }
        }
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    fn entry(&self, session_id: &str) -> Result<Arc<Mutex<Session>>, StoreError> {
        let map = self
            .sessions
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        map.get(session_id)
            .cloned()
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))
    }

    /// Single atomic append under the session's own mutex. A duplicate
    /// join is a no-op that still returns the current session.
    fn append_member(
        entry: &Arc<Mutex<Session>>,
        user_id: &str,
        user_name: &str,
    ) -> Result<Session, StoreError> {
        let mut session = entry
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        if !session.has_member(user_id) {
            session.members.push(SessionUser {
                id: user_id.to_string(),
                name: user_name.to_string(),
                joined_at: chrono::Utc::now().to_rfc3339(),
            });
            tracing::info!(
                session_id = %session.id,
                user_id = %user_id,
                members = session.members.len(),
                "Member joined session"
            );
        }
        Ok(session.clone())
    }
}
