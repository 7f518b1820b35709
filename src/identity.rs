// ABOUTME: Local user identity persisted in a SQLite settings table under fixed keys
// ABOUTME: Falls back to a process-lifetime in-memory identity when storage is unavailable

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

const KEY_USER_ID: &str = "user_id";
const KEY_USER_NAME: &str = "user_name";
const KEY_CURRENT_SESSION: &str = "current_session_id";

/// The local user's own identity, generated once and reused across
/// sessions until explicitly cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
}

#[derive(Clone)]
enum Backend {
    Durable(Arc<Mutex<Connection>>),
    Ephemeral(Arc<Mutex<HashMap<String, String>>>),
}

#[derive(Clone)]
pub struct IdentityStore {
    backend: Backend,
}

impl IdentityStore {
    /// Open the identity database under the given data directory. If the
    /// directory or database cannot be opened the store degrades to an
    /// ephemeral in-memory identity rather than failing the caller.
    pub fn new<P: AsRef<Path>>(data_path: P) -> Self {
        match Self::open_durable(data_path.as_ref()) {
            Ok(conn) => IdentityStore {
                backend: Backend::Durable(Arc::new(Mutex::new(conn))),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Identity storage unavailable - using ephemeral identity");
                IdentityStore {
                    backend: Backend::Ephemeral(Arc::new(Mutex::new(HashMap::new()))),
                }
            }
        }
    }

    /// A store that never touches disk. Used directly in tests.
    pub fn ephemeral() -> Self {
        IdentityStore {
            backend: Backend::Ephemeral(Arc::new(Mutex::new(HashMap::new()))),
        }
    }

    fn open_durable(data_path: &Path) -> anyhow::Result<Connection> {
        std::fs::create_dir_all(data_path)?;
        let db_path = data_path.join("identity.db");
        let conn = Connection::open(&db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        tracing::info!(db = %db_path.display(), "Identity store initialized");
        Ok(conn)
    }

    /// Return the stored user id, generating and persisting a fresh
    /// identity on first invocation.
    pub fn get_or_create_user_id(&self) -> String {
        self.identity().id
    }

    /// Return the stored display name, generating a default one alongside
    /// the user id on first invocation.
    pub fn user_name(&self) -> String {
        self.identity().name
    }

    /// Get-or-create the full local identity.
    pub fn identity(&self) -> Identity {
        if let Some(id) = self.get(KEY_USER_ID) {
            let name = self
                .get(KEY_USER_NAME)
                .unwrap_or_else(|| default_name(&id));
            return Identity { id, name };
        }

        let id = uuid::Uuid::new_v4().to_string();
        let name = default_name(&id);
        self.set(KEY_USER_ID, &id);
        self.set(KEY_USER_NAME, &name);
        tracing::info!(user_id = %id, name = %name, "Generated local identity");
        Identity { id, name }
    }

    /// Update the stored display name without touching the user id.
    pub fn set_user_name(&self, name: &str) {
        self.set(KEY_USER_NAME, name);
    }

    pub fn current_session_id(&self) -> Option<String> {
        self.get(KEY_CURRENT_SESSION)
    }

    pub fn set_current_session_id(&self, session_id: &str) {
        self.set(KEY_CURRENT_SESSION, session_id);
    }

    pub fn clear_session(&self) {
        self.delete(KEY_CURRENT_SESSION);
    }

    /// Wipe the stored identity. Only ever triggered by explicit user
    /// action; the next identity() call generates a fresh one.
    pub fn clear(&self) {
        self.delete(KEY_USER_ID);
        self.delete(KEY_USER_NAME);
        self.delete(KEY_CURRENT_SESSION);
    }

    fn get(&self, key: &str) -> Option<String> {
        match &self.backend {
            Backend::Durable(db) => {
                let db = match db.lock() {
                    Ok(db) => db,
                    Err(e) => {
                        tracing::warn!(error = %e, "Identity database mutex poisoned");
                        return None;
                    }
                };
                let result = db.query_row(
                    "SELECT value FROM settings WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                );
                match result {
                    Ok(v) => Some(v),
                    Err(rusqlite::Error::QueryReturnedNoRows) => None,
                    Err(e) => {
                        tracing::warn!(error = %e, key = %key, "Identity read failed");
                        None
                    }
                }
            }
            Backend::Ephemeral(map) => map.lock().ok()?.get(key).cloned(),
        }
    }

    fn set(&self, key: &str, value: &str) {
        match &self.backend {
            Backend::Durable(db) => {
                let db = match db.lock() {
                    Ok(db) => db,
                    Err(e) => {
                        tracing::warn!(error = %e, "Identity database mutex poisoned");
                        return;
                    }
                };
                if let Err(e) = db.execute(
                    "INSERT INTO settings (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = ?2",
                    params![key, value],
                ) {
                    tracing::warn!(error = %e, key = %key, "Identity write failed");
                }
            }
            Backend::Ephemeral(map) => {
                if let Ok(mut map) = map.lock() {
                    map.insert(key.to_string(), value.to_string());
                }
            }
        }
    }

    fn delete(&self, key: &str) {
        match &self.backend {
            Backend::Durable(db) => {
                let db = match db.lock() {
                    Ok(db) => db,
                    Err(e) => {
                        tracing::warn!(error = %e, "Identity database mutex poisoned");
                        return;
                    }
                };
                if let Err(e) = db.execute("DELETE FROM settings WHERE key = ?1", params![key]) {
                    tracing::warn!(error = %e, key = %key, "Identity delete failed");
                }
            }
            Backend::Ephemeral(map) => {
                if let Ok(mut map) = map.lock() {
                    map.remove(key);
                }
            }
        }
    }
}

fn default_name(user_id: &str) -> String {
    let prefix: String = user_id.chars().take(8).collect();
    format!("guest-{}", prefix)
}
