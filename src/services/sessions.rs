use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::Connection;
use tokio::sync::OwnedMutexGuard;

use crate::db::queries;
use crate::models::Session;

/// Where in-flight dialogues live between turns. `load` never returns an
/// expired session.
pub trait SessionStore: Send + Sync {
    fn load(&self, key: &str) -> anyhow::Result<Option<Session>>;
    fn save(&self, session: &Session) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
    fn purge_expired(&self) -> anyhow::Result<usize>;
}

// ── In-memory ──

pub struct InMemorySessionStore {
    capacity: usize,
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, HashMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|_| anyhow::anyhow!("session map lock poisoned"))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().map(|s| s.len()).unwrap_or(0)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, key: &str) -> anyhow::Result<Option<Session>> {
        let mut sessions = self.lock()?;
        let now = Utc::now().naive_utc();
        match sessions.get(key) {
            Some(s) if s.is_expired(now) => {
                sessions.remove(key);
                Ok(None)
            }
            Some(s) => Ok(Some(s.clone())),
            None => Ok(None),
        }
    }

    fn save(&self, session: &Session) -> anyhow::Result<()> {
        let mut sessions = self.lock()?;
        sessions.insert(session.key.clone(), session.clone());

        while sessions.len() > self.capacity {
            let oldest = sessions
                .values()
                .filter(|s| s.key != session.key)
                .min_by_key(|s| s.last_activity)
                .map(|s| s.key.clone());
            let Some(key) = oldest else { break };
            sessions.remove(&key);
            tracing::info!(session = %key, "evicted least recently active session");
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn purge_expired(&self) -> anyhow::Result<usize> {
        let mut sessions = self.lock()?;
        let now = Utc::now().naive_utc();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok(before - sessions.len())
    }
}

// ── SQLite ──

pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection lock poisoned"))
    }
}

impl SessionStore for SqliteSessionStore {
    fn load(&self, key: &str) -> anyhow::Result<Option<Session>> {
        let conn = self.lock()?;
        queries::get_session(&conn, key)
    }

    fn save(&self, session: &Session) -> anyhow::Result<()> {
        let conn = self.lock()?;
        queries::save_session(&conn, session)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        let conn = self.lock()?;
        queries::delete_session(&conn, key)?;
        Ok(())
    }

    fn purge_expired(&self) -> anyhow::Result<usize> {
        let conn = self.lock()?;
        queries::expire_old_sessions(&conn)
    }
}

// ── Per-session turn serialization ──

#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    pub fn prune(&self) -> usize {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }
}
