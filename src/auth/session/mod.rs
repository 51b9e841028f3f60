//! Server-side sessions keyed by an opaque identifier carried in a cookie.
//!
//! [`SessionStore`] is the seam between the login flow and the storage backend.
//! Expiry is the store's job: once the absolute lifetime or the idle timeout has
//! passed, `get` returns `None` and writes fail with [`StoreError::NotFound`].

mod memory;

pub use memory::MemoryStore;

use super::token::generate_session_id;
use async_trait::async_trait;
use std::{fmt, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{task::JoinHandle, time::sleep};
use tracing::{debug, error};

/// Username of the authenticated operator.
pub const KEY_USER: &str = "user";
/// CSRF token most recently issued for this session.
pub const KEY_TOKEN: &str = "token";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("session not found or expired")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Opaque session identifier.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh, unguessable identifier.
    ///
    /// # Errors
    /// Returns [`StoreError::Unavailable`] when the random source fails.
    pub fn generate() -> Result<Self, StoreError> {
        generate_session_id()
            .map(Self)
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for SessionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

// Never print a full identifier, it is a bearer credential.
impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "SessionId({prefix}…)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Absolute lifetime counted from creation.
    pub lifetime: Duration,
    /// Inactivity window, reset on every access.
    pub idle_timeout: Duration,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Start a new anonymous session with the default lifetime.
    async fn create(&self) -> Result<SessionId, StoreError>;

    /// Read a value. `Ok(None)` for missing keys and for unknown or expired sessions.
    async fn get(&self, id: &SessionId, key: &str) -> Result<Option<String>, StoreError>;

    /// Store a value and reset the idle timer.
    async fn put(&self, id: &SessionId, key: &str, value: String) -> Result<(), StoreError>;

    /// Move the values to a new identifier; the old one stops working immediately.
    async fn renew_identifier(&self, id: &SessionId) -> Result<SessionId, StoreError>;

    /// Drop all values and invalidate the identifier.
    async fn destroy(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Move the absolute expiry of this session out to `created + lifetime`. An
    /// expiry that is already later is kept.
    async fn extend_lifetime(&self, id: &SessionId, lifetime: Duration) -> Result<(), StoreError>;

    /// Remaining absolute lifetime, `None` for unknown or expired sessions.
    async fn expires_in(&self, id: &SessionId) -> Result<Option<Duration>, StoreError>;

    /// Remove expired records, returning how many were dropped.
    async fn purge_expired(&self) -> usize;

    /// Promote an anonymous session after credentials were accepted: optionally
    /// extend the lifetime, store the username, rotate the identifier.
    ///
    /// Backends that can do this atomically should override it; the default runs
    /// the steps one after another.
    async fn commit_login(
        &self,
        id: &SessionId,
        user: &str,
        lifetime: Option<Duration>,
    ) -> Result<SessionId, StoreError> {
        if let Some(lifetime) = lifetime {
            self.extend_lifetime(id, lifetime).await?;
        }
        self.put(id, KEY_USER, user.to_string()).await?;
        self.renew_identifier(id).await
    }
}

/// Periodically drop expired sessions so abandoned logins do not pile up.
pub fn spawn_sweeper(store: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            sleep(every).await;
            let purged = store.purge_expired().await;
            if purged > 0 {
                debug!(purged, "Expired sessions removed");
            }
        }
    })
}

/// Log and swallow store failures on read paths; a failing store means "anonymous".
pub(crate) fn or_anonymous<T>(result: Result<Option<T>, StoreError>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(err) => {
            error!("Session store failure: {err}");
            None
        }
    }
}
