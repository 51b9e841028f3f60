//! In-process session store.
//!
//! One mutex guards the whole map and is never held across an `.await`, so each
//! operation (including [`SessionStore::commit_login`]) is atomic with respect
//! to every other request.

use super::{SessionId, SessionSettings, SessionStore, StoreError, KEY_USER};
use async_trait::async_trait;
use std::{collections::HashMap, time::Duration};
use tokio::{sync::Mutex, time::Instant};

struct Record {
    values: HashMap<String, String>,
    created_at: Instant,
    deadline: Instant,
    last_seen: Instant,
}

impl Record {
    fn new(now: Instant, lifetime: Duration) -> Self {
        Self {
            values: HashMap::new(),
            created_at: now,
            deadline: now + lifetime,
            last_seen: now,
        }
    }

    /// Push the deadline to `created_at + lifetime`; never brings it closer.
    fn extend(&mut self, lifetime: Duration) {
        self.deadline = self.deadline.max(self.created_at + lifetime);
    }

    fn is_live(&self, now: Instant, idle_timeout: Duration) -> bool {
        now < self.deadline && now.duration_since(self.last_seen) < idle_timeout
    }
}

pub struct MemoryStore {
    settings: SessionSettings,
    sessions: Mutex<HashMap<String, Record>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Number of records currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Look up a live record and mark it as accessed; expired records are dropped.
    fn touch<'a>(
        &self,
        sessions: &'a mut HashMap<String, Record>,
        id: &SessionId,
        now: Instant,
    ) -> Option<&'a mut Record> {
        let live = sessions
            .get(id.as_str())
            .map(|record| record.is_live(now, self.settings.idle_timeout))?;
        if !live {
            sessions.remove(id.as_str());
            return None;
        }
        let record = sessions.get_mut(id.as_str())?;
        record.last_seen = now;
        Some(record)
    }

    fn fresh_id(sessions: &HashMap<String, Record>) -> Result<SessionId, StoreError> {
        loop {
            let id = SessionId::generate()?;
            if !sessions.contains_key(id.as_str()) {
                return Ok(id);
            }
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self) -> Result<SessionId, StoreError> {
        let mut sessions = self.sessions.lock().await;
        let id = Self::fresh_id(&sessions)?;
        sessions.insert(
            id.as_str().to_string(),
            Record::new(Instant::now(), self.settings.lifetime),
        );
        Ok(id)
    }

    async fn get(&self, id: &SessionId, key: &str) -> Result<Option<String>, StoreError> {
        let mut sessions = self.sessions.lock().await;
        Ok(self
            .touch(&mut sessions, id, Instant::now())
            .and_then(|record| record.values.get(key).cloned()))
    }

    async fn put(&self, id: &SessionId, key: &str, value: String) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;
        let record = self
            .touch(&mut sessions, id, Instant::now())
            .ok_or(StoreError::NotFound)?;
        record.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn renew_identifier(&self, id: &SessionId) -> Result<SessionId, StoreError> {
        let mut sessions = self.sessions.lock().await;
        self.touch(&mut sessions, id, Instant::now())
            .ok_or(StoreError::NotFound)?;
        let new_id = Self::fresh_id(&sessions)?;
        let record = sessions.remove(id.as_str()).ok_or(StoreError::NotFound)?;
        sessions.insert(new_id.as_str().to_string(), record);
        Ok(new_id)
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .remove(id.as_str())
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn extend_lifetime(&self, id: &SessionId, lifetime: Duration) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;
        let record = self
            .touch(&mut sessions, id, Instant::now())
            .ok_or(StoreError::NotFound)?;
        record.extend(lifetime);
        Ok(())
    }

    async fn expires_in(&self, id: &SessionId) -> Result<Option<Duration>, StoreError> {
        let now = Instant::now();
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .get(id.as_str())
            .filter(|record| record.is_live(now, self.settings.idle_timeout))
            .map(|record| record.deadline.saturating_duration_since(now)))
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let idle_timeout = self.settings.idle_timeout;
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, record| record.is_live(now, idle_timeout));
        before - sessions.len()
    }

    async fn commit_login(
        &self,
        id: &SessionId,
        user: &str,
        lifetime: Option<Duration>,
    ) -> Result<SessionId, StoreError> {
        let mut sessions = self.sessions.lock().await;
        self.touch(&mut sessions, id, Instant::now())
            .ok_or(StoreError::NotFound)?;
        // Everything that can fail happens before the record is touched.
        let new_id = Self::fresh_id(&sessions)?;
        let mut record = sessions.remove(id.as_str()).ok_or(StoreError::NotFound)?;
        if let Some(lifetime) = lifetime {
            record.extend(lifetime);
        }
        record.values.insert(KEY_USER.to_string(), user.to_string());
        sessions.insert(new_id.as_str().to_string(), record);
        Ok(new_id)
    }
}
