use dashmap::DashMap;
use uuid::Uuid;

use super::SessionStore;

/// Process-local session store. Lost on restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Uuid>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn put(&self, token: String, user_id: Uuid) {
        self.sessions.insert(token, user_id);
    }

    fn get(&self, token: &str) -> Option<Uuid> {
        self.sessions.get(token).map(|entry| *entry.value())
    }

    fn delete(&self, token: &str) -> Option<Uuid> {
        self.sessions.remove(token).map(|(_, user_id)| user_id)
    }
}
