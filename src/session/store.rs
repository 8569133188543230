use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

use super::Session;

/// Async lock so a session holds its guard across the fetch, which keeps one
/// writer per session at a time.
pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

struct Entry {
    session: SessionHandle,
    last_seen: Instant,
}

pub struct SessionStore {
    sessions: Mutex<HashMap<String, Entry>>,
    idle: Duration,
    capacity: usize,
}

impl SessionStore {
    pub fn new(idle: Duration, capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle,
            capacity: capacity.max(1),
        }
    }

    /// Look up a live session and mark it as used.
    pub fn get(&self, id: &str) -> Option<SessionHandle> {
        let mut sessions = self.lock();
        let now = Instant::now();
        let entry = sessions.get_mut(id)?;
        if now.duration_since(entry.last_seen) > self.idle {
            debug!("Session {} expired", id);
            sessions.remove(id);
            return None;
        }
        entry.last_seen = now;
        Some(entry.session.clone())
    }

    /// Return the session for `id` if it is live, otherwise start a new one
    /// under a fresh id. The returned id is the one the client should keep.
    pub fn get_or_create(&self, id: Option<&str>) -> (String, SessionHandle) {
        if let Some((id, handle)) = id.and_then(|id| self.get(id).map(|h| (id, h))) {
            return (id.to_string(), handle);
        }

        let id = Uuid::new_v4().to_string();
        let handle: SessionHandle = Arc::new(tokio::sync::Mutex::new(Session::new()));

        let mut sessions = self.lock();
        let now = Instant::now();
        sessions.retain(|_, e| now.duration_since(e.last_seen) <= self.idle);
        while sessions.len() >= self.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, e)| e.last_seen)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    debug!("Evicting session {}", k);
                    sessions.remove(&k);
                }
                None => break,
            }
        }
        sessions.insert(
            id.clone(),
            Entry {
                session: handle.clone(),
                last_seen: now,
            },
        );
        debug!("Started session {} ({} live)", id, sessions.len());

        (id, handle)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_id_gets_a_fresh_session() {
        let store = SessionStore::new(Duration::from_secs(60), 8);
        let (id, _) = store.get_or_create(Some("forged-id"));
        assert_ne!(id, "forged-id");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn known_id_returns_same_session() {
        let store = SessionStore::new(Duration::from_secs(60), 8);
        let (id, first) = store.get_or_create(None);
        let (again, second) = store.get_or_create(Some(&id));
        assert_eq!(id, again);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let store = SessionStore::new(Duration::from_secs(60), 2);
        let (a, _) = store.get_or_create(None);
        std::thread::sleep(Duration::from_millis(5));
        let (b, _) = store.get_or_create(None);
        std::thread::sleep(Duration::from_millis(5));
        assert!(store.get(&a).is_some());
        std::thread::sleep(Duration::from_millis(5));
        let (c, _) = store.get_or_create(None);

        assert_eq!(store.len(), 2);
        assert!(store.get(&a).is_some());
        assert!(store.get(&b).is_none());
        assert!(store.get(&c).is_some());
    }

    #[test]
    fn idle_sessions_expire() {
        let store = SessionStore::new(Duration::from_millis(10), 8);
        let (id, _) = store.get_or_create(None);
        std::thread::sleep(Duration::from_millis(30));
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }
}
