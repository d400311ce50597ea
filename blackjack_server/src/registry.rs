use crate::session::BlackjackSession;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "bj_session";

/// Sessions expire after six hours without a request.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// A session behind its own lock, so requests for one session are applied one at a time while other
/// sessions carry on.
pub type SharedSession = Arc<Mutex<BlackjackSession>>;

struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

/// Struct mapping session ids to sessions. Expired sessions are dropped whenever the registry is touched.
pub struct SessionRegistry {
    sessions: HashMap<String, Entry>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> SessionRegistry {
        SessionRegistry {
            sessions: HashMap::new(),
            ttl,
        }
    }

    /// Looks up the session with the given id, refreshing its expiry. Returns `None` for unknown or
    /// expired ids.
    pub fn get(&mut self, id: &str, now: Instant) -> Option<SharedSession> {
        self.prune(now);
        self.sessions.get_mut(id).map(|entry| {
            entry.last_seen = now;
            Arc::clone(&entry.session)
        })
    }

    /// Registers `session` under a fresh random id, returns the id and the shared session.
    pub fn insert(&mut self, session: BlackjackSession, now: Instant) -> (String, SharedSession) {
        self.prune(now);
        let mut id = new_session_id();
        while self.sessions.contains_key(&id) {
            id = new_session_id();
        }
        let session = Arc::new(Mutex::new(session));
        self.sessions.insert(
            id.clone(),
            Entry {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        info!("created session {} ({} live)", id, self.sessions.len());
        (id, session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= ttl);
        let expired = before - self.sessions.len();
        if expired > 0 {
            debug!("expired {} idle session(s)", expired);
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        SessionRegistry::new(DEFAULT_SESSION_TTL)
    }
}

fn new_session_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}
