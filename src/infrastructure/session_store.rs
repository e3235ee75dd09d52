use crate::domain::models::SpotifyToken;
use crate::infrastructure::error::AppError;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const SESSION_COOKIE: &str = "studybeats.sid";

const SESSION_ID_LENGTH: usize = 32;
const SESSION_TTL_DAYS: i64 = 7;

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone)]
struct StoredSession {
    token: SpotifyToken,
    expires_at: DateTime<Utc>,
}

/// In-memory map from session id to the Spotify token it proxies. Sessions
/// are pruned lazily on access once their idle TTL passes; a server restart
/// logs everyone out.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, StoredSession>>,
    now_provider: NowProvider,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            now_provider: Arc::new(Utc::now),
            ttl: Duration::days(SESSION_TTL_DAYS),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    fn generate_session_id() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_ID_LENGTH)
            .map(char::from)
            .collect()
    }

    /// Stores a token, reusing the caller's session id when it is still
    /// known. Returns the session id the cookie should carry.
    pub fn store_token(
        &self,
        existing_session_id: Option<&str>,
        token: SpotifyToken,
    ) -> Result<String, AppError> {
        let now = (self.now_provider)();
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|error| AppError::Internal(format!("session store lock poisoned: {error}")))?;

        let session_id = existing_session_id
            .filter(|id| sessions.contains_key(*id))
            .map(str::to_string)
            .unwrap_or_else(Self::generate_session_id);

        sessions.insert(
            session_id.clone(),
            StoredSession {
                token,
                expires_at: now + self.ttl,
            },
        );
        Ok(session_id)
    }

    /// Looks up the token for a session, pruning it when the session TTL
    /// has passed. Token expiry is the caller's concern.
    pub fn token(&self, session_id: &str) -> Result<Option<SpotifyToken>, AppError> {
        let now = (self.now_provider)();
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|error| AppError::Internal(format!("session store lock poisoned: {error}")))?;

        match sessions.get(session_id) {
            Some(stored) if stored.expires_at > now => Ok(Some(stored.token.clone())),
            Some(_) => {
                sessions.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn remove(&self, session_id: &str) -> Result<(), AppError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|error| AppError::Internal(format!("session store lock poisoned: {error}")))?;
        sessions.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn sample_token() -> SpotifyToken {
        SpotifyToken {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: fixed_time("2026-02-16T10:00:00Z"),
        }
    }

    #[test]
    fn store_and_lookup_roundtrip() {
        let now = fixed_time("2026-02-16T09:00:00Z");
        let store = SessionStore::new().with_now_provider(Arc::new(move || now));

        let session_id = store.store_token(None, sample_token()).expect("store");
        assert_eq!(session_id.len(), SESSION_ID_LENGTH);
        assert!(session_id.chars().all(|c| c.is_ascii_alphanumeric()));

        let token = store.token(&session_id).expect("lookup");
        assert_eq!(token, Some(sample_token()));
    }

    #[test]
    fn known_session_id_is_reused() {
        let now = fixed_time("2026-02-16T09:00:00Z");
        let store = SessionStore::new().with_now_provider(Arc::new(move || now));

        let first = store.store_token(None, sample_token()).expect("store");
        let second = store
            .store_token(Some(&first), sample_token())
            .expect("store again");
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_session_id_is_not_adopted() {
        let now = fixed_time("2026-02-16T09:00:00Z");
        let store = SessionStore::new().with_now_provider(Arc::new(move || now));

        let issued = store
            .store_token(Some("forged-session-id"), sample_token())
            .expect("store");
        assert_ne!(issued, "forged-session-id");
    }

    #[test]
    fn expired_sessions_are_pruned_on_access() {
        let store = SessionStore::new()
            .with_now_provider(Arc::new(|| fixed_time("2026-02-16T09:00:00Z")));
        let session_id = store.store_token(None, sample_token()).expect("store");

        let store = store
            .with_now_provider(Arc::new(|| fixed_time("2026-02-24T09:00:00Z")));
        assert_eq!(store.token(&session_id).expect("lookup"), None);
        // A second lookup sees the pruned entry gone as well.
        assert_eq!(store.token(&session_id).expect("lookup"), None);
    }

    #[test]
    fn remove_forgets_the_session() {
        let now = fixed_time("2026-02-16T09:00:00Z");
        let store = SessionStore::new().with_now_provider(Arc::new(move || now));
        let session_id = store.store_token(None, sample_token()).expect("store");

        store.remove(&session_id).expect("remove");
        assert_eq!(store.token(&session_id).expect("lookup"), None);
    }
}
