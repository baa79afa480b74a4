use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use importer::RowInput;
use storage::models::Coach;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Rows of a previewed upload waiting for the coach to confirm.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub coach_id: i32,
    pub file_name: String,
    pub rows: Vec<RowInput>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub coach_id: i32,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub pending: Option<PendingUpload>,
}

impl Session {
    pub fn for_coach(coach: &Coach) -> Self {
        Self {
            coach_id: coach.id,
            email: coach.email.clone(),
            name: coach.name.clone(),
            is_admin: coach.is_admin,
            pending: None,
        }
    }
}

/// Idle time after which a session (and any upload waiting in it) is dropped.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

struct Entry {
    session: Session,
    last_seen: Instant,
}

impl Entry {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_seen) >= ttl
    }
}

/// In-memory bearer sessions. Restarting the server signs everyone out.
///
/// Sessions expire after `ttl` without use. Expired entries are refused on lookup
/// and removed by [`SessionStore::purge_expired`], which the server runs periodically.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn create(&self, session: Session) -> String {
        let token = Uuid::new_v4().to_string();
        let entry = Entry {
            session,
            last_seen: Instant::now(),
        };
        self.inner.write().await.insert(token.clone(), entry);
        token
    }

    /// Looks up a live session and marks it as used.
    pub async fn get(&self, token: &str) -> Option<Session> {
        self.get_at(token, Instant::now()).await
    }

    async fn get_at(&self, token: &str, now: Instant) -> Option<Session> {
        let mut sessions = self.inner.write().await;

        let expired = sessions.get(token)?.is_expired(self.ttl, now);
        if expired {
            sessions.remove(token);
            tracing::debug!("Session expired");
            return None;
        }

        let entry = sessions.get_mut(token)?;
        entry.last_seen = now;
        Some(entry.session.clone())
    }

    pub async fn remove(&self, token: &str) -> bool {
        self.inner.write().await.remove(token).is_some()
    }

    /// Drops every expired session and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now()).await
    }

    async fn purge_expired_at(&self, now: Instant) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(self.ttl, now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Replaces any upload already waiting in this session.
    pub async fn set_pending(&self, token: &str, upload: PendingUpload) -> bool {
        match self.inner.write().await.get_mut(token) {
            Some(entry) => {
                entry.session.pending = Some(upload);
                true
            }
            None => false,
        }
    }

    pub async fn take_pending(&self, token: &str) -> Option<PendingUpload> {
        self.inner
            .write()
            .await
            .get_mut(token)
            .and_then(|entry| entry.session.pending.take())
    }

    pub async fn clear_pending(&self, token: &str) {
        if let Some(entry) = self.inner.write().await.get_mut(token) {
            entry.session.pending = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use importer::RawRow;

    fn session() -> Session {
        Session {
            coach_id: 7,
            email: "coach@dojo.org".to_string(),
            name: "Coach".to_string(),
            is_admin: false,
            pending: None,
        }
    }

    #[tokio::test]
    async fn test_create_get_remove() {
        let store = SessionStore::default();
        let token = store.create(session()).await;

        assert_eq!(store.get(&token).await.map(|s| s.coach_id), Some(7));
        assert!(store.remove(&token).await);
        assert!(store.get(&token).await.is_none());
        assert!(!store.remove(&token).await);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let store = SessionStore::with_ttl(Duration::from_secs(60));
        let token = store.create(session()).await;
        let later = Instant::now() + Duration::from_secs(61);

        assert!(store.get_at(&token, later).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_use_keeps_session_alive() {
        let store = SessionStore::with_ttl(Duration::from_secs(60));
        let token = store.create(session()).await;
        let start = Instant::now();

        assert!(store.get_at(&token, start + Duration::from_secs(45)).await.is_some());
        assert!(store.get_at(&token, start + Duration::from_secs(90)).await.is_some());
        assert!(store.get_at(&token, start + Duration::from_secs(151)).await.is_none());
    }

    #[tokio::test]
    async fn test_purge_drops_expired_sessions_and_their_uploads() {
        let store = SessionStore::with_ttl(Duration::from_secs(60));
        let stale = store.create(session()).await;
        let fresh = store.create(session()).await;
        let later = Instant::now() + Duration::from_secs(120);
        store
            .set_pending(&stale, PendingUpload {
                coach_id: 7,
                file_name: "big.xlsx".to_string(),
                rows: vec![RowInput::from(RawRow::new(2)); 500],
            })
            .await;
        assert!(store.get_at(&fresh, later - Duration::from_secs(30)).await.is_some());

        assert_eq!(store.purge_expired_at(later).await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.take_pending(&stale).await.is_none());
        assert!(store.get_at(&fresh, later).await.is_some());
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let store = SessionStore::default();
        let a = store.create(session()).await;
        let b = store.create(session()).await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_pending_upload_is_taken_once() {
        let store = SessionStore::default();
        let token = store.create(session()).await;
        let upload = PendingUpload {
            coach_id: 7,
            file_name: "athletes.csv".to_string(),
            rows: vec![RawRow::new(2).into()],
        };

        assert!(store.set_pending(&token, upload).await);
        assert!(!store.set_pending("unknown", PendingUpload {
            coach_id: 7,
            file_name: String::new(),
            rows: Vec::new(),
        })
        .await);

        let taken = store.take_pending(&token).await.unwrap();
        assert_eq!(taken.file_name, "athletes.csv");
        assert_eq!(taken.rows.len(), 1);
        assert!(store.take_pending(&token).await.is_none());
    }
}
