//! In-memory review sessions with an idle time-to-live, backed by `DashMap`.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use discrepancy_core::types::{NameMatchResults, NameReviewOutcome, PremiumComparison};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AnalyzerError;
use crate::settings::AnalysisSettings;

/// Opaque, randomly generated session identifier.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Where a session is in the review workflow.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Uploaded,
    NameReview,
    PremiumReview,
    Complete,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::NameReview => "name_review",
            Self::PremiumReview => "premium_review",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intermediate state of one analysis between review steps.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    pub id: SessionId,
    pub account: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub settings: AnalysisSettings,
    pub phase: SessionPhase,
    pub phase1: Option<NameMatchResults>,
    pub name_review: Option<NameReviewOutcome>,
    pub phase2: Option<PremiumComparison>,
}

impl AnalysisSession {
    pub fn new(account: &str, created_by: &str, settings: AnalysisSettings) -> Self {
        Self {
            id: SessionId::new(),
            account: account.to_string(),
            created_by: created_by.to_string(),
            created_at: Utc::now(),
            settings,
            phase: SessionPhase::Uploaded,
            phase1: None,
            name_review: None,
            phase2: None,
        }
    }

    pub fn require_phase(&self, expected: SessionPhase) -> Result<(), AnalyzerError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(AnalyzerError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }
}

/// Locks a session, recovering the guard if a previous holder panicked.
pub fn lock_session(session: &Mutex<AnalysisSession>) -> MutexGuard<'_, AnalysisSession> {
    session.lock().unwrap_or_else(|e| e.into_inner())
}

struct SessionEntry {
    session: Arc<Mutex<AnalysisSession>>,
    last_access: Instant,
}

impl SessionEntry {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.last_access) > ttl
    }
}

/// Thread-safe session registry with idle expiration.
///
/// Expired sessions are lazily evicted on the next `get` for that id, or all
/// at once by [`SessionStore::purge_expired`]. A successful `get` refreshes
/// the idle timer.
pub struct SessionStore {
    store: DashMap<SessionId, SessionEntry>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Registers a session under its own id.
    pub fn insert(&self, session: AnalysisSession) -> Arc<Mutex<AnalysisSession>> {
        let id = session.id;
        let shared = Arc::new(Mutex::new(session));
        self.store.insert(
            id,
            SessionEntry {
                session: Arc::clone(&shared),
                last_access: Instant::now(),
            },
        );
        shared
    }

    /// Returns the live session for `id`.
    pub fn get(&self, id: &SessionId) -> Result<Arc<Mutex<AnalysisSession>>, AnalyzerError> {
        let now = Instant::now();
        let mut entry = self
            .store
            .get_mut(id)
            .ok_or(AnalyzerError::SessionNotFound(*id))?;

        if entry.is_expired(self.ttl, now) {
            drop(entry);
            self.store.remove(id);
            tracing::info!("session {} expired", id);
            return Err(AnalyzerError::SessionNotFound(*id));
        }

        entry.last_access = now;
        Ok(Arc::clone(&entry.session))
    }

    /// Drops a session. Returns whether it was present.
    pub fn remove(&self, id: &SessionId) -> bool {
        self.store.remove(id).is_some()
    }

    /// Evicts every expired session and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.store.len();
        self.store
            .retain(|_, entry| !entry.is_expired(self.ttl, now));
        let purged = before.saturating_sub(self.store.len());
        if purged > 0 {
            tracing::info!("purged {} expired sessions", purged);
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> AnalysisSession {
        AnalysisSession::new("Acme", "reviewer", AnalysisSettings::default())
    }

    #[test]
    fn insert_and_get() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.insert(session()).lock().unwrap().id;
        let found = store.get(&id).unwrap();
        assert_eq!(lock_session(&found).account, "Acme");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_unknown() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = SessionId::new();
        assert!(matches!(
            store.get(&id),
            Err(AnalyzerError::SessionNotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn expired_session_is_evicted() {
        let store = SessionStore::new(Duration::from_millis(1));
        let id = store.insert(session()).lock().unwrap().id;
        std::thread::sleep(Duration::from_millis(10));
        assert!(store.get(&id).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn purge_expired() {
        let store = SessionStore::new(Duration::from_millis(1));
        store.insert(session());
        store.insert(session());
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(store.purge_expired(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn purge_keeps_live_sessions() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.insert(session());
        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.insert(session()).lock().unwrap().id;
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.get(&id).is_err());
    }

    #[test]
    fn shared_handle_sees_mutations() {
        let store = SessionStore::new(Duration::from_secs(60));
        let handle = store.insert(session());
        let id = lock_session(&handle).id;
        lock_session(&handle).phase = SessionPhase::NameReview;
        let again = store.get(&id).unwrap();
        assert_eq!(lock_session(&again).phase, SessionPhase::NameReview);
    }

    #[test]
    fn require_phase() {
        let mut s = session();
        assert!(s.require_phase(SessionPhase::Uploaded).is_ok());
        s.phase = SessionPhase::NameReview;
        match s.require_phase(SessionPhase::PremiumReview) {
            Err(AnalyzerError::WrongPhase { expected, actual }) => {
                assert_eq!(expected, SessionPhase::PremiumReview);
                assert_eq!(actual, SessionPhase::NameReview);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn session_id_round_trips_through_text() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }

    #[test]
    fn phase_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SessionPhase::PremiumReview).unwrap(),
            "\"premium_review\""
        );
    }
}
