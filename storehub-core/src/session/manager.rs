//! SessionManager: registry of every live session
//!
//! The registry keeps two indexes behind one [`RwLock`]:
//! - `by_user`: user id to that user's sessions, ordered oldest first
//! - `by_id`: session id to user id, so removal needs no user hint
//!
//! Transports are never touched while the lock is held for writing. Kicks detach
//! sessions first and notify them after the lock is released.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::SessionError;
use crate::protocol::ServerMessage;

use super::policy::SessionPolicy;
use super::state::{NewSession, Session, SessionId, UserId};
use super::transport::SessionTransport;

/// Outcome of [`SessionManager::create_session`]
#[derive(Debug)]
pub struct Registration {
    /// The newly registered session
    pub session: Arc<Session>,
    /// Sessions detached to make room; the caller kicks them
    pub evicted: Vec<Arc<Session>>,
    /// Kick reason to send to the evicted sessions
    pub eviction_reason: &'static str,
}

/// One user's sessions, ordered by `(created_at, seq)`
#[derive(Debug, Default)]
struct UserSessions {
    sessions: HashMap<SessionId, Arc<Session>>,
    order: BTreeMap<(DateTime<Utc>, u64), SessionId>,
}

impl UserSessions {
    fn insert(&mut self, session: Arc<Session>) {
        self.order.insert(session.order_key(), session.id().to_string());
        self.sessions.insert(session.id().to_string(), session);
    }

    fn remove(&mut self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.remove(id)?;
        self.order.remove(&session.order_key());
        Some(session)
    }

    fn pop_oldest(&mut self) -> Option<Arc<Session>> {
        let (_, id) = self.order.pop_first()?;
        self.sessions.remove(&id)
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }

    fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn ordered(&self) -> impl Iterator<Item = &Arc<Session>> {
        self.order.values().filter_map(|id| self.sessions.get(id))
    }
}

#[derive(Debug, Default)]
struct Registry {
    by_user: HashMap<UserId, UserSessions>,
    by_id: HashMap<SessionId, UserId>,
    next_seq: u64,
}

impl Registry {
    fn insert(&mut self, session: Arc<Session>) {
        self.by_id
            .insert(session.id().to_string(), session.user_id().to_string());
        self.by_user
            .entry(session.user_id().to_string())
            .or_default()
            .insert(session);
    }

    fn remove(&mut self, id: &str) -> Option<Arc<Session>> {
        let user_id = self.by_id.remove(id)?;
        let user = self.by_user.get_mut(&user_id)?;
        let session = user.remove(id);
        if user.is_empty() {
            self.by_user.remove(&user_id);
        }
        session
    }

    fn remove_user(&mut self, user_id: &str) -> Vec<Arc<Session>> {
        let Some(user) = self.by_user.remove(user_id) else {
            return Vec::new();
        };
        let detached: Vec<Arc<Session>> = user.ordered().cloned().collect();
        for session in &detached {
            self.by_id.remove(session.id());
        }
        detached
    }

    fn pop_oldest(&mut self, user_id: &str) -> Option<Arc<Session>> {
        let user = self.by_user.get_mut(user_id)?;
        let session = user.pop_oldest()?;
        self.by_id.remove(session.id());
        if user.is_empty() {
            self.by_user.remove(user_id);
        }
        Some(session)
    }

    fn user_len(&self, user_id: &str) -> usize {
        self.by_user.get(user_id).map_or(0, UserSessions::len)
    }
}

/// Manages every live session in the process
///
/// SessionManager provides:
/// - One-time initialization with a validated [`SessionPolicy`]
/// - Registration with policy-driven eviction
/// - O(1) removal by session id
/// - Kicks, per-user listing, and per-user broadcast
///
/// Every operation before [`init`](Self::init) fails with
/// [`SessionError::Uninitialized`].
#[derive(Debug, Default)]
pub struct SessionManager {
    policy: OnceLock<SessionPolicy>,
    registry: RwLock<Registry>,
}

impl SessionManager {
    /// Create an uninitialized manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager that is already initialized with `policy`
    pub fn with_policy(policy: SessionPolicy) -> Self {
        let manager = Self::new();
        let _ = manager.policy.set(policy);
        manager
    }

    /// Install the login policy; must be called exactly once
    pub fn init(&self, policy: SessionPolicy) -> Result<(), SessionError> {
        self.policy
            .set(policy)
            .map_err(|_| SessionError::AlreadyInitialized)?;
        info!(strategy = %policy.strategy(), ?policy, "Session manager initialized");
        Ok(())
    }

    /// The installed policy, if initialized
    pub fn policy(&self) -> Option<SessionPolicy> {
        self.policy.get().copied()
    }

    fn require_policy(&self) -> Result<SessionPolicy, SessionError> {
        self.policy().ok_or(SessionError::Uninitialized)
    }

    /// Register a new session, evicting existing ones as the policy requires
    ///
    /// Evicted sessions are only detached from the registry here. The caller
    /// is expected to [`kick`](Session::kick) each of them.
    #[instrument(name = "session::create", skip_all, fields(user_id = %request.user_id))]
    pub async fn create_session(
        &self,
        request: NewSession,
        transport: SessionTransport,
    ) -> Result<Registration, SessionError> {
        let policy = self.require_policy()?;
        let mut registry = self.registry.write().await;

        let evicted = match policy {
            SessionPolicy::Single => registry.remove_user(&request.user_id),
            SessionPolicy::Multi { max_sessions } => {
                if registry.user_len(&request.user_id) >= max_sessions.get() {
                    registry.pop_oldest(&request.user_id).into_iter().collect()
                } else {
                    Vec::new()
                }
            }
        };

        let seq = registry.next_seq;
        registry.next_seq += 1;

        let session = Arc::new(Session::new(
            Uuid::now_v7().to_string(),
            request,
            Utc::now(),
            seq,
            transport,
        ));
        registry.insert(Arc::clone(&session));
        drop(registry);

        for old in &evicted {
            debug!(session_id = %old.id(), "Evicted by new login");
        }
        info!(
            session_id = %session.id(),
            device_id = %session.device_id(),
            evicted = evicted.len(),
            "Session registered"
        );

        Ok(Registration {
            session,
            evicted,
            eviction_reason: policy.eviction_reason(),
        })
    }

    /// Remove a session by id
    ///
    /// Returns false if no such session was registered. Does not touch the
    /// transport; the connection that owns it is already tearing down.
    pub async fn remove_session(&self, id: &str) -> Result<bool, SessionError> {
        self.require_policy()?;
        let removed = self.registry.write().await.remove(id);
        if removed.is_some() {
            debug!(session_id = %id, "Session removed");
        }
        Ok(removed.is_some())
    }

    /// Detach every session of a user, then notify and close each one
    #[instrument(name = "session::kick_user", skip(self))]
    pub async fn kick_user(&self, user_id: &str, reason: &str) -> Result<usize, SessionError> {
        self.require_policy()?;
        let detached = self.registry.write().await.remove_user(user_id);

        for session in &detached {
            session.kick(reason);
        }
        if !detached.is_empty() {
            info!(count = detached.len(), "Kicked user sessions");
        }
        Ok(detached.len())
    }

    /// Detach a single session, then notify and close it
    #[instrument(name = "session::kick_session", skip(self))]
    pub async fn kick_session(&self, id: &str, reason: &str) -> Result<bool, SessionError> {
        self.require_policy()?;
        let detached = self.registry.write().await.remove(id);

        match detached {
            Some(session) => {
                session.kick(reason);
                info!(user_id = %session.user_id(), "Kicked session");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Snapshot of a user's sessions, oldest first
    pub async fn list_user_sessions(&self, user_id: &str) -> Result<Vec<Arc<Session>>, SessionError> {
        self.require_policy()?;
        let registry = self.registry.read().await;
        Ok(registry
            .by_user
            .get(user_id)
            .map(|user| user.ordered().cloned().collect())
            .unwrap_or_default())
    }

    /// Look up a session by id
    pub async fn get_session(&self, id: &str) -> Result<Option<Arc<Session>>, SessionError> {
        self.require_policy()?;
        let registry = self.registry.read().await;
        Ok(registry
            .by_id
            .get(id)
            .and_then(|user_id| registry.by_user.get(user_id))
            .and_then(|user| user.sessions.get(id))
            .cloned())
    }

    /// Best-effort send to every session of a user
    ///
    /// Returns how many sends were accepted. A failed send neither stops the
    /// others nor removes the session.
    pub async fn broadcast(&self, user_id: &str, message: ServerMessage) -> Result<usize, SessionError> {
        self.require_policy()?;
        let registry = self.registry.read().await;
        let Some(user) = registry.by_user.get(user_id) else {
            return Ok(0);
        };

        let mut delivered = 0;
        for session in user.ordered() {
            match session.send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => debug!(session_id = %session.id(), "Broadcast send failed: {}", e),
            }
        }
        Ok(delivered)
    }

    /// Total number of live sessions
    pub async fn session_count(&self) -> Result<usize, SessionError> {
        self.require_policy()?;
        Ok(self.registry.read().await.by_id.len())
    }

    /// Number of users with at least one live session
    pub async fn user_count(&self) -> Result<usize, SessionError> {
        self.require_policy()?;
        Ok(self.registry.read().await.by_user.len())
    }

    #[cfg(test)]
    async fn assert_consistent(&self) {
        let registry = self.registry.read().await;
        let forward: usize = registry.by_user.values().map(UserSessions::len).sum();
        assert_eq!(forward, registry.by_id.len(), "index sizes disagree");
        for (user_id, user) in &registry.by_user {
            assert!(!user.is_empty(), "empty forward entry for {user_id}");
            assert_eq!(user.order.len(), user.sessions.len());
            for id in user.sessions.keys() {
                assert_eq!(registry.by_id.get(id), Some(user_id));
            }
        }
    }
}
