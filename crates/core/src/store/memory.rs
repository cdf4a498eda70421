//! In-process store adapter backed by `DashMap`.
//!
//! Used by the development server and by tests. It can be switched into an
//! unavailable state so callers can exercise their store-failure paths.

use super::{AuditStore, CohortStore, RoleStore, SessionStore, UserStore};
use crate::errors::{Error, Result};
use crate::types::{
    AuditLogEntry, CohortMembership, CohortRole, RoleAssignment, Session, SessionId, User, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Initial contents for a [`MemoryStore`], usually read from a JSON file
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemorySeed {
    pub users: Vec<User>,
    pub sessions: Vec<Session>,
    pub role_assignments: Vec<RoleAssignment>,
    pub cohort_memberships: Vec<CohortMembership>,
}

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<UserId, User>,
    sessions: DashMap<SessionId, Session>,
    assignments: DashMap<UserId, Vec<RoleAssignment>>,
    memberships: DashMap<UserId, Vec<CohortMembership>>,
    audit_log: Mutex<Vec<AuditLogEntry>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated from a seed
    pub fn from_seed(seed: MemorySeed) -> Self {
        let store = Self::new();
        for user in seed.users {
            store.insert_user(user);
        }
        for session in seed.sessions {
            store.insert_session(session);
        }
        for assignment in seed.role_assignments {
            store.insert_assignment(assignment);
        }
        for membership in seed.cohort_memberships {
            store.insert_membership(membership);
        }
        store
    }

    /// Parse a JSON seed document
    pub fn from_json(json: &str) -> Result<Self> {
        let seed: MemorySeed = serde_json::from_str(json)
            .map_err(|e| Error::store_with_source("load_seed", "invalid seed document", e))?;
        Ok(Self::from_seed(seed))
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn insert_session(&self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    pub fn insert_assignment(&self, assignment: RoleAssignment) {
        self.assignments
            .entry(assignment.user_id.clone())
            .or_default()
            .push(assignment);
    }

    pub fn insert_membership(&self, membership: CohortMembership) {
        self.memberships
            .entry(membership.user_id.clone())
            .or_default()
            .push(membership);
    }

    /// Make every subsequent call fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of everything appended to the audit log so far
    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        match self.audit_log.lock() {
            Ok(log) => log.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn session(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get(id).map(|s| s.clone())
    }

    fn ensure_available(&self, operation: &str) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::store(operation, "store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_session(&self, id: &SessionId) -> Result<Option<Session>> {
        self.ensure_available("find_session")?;
        Ok(self.sessions.get(id).map(|s| s.clone()))
    }

    async fn invalidate_session(&self, id: &SessionId) -> Result<()> {
        self.ensure_available("invalidate_session")?;
        if let Some(mut session) = self.sessions.get_mut(id) {
            session.is_valid = false;
        }
        Ok(())
    }

    async fn invalidate_user_sessions(&self, user_id: &UserId) -> Result<usize> {
        self.ensure_available("invalidate_user_sessions")?;
        let mut changed = 0;
        for mut session in self.sessions.iter_mut() {
            if &session.user_id == user_id && session.is_valid {
                session.is_valid = false;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        self.ensure_available("purge_expired")?;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.is_live_at(now));
        Ok(before.saturating_sub(self.sessions.len()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>> {
        self.ensure_available("find_user")?;
        Ok(self.users.get(id).map(|u| u.clone()))
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn role_assignments(&self, user_id: &UserId) -> Result<Vec<RoleAssignment>> {
        self.ensure_available("role_assignments")?;
        Ok(self
            .assignments
            .get(user_id)
            .map(|a| a.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CohortStore for MemoryStore {
    async fn find_membership(
        &self,
        user_id: &UserId,
        cohort: &str,
        role: Option<CohortRole>,
    ) -> Result<Option<CohortMembership>> {
        self.ensure_available("find_membership")?;
        Ok(self.memberships.get(user_id).and_then(|memberships| {
            memberships
                .iter()
                .find(|m| {
                    m.is_active && m.cohort == cohort && role.map_or(true, |r| m.role == r)
                })
                .cloned()
        }))
    }

    async fn memberships(&self, user_id: &UserId) -> Result<Vec<CohortMembership>> {
        self.ensure_available("memberships")?;
        Ok(self
            .memberships
            .get(user_id)
            .map(|m| m.iter().filter(|m| m.is_active).cloned().collect())
            .unwrap_or_default())
    }

    async fn all_cohorts(&self) -> Result<Vec<String>> {
        self.ensure_available("all_cohorts")?;
        let cohorts: BTreeSet<String> = self
            .memberships
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .map(|m| m.cohort.clone())
                    .collect::<Vec<_>>()
            })
            .collect();
        Ok(cohorts.into_iter().collect())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, entry: AuditLogEntry) -> Result<()> {
        self.ensure_available("append_audit")?;
        let mut log = self
            .audit_log
            .lock()
            .map_err(|_| Error::store("append_audit", "audit log lock poisoned"))?;
        log.push(entry);
        Ok(())
    }
}
