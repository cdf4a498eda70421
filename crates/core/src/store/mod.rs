//! Contracts for the external datastore.
//!
//! cohortgate never owns users, sessions, role assignments, cohort memberships
//! or the audit log. It reads and appends through these traits. Every call is a
//! suspension point and must report failure through `Err` rather than hang;
//! timeouts are the adapter's responsibility.

pub mod memory;

use crate::errors::Result;
use crate::types::{
    AuditLogEntry, CohortMembership, CohortRole, RoleAssignment, Session, SessionId, User, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemoryStore;

/// Session lookups and revocation
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session by id; `None` when it does not exist
    async fn find_session(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Mark one session invalid (logout)
    async fn invalidate_session(&self, id: &SessionId) -> Result<()>;

    /// Mark every session of a user invalid, returning how many changed
    async fn invalidate_user_sessions(&self, user_id: &UserId) -> Result<usize>;

    /// Delete sessions that are expired at `now` or already invalid
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// User account lookups
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>>;
}

/// Role assignment lookups
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// All assignments of a user, active or not
    async fn role_assignments(&self, user_id: &UserId) -> Result<Vec<RoleAssignment>>;
}

/// Cohort membership lookups
#[async_trait]
pub trait CohortStore: Send + Sync {
    /// An active membership of `user_id` in `cohort`, restricted to `role` when given
    async fn find_membership(
        &self,
        user_id: &UserId,
        cohort: &str,
        role: Option<CohortRole>,
    ) -> Result<Option<CohortMembership>>;

    /// Every active membership of a user
    async fn memberships(&self, user_id: &UserId) -> Result<Vec<CohortMembership>>;

    /// Every cohort name known to the store
    async fn all_cohorts(&self) -> Result<Vec<String>>;
}

/// Append-only audit log
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, entry: AuditLogEntry) -> Result<()>;
}
