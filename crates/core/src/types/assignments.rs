//! Role assignments and cohort memberships

use super::identity::UserId;
use super::roles::{CohortRole, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One role held by a user, optionally scoped to a cohort
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub user_id: UserId,
    pub role: Role,
    #[serde(default)]
    pub cohort: Option<String>,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl RoleAssignment {
    /// Active iff flagged active and not past its end date
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.end_date.map_or(true, |end| end > now)
    }

    /// Whether this assignment grants one of `roles`, inside `cohort` when one is required
    #[must_use]
    pub fn grants(&self, roles: &[Role], cohort: Option<&str>) -> bool {
        roles.contains(&self.role)
            && cohort.map_or(true, |wanted| self.cohort.as_deref() == Some(wanted))
    }
}

/// Membership of a user in a cohort, separate from the role table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortMembership {
    pub user_id: UserId,
    pub cohort: String,
    pub role: CohortRole,
    pub is_active: bool,
}
