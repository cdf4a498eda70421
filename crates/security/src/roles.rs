//! Role resolution over concurrent, cohort-scoped assignments.

use chrono::{DateTime, Utc};
use cohortgate_core::{EffectiveRole, Result, Role, RoleAssignment, RoleStore, UserId};
use std::cmp::Ordering;
use std::sync::Arc;

/// A user's active assignments plus the single effective role derived from them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRoles {
    pub active: Vec<RoleAssignment>,
    pub effective: EffectiveRole,
}

impl ResolvedRoles {
    /// Build from raw assignments, keeping only those active at `now`
    pub fn from_assignments(assignments: Vec<RoleAssignment>, now: DateTime<Utc>) -> Self {
        let active: Vec<_> = assignments
            .into_iter()
            .filter(|a| a.is_active_at(now))
            .collect();
        let effective = effective_role(&active);
        Self { active, effective }
    }

    /// True when any active assignment carries one of `roles`, scoped to
    /// `cohort` when one is given. Looks past the effective role.
    pub fn has_any(&self, roles: &[Role], cohort: Option<&str>) -> bool {
        self.active.iter().any(|a| a.grants(roles, cohort))
    }
}

/// Pick the winning assignment: highest role priority, then most recent
/// start date, then the lexically smallest cohort (global before scoped).
pub fn effective_role(active: &[RoleAssignment]) -> EffectiveRole {
    active
        .iter()
        .max_by(|a, b| {
            a.role
                .cmp(&b.role)
                .then_with(|| a.start_date.cmp(&b.start_date))
                .then_with(|| compare_cohort(b.cohort.as_deref(), a.cohort.as_deref()))
        })
        .map_or(EffectiveRole::Unassigned, |winner| EffectiveRole::Assigned {
            role: winner.role,
            cohort: winner.cohort.clone(),
        })
}

fn compare_cohort(a: Option<&str>, b: Option<&str>) -> Ordering {
    // `None` sorts first
    a.cmp(&b)
}

pub struct RoleResolver {
    store: Arc<dyn RoleStore>,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, user_id: &UserId) -> Result<ResolvedRoles> {
        self.resolve_at(user_id, Utc::now()).await
    }

    pub async fn resolve_at(&self, user_id: &UserId, now: DateTime<Utc>) -> Result<ResolvedRoles> {
        let assignments = self.store.role_assignments(user_id).await?;
        let resolved = ResolvedRoles::from_assignments(assignments, now);
        tracing::debug!(
            user_id = %user_id,
            active = resolved.active.len(),
            effective = ?resolved.effective.role(),
            "roles resolved"
        );
        Ok(resolved)
    }
}
