//! Roles, their fixed priority order, and the derived effective role

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Organization-wide roles.
///
/// Ordering follows privilege: `SuperAdmin` is the greatest, `User` the least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    Mentor,
    Alumni,
    Student,
    #[default]
    User,
}

impl Role {
    /// Every role, most privileged first
    pub const ALL: [Role; 6] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Mentor,
        Role::Alumni,
        Role::Student,
        Role::User,
    ];

    /// Position in the priority order, higher wins
    #[must_use]
    pub fn priority(self) -> u8 {
        match self {
            Role::SuperAdmin => 5,
            Role::Admin => 4,
            Role::Mentor => 3,
            Role::Alumni => 2,
            Role::Student => 1,
            Role::User => 0,
        }
    }

    /// Wire name, e.g. `SUPER_ADMIN`
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::Mentor => "MENTOR",
            Role::Alumni => "ALUMNI",
            Role::Student => "STUDENT",
            Role::User => "USER",
        }
    }

    /// Admins and super-admins
    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown role '{s}'"))
    }
}

/// Role held inside a cohort membership record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CohortRole {
    Mentor,
    Student,
}

impl CohortRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CohortRole::Mentor => "MENTOR",
            CohortRole::Student => "STUDENT",
        }
    }
}

impl fmt::Display for CohortRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single highest-priority active role of a user.
///
/// `Unassigned` is its own state, not a low-priority role: every role or
/// permission gate treats it as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EffectiveRole {
    #[default]
    Unassigned,
    Assigned {
        role: Role,
        cohort: Option<String>,
    },
}

impl EffectiveRole {
    /// The winning role, if any
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        match self {
            EffectiveRole::Unassigned => None,
            EffectiveRole::Assigned { role, .. } => Some(*role),
        }
    }

    /// Cohort of the winning assignment; `None` for global roles or when unassigned
    #[must_use]
    pub fn cohort(&self) -> Option<&str> {
        match self {
            EffectiveRole::Unassigned => None,
            EffectiveRole::Assigned { cohort, .. } => cohort.as_deref(),
        }
    }

    #[must_use]
    pub fn is_assigned(&self) -> bool {
        matches!(self, EffectiveRole::Assigned { .. })
    }
}
