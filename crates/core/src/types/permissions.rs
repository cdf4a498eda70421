//! The closed permission vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Capabilities a role may be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    CanViewAllUsers,
    CanManageUsers,
    CanAssignRoles,
    CanViewPayments,
    CanManageApplications,
    CanManageMedia,
    CanSendEmails,
    CanViewAnalytics,
    CanExportData,
    CanViewCohortStudents,
    CanApproveStudentContent,
    CanViewCohortMembers,
    CanAccessAlumniNetwork,
    CanApplyToProgram,
}

impl Permission {
    pub const ALL: [Permission; 14] = [
        Permission::CanViewAllUsers,
        Permission::CanManageUsers,
        Permission::CanAssignRoles,
        Permission::CanViewPayments,
        Permission::CanManageApplications,
        Permission::CanManageMedia,
        Permission::CanSendEmails,
        Permission::CanViewAnalytics,
        Permission::CanExportData,
        Permission::CanViewCohortStudents,
        Permission::CanApproveStudentContent,
        Permission::CanViewCohortMembers,
        Permission::CanAccessAlumniNetwork,
        Permission::CanApplyToProgram,
    ];

    /// Wire name, e.g. `canViewAllUsers`
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::CanViewAllUsers => "canViewAllUsers",
            Permission::CanManageUsers => "canManageUsers",
            Permission::CanAssignRoles => "canAssignRoles",
            Permission::CanViewPayments => "canViewPayments",
            Permission::CanManageApplications => "canManageApplications",
            Permission::CanManageMedia => "canManageMedia",
            Permission::CanSendEmails => "canSendEmails",
            Permission::CanViewAnalytics => "canViewAnalytics",
            Permission::CanExportData => "canExportData",
            Permission::CanViewCohortStudents => "canViewCohortStudents",
            Permission::CanApproveStudentContent => "canApproveStudentContent",
            Permission::CanViewCohortMembers => "canViewCohortMembers",
            Permission::CanAccessAlumniNetwork => "canAccessAlumniNetwork",
            Permission::CanApplyToProgram => "canApplyToProgram",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown permission '{s}'"))
    }
}
