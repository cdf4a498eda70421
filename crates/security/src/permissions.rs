//! Static role to capability table.
//!
//! New capabilities are added here and nowhere else; guards only ever ask
//! [`PermissionTable::has_permission`].

use cohortgate_core::{EffectiveRole, Permission, Role};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};

static TABLE: Lazy<PermissionTable> = Lazy::new(PermissionTable::build);

#[derive(Debug)]
pub struct PermissionTable {
    grants: HashMap<Role, BTreeSet<Permission>>,
}

impl PermissionTable {
    /// The process-wide table, built on first use
    pub fn global() -> &'static PermissionTable {
        &TABLE
    }

    fn build() -> Self {
        use Permission::*;

        let administration = [
            CanViewAllUsers,
            CanManageUsers,
            CanAssignRoles,
            CanViewPayments,
            CanManageApplications,
            CanManageMedia,
            CanSendEmails,
            CanViewAnalytics,
            CanExportData,
        ];

        let mut grants: HashMap<Role, BTreeSet<Permission>> = HashMap::new();
        grants.insert(Role::SuperAdmin, administration.into_iter().collect());
        grants.insert(
            Role::Admin,
            administration
                .into_iter()
                .filter(|p| !matches!(p, CanViewAllUsers | CanViewPayments))
                .collect(),
        );
        grants.insert(
            Role::Mentor,
            [CanManageMedia, CanViewCohortStudents, CanApproveStudentContent]
                .into_iter()
                .collect(),
        );
        grants.insert(
            Role::Student,
            [CanManageMedia, CanViewCohortMembers].into_iter().collect(),
        );
        grants.insert(Role::Alumni, [CanAccessAlumniNetwork].into_iter().collect());
        grants.insert(Role::User, [CanApplyToProgram].into_iter().collect());

        Self { grants }
    }

    pub fn has_permission(&self, role: Role, permission: Permission) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|granted| granted.contains(&permission))
    }

    /// Unassigned users hold no capabilities at all
    pub fn allows(&self, effective: &EffectiveRole, permission: Permission) -> bool {
        effective
            .role()
            .is_some_and(|role| self.has_permission(role, permission))
    }

    pub fn permissions(&self, role: Role) -> impl Iterator<Item = Permission> + '_ {
        self.grants.get(&role).into_iter().flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_admin_matrix() {
        let table = PermissionTable::global();
        assert!(table.has_permission(Role::SuperAdmin, Permission::CanViewPayments));
        assert!(!table.has_permission(Role::Admin, Permission::CanViewPayments));
        assert!(!table.has_permission(Role::Admin, Permission::CanViewAllUsers));
        assert!(table.has_permission(Role::Admin, Permission::CanManageUsers));
        assert!(table.has_permission(Role::Admin, Permission::CanViewAnalytics));
    }

    #[test]
    fn test_role_specific_capabilities() {
        let table = PermissionTable::global();
        assert!(table.has_permission(Role::Mentor, Permission::CanApproveStudentContent));
        assert!(!table.has_permission(Role::Student, Permission::CanApproveStudentContent));
        assert!(table.has_permission(Role::Alumni, Permission::CanAccessAlumniNetwork));
        assert!(table.has_permission(Role::User, Permission::CanApplyToProgram));
        assert_eq!(table.permissions(Role::Student).count(), 2);
    }

    #[test]
    fn test_unassigned_gets_nothing() {
        let table = PermissionTable::global();
        for permission in Permission::ALL {
            assert!(!table.allows(&EffectiveRole::Unassigned, permission));
        }
    }

    proptest! {
        #[test]
        fn test_lookup_is_pure(
            role in prop::sample::select(Role::ALL.to_vec()),
            permission in prop::sample::select(Permission::ALL.to_vec()),
        ) {
            let table = PermissionTable::global();
            let first = table.has_permission(role, permission);
            for _ in 0..3 {
                prop_assert_eq!(table.has_permission(role, permission), first);
            }
            let effective = EffectiveRole::Assigned { role, cohort: None };
            prop_assert_eq!(table.allows(&effective, permission), first);
        }
    }
}
