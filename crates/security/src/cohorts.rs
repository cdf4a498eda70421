//! Cohort visibility helpers backed by membership records.

use cohortgate_core::{CohortRole, CohortStore, Principal, Result};
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct CohortAccess {
    store: Arc<dyn CohortStore>,
}

impl CohortAccess {
    pub fn new(store: Arc<dyn CohortStore>) -> Self {
        Self { store }
    }

    /// Admins see every cohort; everyone else needs an active membership,
    /// with the given role when one is asked for
    pub async fn can_access_cohort(
        &self,
        principal: &Principal,
        cohort: &str,
        role: Option<CohortRole>,
    ) -> Result<bool> {
        if principal.role.is_admin() {
            return Ok(true);
        }
        Ok(self
            .store
            .find_membership(&principal.id, cohort, role)
            .await?
            .is_some())
    }

    pub async fn accessible_cohorts(&self, principal: &Principal) -> Result<Vec<String>> {
        let cohorts: BTreeSet<String> = if principal.role.is_admin() {
            self.store.all_cohorts().await?.into_iter().collect()
        } else {
            self.store
                .memberships(&principal.id)
                .await?
                .into_iter()
                .map(|m| m.cohort)
                .collect()
        };
        Ok(cohorts.into_iter().collect())
    }

    /// Content without a cohort is public
    pub async fn validate_cohort_access(
        &self,
        principal: &Principal,
        content_cohort: Option<&str>,
    ) -> Result<bool> {
        match content_cohort {
            None => Ok(true),
            Some(cohort) => self.can_access_cohort(principal, cohort, None).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohortgate_core::{CohortMembership, MemoryStore, Role, UserId};

    fn principal(id: &str, role: Role) -> Principal {
        Principal {
            id: UserId::new(id),
            email: format!("{id}@team.org"),
            role,
            is_active: true,
        }
    }

    fn membership(user: &str, cohort: &str, role: CohortRole, active: bool) -> CohortMembership {
        CohortMembership {
            user_id: UserId::new(user),
            cohort: cohort.into(),
            role,
            is_active: active,
        }
    }

    fn access() -> CohortAccess {
        let store = MemoryStore::new();
        store.insert_membership(membership("stu", "2025", CohortRole::Student, true));
        store.insert_membership(membership("stu", "2025", CohortRole::Student, true));
        store.insert_membership(membership("stu", "2023", CohortRole::Student, true));
        store.insert_membership(membership("stu", "2022", CohortRole::Student, false));
        store.insert_membership(membership("men", "2024", CohortRole::Mentor, true));
        CohortAccess::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_membership_required_for_members() {
        let access = access();
        let student = principal("stu", Role::Student);
        assert!(access.can_access_cohort(&student, "2025", None).await.unwrap());
        assert!(!access.can_access_cohort(&student, "2022", None).await.unwrap());
        assert!(!access
            .can_access_cohort(&student, "2025", Some(CohortRole::Mentor))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_admin_sees_everything() {
        let access = access();
        let admin = principal("adm", Role::Admin);
        assert!(access.can_access_cohort(&admin, "1999", None).await.unwrap());
        assert_eq!(
            access.accessible_cohorts(&admin).await.unwrap(),
            vec!["2022", "2023", "2024", "2025"]
        );
    }

    #[tokio::test]
    async fn test_accessible_cohorts_sorted_and_unique() {
        let access = access();
        let student = principal("stu", Role::Student);
        assert_eq!(
            access.accessible_cohorts(&student).await.unwrap(),
            vec!["2023", "2025"]
        );
    }

    #[tokio::test]
    async fn test_public_content() {
        let access = access();
        let outsider = principal("nobody", Role::User);
        assert!(access.validate_cohort_access(&outsider, None).await.unwrap());
        assert!(!access
            .validate_cohort_access(&outsider, Some("2025"))
            .await
            .unwrap());
    }
}
