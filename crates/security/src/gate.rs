//! Composable guards in front of privileged handlers.
//!
//! A gate authenticates once per request, then evaluates each [`Guard`] in
//! order. The first failing guard is terminal; its error is what the caller
//! must send back.

use crate::authenticator::{RequestAuthenticator, RequestMeta};
use crate::permissions::PermissionTable;
use crate::roles::{ResolvedRoles, RoleResolver};
use cohortgate_core::{
    CohortRole, CohortStore, Error, Permission, Principal, Result, Role, SessionId,
};
use std::sync::Arc;

/// One authorization predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Any valid session
    Authenticated,
    /// Some active assignment carries one of `roles`, in `cohort` if given
    Role {
        roles: Vec<Role>,
        cohort: Option<String>,
    },
    /// The effective role grants the capability
    Permission(Permission),
    /// An active cohort membership record exists
    CohortMembership {
        cohort: String,
        role: Option<CohortRole>,
    },
}

impl Guard {
    pub fn role(roles: &[Role]) -> Self {
        Guard::Role {
            roles: roles.to_vec(),
            cohort: None,
        }
    }

    pub fn role_in(roles: &[Role], cohort: impl Into<String>) -> Self {
        Guard::Role {
            roles: roles.to_vec(),
            cohort: Some(cohort.into()),
        }
    }

    pub fn member_of(cohort: impl Into<String>, role: Option<CohortRole>) -> Self {
        Guard::CohortMembership {
            cohort: cohort.into(),
            role,
        }
    }

    fn needs_roles(&self) -> bool {
        matches!(self, Guard::Role { .. } | Guard::Permission(_))
    }
}

/// What a handler behind a gate knows about its caller
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
    pub session_id: SessionId,
    /// Present when a role or permission guard ran
    pub roles: Option<ResolvedRoles>,
    /// Cohort confirmed by a membership guard
    pub cohort: Option<String>,
}

pub struct AuthorizationGate {
    authenticator: RequestAuthenticator,
    resolver: RoleResolver,
    cohorts: Arc<dyn CohortStore>,
    permissions: &'static PermissionTable,
}

impl AuthorizationGate {
    pub fn new(
        authenticator: RequestAuthenticator,
        resolver: RoleResolver,
        cohorts: Arc<dyn CohortStore>,
    ) -> Self {
        Self {
            authenticator,
            resolver,
            cohorts,
            permissions: PermissionTable::global(),
        }
    }

    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    pub async fn require_authenticated(&self, meta: &RequestMeta) -> Result<AuthContext> {
        self.authorize(meta, &[Guard::Authenticated]).await
    }

    pub async fn require_role(
        &self,
        meta: &RequestMeta,
        roles: &[Role],
        cohort: Option<&str>,
    ) -> Result<AuthContext> {
        let guard = Guard::Role {
            roles: roles.to_vec(),
            cohort: cohort.map(str::to_string),
        };
        self.authorize(meta, &[guard]).await
    }

    pub async fn require_permission(
        &self,
        meta: &RequestMeta,
        permission: Permission,
    ) -> Result<AuthContext> {
        self.authorize(meta, &[Guard::Permission(permission)]).await
    }

    pub async fn require_cohort_membership(
        &self,
        meta: &RequestMeta,
        cohort: &str,
        role: Option<CohortRole>,
    ) -> Result<AuthContext> {
        self.authorize(meta, &[Guard::member_of(cohort, role)]).await
    }

    /// Authenticate and evaluate every guard, stopping at the first failure
    pub async fn authorize(&self, meta: &RequestMeta, guards: &[Guard]) -> Result<AuthContext> {
        let authenticated = self.authenticator.authenticate(meta).await?;
        let mut context = AuthContext {
            principal: authenticated.principal,
            session_id: authenticated.session_id,
            roles: None,
            cohort: None,
        };

        if guards.iter().any(Guard::needs_roles) {
            context.roles = Some(self.resolver.resolve(&context.principal.id).await?);
        }

        for guard in guards {
            if let Err(err) = self.check(guard, &mut context).await {
                if !err.kind().is_internal() {
                    tracing::warn!(
                        user_id = %context.principal.id,
                        guard = ?guard,
                        code = err.kind().code(),
                        "authorization denied"
                    );
                }
                return Err(err);
            }
        }
        Ok(context)
    }

    async fn check(&self, guard: &Guard, context: &mut AuthContext) -> Result<()> {
        match guard {
            Guard::Authenticated => Ok(()),
            Guard::Role { roles, cohort } => {
                let granted = context
                    .roles
                    .as_ref()
                    .is_some_and(|resolved| resolved.has_any(roles, cohort.as_deref()));
                if granted {
                    Ok(())
                } else {
                    Err(Error::insufficient_permissions(describe_roles(
                        roles,
                        cohort.as_deref(),
                    )))
                }
            }
            Guard::Permission(permission) => {
                let granted = context.roles.as_ref().is_some_and(|resolved| {
                    self.permissions.allows(&resolved.effective, *permission)
                });
                if granted {
                    Ok(())
                } else {
                    Err(Error::insufficient_permissions(permission.as_str()))
                }
            }
            Guard::CohortMembership { cohort, role } => {
                let membership = self
                    .cohorts
                    .find_membership(&context.principal.id, cohort, *role)
                    .await?;
                if membership.is_none() {
                    return Err(Error::not_in_cohort(
                        cohort.as_str(),
                        role.map(|r| r.as_str().to_string()),
                    ));
                }
                context.cohort = Some(cohort.clone());
                Ok(())
            }
        }
    }
}

fn describe_roles(roles: &[Role], cohort: Option<&str>) -> String {
    let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
    let required = match names.as_slice() {
        [single] => format!("role {single}"),
        _ => format!("one of the roles {}", names.join(", ")),
    };
    match cohort {
        Some(cohort) => format!("{required} in cohort {cohort}"),
        None => required,
    }
}
