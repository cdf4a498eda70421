//! Request authentication and authorization for cohortgate.
//!
//! Every privileged request flows through the pieces in this crate in order:
//!
//! 1. [`RateLimiter`] counts the request against its fixed-window budget.
//! 2. [`RequestAuthenticator`] verifies the credential with [`TokenVerifier`]
//!    and confirms the session and user against the store.
//! 3. [`AuthorizationGate`] applies role, permission and cohort guards using
//!    [`RoleResolver`] and the static [`PermissionTable`].
//! 4. [`AuditLogger`] records privileged mutations without blocking the
//!    response.

pub mod audit;
pub mod authenticator;
pub mod cohorts;
pub mod csrf;
pub mod gate;
pub mod permissions;
pub mod rate_limit;
pub mod roles;
pub mod token;

pub use audit::{actor_for, AuditLogger, AuditStats};
pub use authenticator::{Authenticated, RequestAuthenticator, RequestMeta};
pub use cohorts::CohortAccess;
pub use gate::{AuthContext, AuthorizationGate, Guard};
pub use permissions::PermissionTable;
pub use rate_limit::{ClientIdentity, LimitClass, RateLimitOutcome, RateLimiter};
pub use roles::{effective_role, ResolvedRoles, RoleResolver};
pub use token::{Claims, TokenError, TokenVerifier};
