//! HTTP surface for cohortgate.
//!
//! Wires the authorization core from `cohortgate-security` into an axum
//! router: hardening headers, request constraints, rate limiting, optional
//! CSRF checks and request logging wrap every route, and privileged handlers
//! call the [`AuthorizationGate`](cohortgate_security::AuthorizationGate)
//! before doing any work.

pub mod extract;
pub mod maintenance;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use response::{ApiError, RequestRejection};
pub use routes::router;
pub use state::AppState;
