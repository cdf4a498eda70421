//! Core domain types, errors, constants and store contracts for cohortgate.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum, the `Result` alias and the closed
//!   `ErrorKind` taxonomy every failure collapses into at the HTTP edge.
//! - **`types`**: roles and their priority order, permissions, identities,
//!   sessions, role assignments, cohort memberships and audit entries.
//! - **`store`**: async traits for the external datastore plus an in-memory
//!   adapter.
//! - **`constants`**: header names, cookie names and default limits.

pub mod constants;
pub mod errors;
pub mod store;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, ErrorKind, Result},
    store::{AuditStore, CohortStore, MemoryStore, RoleStore, SessionStore, UserStore},
    types::*,
};
