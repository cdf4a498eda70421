//! Core domain types for cohortgate.
//!
//! ## Organization
//!
//! - **`identity`**: users, principals, sessions and their id newtypes
//! - **`roles`**: the closed role enum, its priority order and the derived effective role
//! - **`permissions`**: the closed permission vocabulary
//! - **`assignments`**: role assignments and cohort memberships
//! - **`audit`**: append-only audit log entries

pub mod assignments;
pub mod audit;
pub mod identity;
pub mod permissions;
pub mod roles;

pub use assignments::*;
pub use audit::*;
pub use identity::*;
pub use permissions::*;
pub use roles::*;
