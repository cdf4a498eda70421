//! Error types and the caller-facing failure taxonomy

mod builders;
mod display;
mod kind;
mod types;

pub use kind::ErrorKind;
pub use types::{Error, Result};
