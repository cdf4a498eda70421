//! Display implementations for error types
//!
//! These strings are for operators and logs. What a caller gets to see comes
//! from [`Error::public_message`](super::types::Error::public_message).

use super::types::Error;
use std::fmt;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingToken => write!(f, "no authorization token presented"),
            Error::InvalidToken { reason } => write!(f, "token rejected: {reason}"),
            Error::SessionInvalid { session_id, reason } => {
                write!(f, "session '{session_id}' rejected: {reason}")
            }
            Error::UserNotFound { user_id } => write!(f, "user '{user_id}' not found"),
            Error::UserInactive { user_id } => write!(f, "user '{user_id}' is deactivated"),
            Error::InsufficientPermissions { required } => {
                write!(f, "insufficient permissions, requires {required}")
            }
            Error::NotInCohort { cohort, role } => match role {
                Some(role) => write!(f, "not a {role} of cohort '{cohort}'"),
                None => write!(f, "not a member of cohort '{cohort}'"),
            },
            Error::RateLimited {
                class,
                limit,
                retry_after_secs,
                ..
            } => write!(
                f,
                "rate limit '{class}' of {limit} requests exceeded, retry in {retry_after_secs}s"
            ),
            Error::Store {
                operation,
                message,
                source,
            } => match source {
                Some(source) => {
                    write!(f, "store operation '{operation}' failed: {message}: {source}")
                }
                None => write!(f, "store operation '{operation}' failed: {message}"),
            },
            Error::Configuration { message } => write!(f, "configuration error: {message}"),
            Error::Internal { message } => write!(f, "internal error: {message}"),
        }
    }
}
