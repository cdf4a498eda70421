//! Core error type definitions

/// Result type alias for cohortgate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for authentication, authorization and store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No credential was presented with the request
    MissingToken,

    /// The credential failed signature, shape or expiry verification
    InvalidToken { reason: String },

    /// The session behind an otherwise valid credential is gone, revoked or expired
    SessionInvalid { session_id: String, reason: String },

    /// The user referenced by the credential no longer exists
    UserNotFound { user_id: String },

    /// The user exists but the account is deactivated
    UserInactive { user_id: String },

    /// Authenticated but not authorized for the requested action
    InsufficientPermissions { required: String },

    /// Cohort-scoped membership check failed
    NotInCohort {
        cohort: String,
        role: Option<String>,
    },

    /// Fixed-window budget exhausted for a client
    RateLimited {
        class: String,
        limit: u32,
        reset_at_epoch_secs: i64,
        retry_after_secs: u64,
    },

    /// External store failures (session, user, role, cohort, audit)
    Store {
        operation: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors
    Configuration { message: String },

    /// Anything else that should never reach the caller in detail
    Internal { message: String },
}
