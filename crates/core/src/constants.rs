/// Constants used throughout the cohortgate codebase
// Credential transport
pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const BEARER_SCHEME: &str = "Bearer";
pub const AUTH_COOKIE_NAME: &str = "auth_token";

// Client identity headers
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
pub const REAL_IP_HEADER: &str = "x-real-ip";
pub const USER_AGENT_HEADER: &str = "user-agent";

// Client identity fallbacks
pub const LOOPBACK_CLIENT: &str = "127.0.0.1";
pub const UNKNOWN_CLIENT: &str = "unknown";

// Rate limit response headers
pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";
pub const RETRY_AFTER_HEADER: &str = "retry-after";

// CSRF double-submit defaults
pub const CSRF_COOKIE_NAME: &str = "csrf_token";
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

// Request constraints
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

// Request log
pub const USER_AGENT_LOG_LIMIT: usize = 100;
pub const SLOW_REQUEST_MILLIS: u128 = 5_000;

// Minimum accepted HMAC secret length
pub const MIN_JWT_SECRET_BYTES: usize = 32;

// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "COHORTGATE_";
