use cohortgate_config::Config;
use cohortgate_core::{AuditStore, CohortStore, RoleStore, SessionStore, UserStore};
use cohortgate_security::{
    AuditLogger, AuthorizationGate, CohortAccess, RateLimiter, RequestAuthenticator, RoleResolver,
};
use std::sync::Arc;

/// Shared state handed to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: Arc<AuthorizationGate>,
    pub limiter: Arc<RateLimiter>,
    pub audit: Arc<AuditLogger>,
    pub sessions: Arc<dyn SessionStore>,
    pub cohorts: Arc<CohortAccess>,
}

impl AppState {
    /// Build every component over one backing store. Spawns the audit
    /// writer, so this must run inside a Tokio runtime.
    pub fn new<S>(config: Config, store: Arc<S>) -> Self
    where
        S: SessionStore + UserStore + RoleStore + CohortStore + AuditStore + 'static,
    {
        let authenticator = RequestAuthenticator::new(&config.auth, store.clone(), store.clone());
        let gate = AuthorizationGate::new(
            authenticator,
            RoleResolver::new(store.clone()),
            store.clone(),
        );
        let audit = AuditLogger::spawn(store.clone(), &config.audit);

        Self {
            limiter: Arc::new(RateLimiter::new(config.rate_limit.clone())),
            gate: Arc::new(gate),
            audit: Arc::new(audit),
            sessions: store.clone(),
            cohorts: Arc::new(CohortAccess::new(store)),
            config: Arc::new(config),
        }
    }
}
