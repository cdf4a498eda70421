//! Periodic background cleanup and the shutdown drain of the audit queue.

use crate::state::AppState;
use chrono::Utc;
use cohortgate_security::{AuditLogger, AuditStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Start the rate-limit sweeper and the session purge loop
pub fn spawn(state: &AppState) -> Vec<JoinHandle<()>> {
    let sweep_every = Duration::from_secs(state.config.rate_limit.sweep_interval_secs.max(1));
    let purge_every = Duration::from_secs(state.config.sessions.purge_interval_secs.max(1));

    let limiter = state.limiter.clone();
    let sweeper = tokio::spawn(async move {
        let mut ticker = interval(sweep_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = limiter.purge_expired(Utc::now());
            if purged > 0 {
                let remaining = limiter.tracked_keys();
                tracing::debug!(purged, remaining, "rate limit windows swept");
            }
        }
    });

    let sessions = state.sessions.clone();
    let purger = tokio::spawn(async move {
        let mut ticker = interval(purge_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match sessions.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "expired sessions purged"),
                Err(err) => tracing::error!(error = %err, "session purge failed"),
            }
        }
    });

    vec![sweeper, purger]
}

/// Flush queued audit entries once the server has stopped. Returns `None`
/// when the logger is still shared and cannot be shut down yet.
pub async fn drain_audit(audit: Arc<AuditLogger>) -> Option<AuditStats> {
    match Arc::try_unwrap(audit) {
        Ok(logger) => {
            let stats = logger.shutdown().await;
            tracing::info!(
                written = stats.written,
                failed = stats.failed,
                dropped = stats.dropped,
                "audit queue drained"
            );
            Some(stats)
        }
        Err(shared) => {
            tracing::warn!(
                references = Arc::strong_count(&shared),
                "audit logger still in use, queued entries may be lost"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use cohortgate_config::{Config, JwtSecret};
    use cohortgate_core::{AuditAction, MemoryStore, Principal, Role, Session, SessionId, UserId};
    use cohortgate_security::{actor_for, ClientIdentity, LimitClass, RequestMeta};

    #[tokio::test(start_paused = true)]
    async fn test_background_cleanup() {
        let mut config = Config::default();
        config.auth.jwt_secret = JwtSecret::new("m".repeat(32));
        config.rate_limit.sweep_interval_secs = 1;
        config.sessions.purge_interval_secs = 1;

        let store = Arc::new(MemoryStore::new());
        store.insert_session(Session {
            id: SessionId::new("old"),
            user_id: UserId::new("u-1"),
            is_valid: false,
            expires_at: Utc::now() + ChronoDuration::hours(1),
        });
        let state = AppState::new(config, store.clone());
        state.limiter.check_at(
            LimitClass::Global,
            &ClientIdentity::Shared,
            Utc::now() - ChronoDuration::minutes(5),
        );

        let handles = spawn(&state);
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        assert!(store.session(&SessionId::new("old")).is_none());
        assert_eq!(state.limiter.tracked_keys(), 0);
        for handle in handles {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn test_drain_flushes_queued_audit_entries() {
        let mut config = Config::default();
        config.auth.jwt_secret = JwtSecret::new("d".repeat(32));
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone());

        let principal = Principal {
            id: UserId::new("u-admin"),
            email: "admin@team.org".into(),
            role: Role::Admin,
            is_active: true,
        };
        state.audit.record_request(
            &RequestMeta::default(),
            actor_for(&principal, None),
            AuditAction::SessionRevoked,
            "user",
            "u-5",
            None,
        );

        let audit = state.audit.clone();
        assert!(drain_audit(audit.clone()).await.is_none());

        drop(state);
        let stats = drain_audit(audit).await.unwrap();
        assert_eq!(stats.written, 1);
        assert_eq!(store.audit_entries().len(), 1);
    }
}
