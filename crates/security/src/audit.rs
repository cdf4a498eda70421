use crate::authenticator::RequestMeta;
use cohortgate_config::AuditSettings;
use cohortgate_core::{
    AuditAction, AuditActor, AuditLogEntry, AuditStore, EffectiveRole, Principal,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Counters exposed so audit failures are observable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    pub written: u64,
    pub failed: u64,
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct Counters {
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Fire-and-forget recorder of privileged actions.
///
/// Entries are queued to a background task that appends them to the store.
/// Recording never blocks and never fails: a full queue drops the entry and a
/// store failure is logged under the `audit` target.
pub struct AuditLogger {
    sender: Option<mpsc::Sender<AuditLogEntry>>,
    counters: Arc<Counters>,
    worker: Option<JoinHandle<()>>,
}

impl AuditLogger {
    /// Start the background writer. Must be called inside a Tokio runtime.
    pub fn spawn(store: Arc<dyn AuditStore>, settings: &AuditSettings) -> Self {
        if !settings.enabled {
            return Self::disabled();
        }

        let (sender, mut receiver) = mpsc::channel::<AuditLogEntry>(settings.queue_capacity);
        let counters = Arc::new(Counters::default());
        let worker_counters = counters.clone();

        let worker = tokio::spawn(async move {
            while let Some(entry) = receiver.recv().await {
                let action = entry.action;
                let entity_id = entry.entity_id.clone();
                match store.append(entry).await {
                    Ok(()) => {
                        worker_counters.written.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        worker_counters.failed.fetch_add(1, Ordering::Relaxed);
                        tracing::error!(
                            target: "audit",
                            action = %action,
                            entity_id = %entity_id,
                            error = %err,
                            "failed to persist audit entry"
                        );
                    }
                }
            }
            tracing::debug!(target: "audit", "audit writer stopped");
        });

        Self {
            sender: Some(sender),
            counters,
            worker: Some(worker),
        }
    }

    /// A logger that discards everything
    pub fn disabled() -> Self {
        Self {
            sender: None,
            counters: Arc::new(Counters::default()),
            worker: None,
        }
    }

    pub fn record(&self, entry: AuditLogEntry) {
        let Some(sender) = &self.sender else {
            return;
        };
        if let Err(err) = sender.try_send(entry) {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            let entry = match err {
                mpsc::error::TrySendError::Full(entry) | mpsc::error::TrySendError::Closed(entry) => {
                    entry
                }
            };
            tracing::warn!(
                target: "audit",
                action = %entry.action,
                entity_id = %entry.entity_id,
                "audit queue unavailable, entry dropped"
            );
        }
    }

    /// Record an action taken during a request, with the request's client
    /// address and user agent
    pub fn record_request(
        &self,
        meta: &RequestMeta,
        actor: AuditActor,
        action: AuditAction,
        entity_type: &str,
        entity_id: &str,
        details: Option<serde_json::Value>,
    ) {
        let mut entry = AuditLogEntry::new(action, entity_type, entity_id)
            .actor(actor)
            .client(meta.audit_ip(), meta.user_agent.clone());
        if let Some(details) = details {
            entry = entry.details(details);
        }
        self.record(entry);
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats {
            written: self.counters.written.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting entries and wait for queued ones to be written
    pub async fn shutdown(mut self) -> AuditStats {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if let Err(err) = worker.await {
                tracing::error!(target: "audit", error = %err, "audit writer panicked");
            }
        }
        self.stats()
    }
}

/// Actor of an audited action; admin when either the account role or the
/// effective role is an administrator
pub fn actor_for(principal: &Principal, effective: Option<&EffectiveRole>) -> AuditActor {
    let effective_admin = effective
        .and_then(EffectiveRole::role)
        .is_some_and(|role| role.is_admin());
    AuditActor {
        user_id: Some(principal.id.clone()),
        is_admin: principal.role.is_admin() || effective_admin,
    }
}
