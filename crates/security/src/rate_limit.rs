//! Fixed-window request counting per client and route class.
//!
//! Counters are keyed `"{class}:{client}"` and live in a `DashMap`. All
//! read-modify-write happens while holding the entry's shard lock, so two
//! concurrent requests for one key can never both take the last slot.

use crate::authenticator::RequestMeta;
use chrono::{DateTime, Duration, Utc};
use cohortgate_config::{RateLimitSettings, UnidentifiedClientPolicy, WindowSettings};
use cohortgate_core::{Error, LOOPBACK_CLIENT};
use dashmap::DashMap;
use std::fmt;

/// Named budgets with independent counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitClass {
    Global,
    Auth,
    Api,
}

impl LimitClass {
    pub fn as_str(self) -> &'static str {
        match self {
            LimitClass::Global => "global",
            LimitClass::Auth => "auth",
            LimitClass::Api => "api",
        }
    }
}

impl fmt::Display for LimitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a request is counted against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientIdentity {
    Address(String),
    /// All clients whose address is unknown share one bucket
    Shared,
}

impl ClientIdentity {
    /// Proxy headers first, then the TCP peer. `None` means the request has
    /// no usable identity and the policy says to refuse it.
    pub fn resolve(meta: &RequestMeta, policy: UnidentifiedClientPolicy) -> Option<Self> {
        if let Some(client) = meta.forwarded_client() {
            return Some(ClientIdentity::Address(client.to_string()));
        }
        if let Some(peer) = meta.peer {
            return Some(ClientIdentity::Address(peer.to_string()));
        }
        match policy {
            UnidentifiedClientPolicy::SharedBucket => Some(ClientIdentity::Shared),
            UnidentifiedClientPolicy::Reject => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ClientIdentity::Address(address) => address,
            ClientIdentity::Shared => LOOPBACK_CLIENT,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Result of counting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitOutcome {
    pub class: LimitClass,
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    /// Whole seconds until the window resets; set only on denial
    pub retry_after_secs: Option<u64>,
}

impl RateLimitOutcome {
    pub fn reset_epoch_secs(&self) -> i64 {
        self.reset_at.timestamp()
    }

    /// The error to send back for a denied request
    pub fn to_error(&self) -> Error {
        Error::RateLimited {
            class: self.class.as_str().to_string(),
            limit: self.limit,
            reset_at_epoch_secs: self.reset_epoch_secs(),
            retry_after_secs: self.retry_after_secs.unwrap_or(1),
        }
    }
}

pub struct RateLimiter {
    settings: RateLimitSettings,
    counters: DashMap<String, WindowEntry>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings,
            counters: DashMap::new(),
        }
    }

    pub fn policy(&self) -> UnidentifiedClientPolicy {
        self.settings.unidentified_clients
    }

    pub fn window(&self, class: LimitClass) -> WindowSettings {
        match class {
            LimitClass::Global => self.settings.global,
            LimitClass::Auth => self.settings.auth,
            LimitClass::Api => self.settings.api,
        }
    }

    pub fn check(&self, class: LimitClass, client: &ClientIdentity) -> RateLimitOutcome {
        self.check_at(class, client, Utc::now())
    }

    pub fn check_at(
        &self,
        class: LimitClass,
        client: &ClientIdentity,
        now: DateTime<Utc>,
    ) -> RateLimitOutcome {
        let window = self.window(class);
        let key = format!("{class}:{}", client.as_str());

        let mut entry = self.counters.entry(key).or_insert_with(|| WindowEntry {
            count: 0,
            reset_at: window_end(now, window),
        });
        // a request landing exactly on reset_at still belongs to the old window
        if now > entry.reset_at {
            entry.count = 0;
            entry.reset_at = window_end(now, window);
        }

        let reset_at = entry.reset_at;
        if entry.count >= window.max_requests {
            drop(entry);
            let retry_after = retry_after_secs(reset_at, now);
            tracing::warn!(
                class = %class,
                client = client.as_str(),
                retry_after,
                "rate limit exceeded"
            );
            return RateLimitOutcome {
                class,
                allowed: false,
                limit: window.max_requests,
                remaining: 0,
                reset_at,
                retry_after_secs: Some(retry_after),
            };
        }

        entry.count += 1;
        RateLimitOutcome {
            class,
            allowed: true,
            limit: window.max_requests,
            remaining: window.max_requests - entry.count,
            reset_at,
            retry_after_secs: None,
        }
    }

    /// Drop counters whose window has elapsed; returns how many went
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.counters.len();
        self.counters.retain(|_, entry| entry.reset_at >= now);
        before.saturating_sub(self.counters.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.counters.len()
    }
}

fn window_end(now: DateTime<Utc>, window: WindowSettings) -> DateTime<Utc> {
    let millis = i64::try_from(window.window_ms).unwrap_or(i64::MAX);
    Duration::try_milliseconds(millis)
        .and_then(|span| now.checked_add_signed(span))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn retry_after_secs(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (reset_at - now).num_milliseconds().max(0);
    let secs = u64::try_from(millis).unwrap_or(0).div_ceil(1000);
    secs.max(1)
}
