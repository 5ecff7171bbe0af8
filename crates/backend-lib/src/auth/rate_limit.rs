// ============================
// webpanel-backend-lib/src/auth/rate_limit.rs
// ============================
//! Rate limiting for login attempts.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use dashmap::DashMap;
use metrics::counter;

use crate::metrics::LOGIN_LOCKOUT;

/// How long an idle failure record is kept before the sweep drops it
const ENTRY_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Sweep interval for the background cleanup task
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug)]
struct AttemptEntry {
    failures: u32,
    last_failure: Instant,
    locked_until: Option<Instant>,
}

/// Tracks failed logins per client address and locks an address out
/// after too many failures in a row.
#[derive(Clone)]
pub struct LoginRateLimiter {
    attempts: Arc<DashMap<IpAddr, AttemptEntry>>,
    max_failures: u32,
    lockout: Duration,
}

impl LoginRateLimiter {
    /// Create a new limiter and spawn its periodic sweep task.
    pub fn new(max_failures: u32, lockout: Duration) -> Self {
        let limiter = Self {
            attempts: Arc::new(DashMap::new()),
            max_failures,
            lockout,
        };

        let sweeper = limiter.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVAL).await;
                sweeper.cleanup();
            }
        });

        limiter
    }

    /// Whether this address may attempt a login right now.
    pub fn check(&self, ip: IpAddr) -> bool {
        if let Some(entry) = self.attempts.get(&ip) {
            if let Some(until) = entry.locked_until {
                if Instant::now() < until {
                    return false;
                }
            }
        }
        true
    }

    /// Record a failed login; locks the address out once the failure
    /// budget is spent.
    pub fn record_failure(&self, ip: IpAddr) {
        let now = Instant::now();
        let mut entry = self.attempts.entry(ip).or_insert_with(|| AttemptEntry {
            failures: 0,
            last_failure: now,
            locked_until: None,
        });

        // an expired lockout starts a fresh budget
        if entry.locked_until.is_some_and(|until| now >= until) {
            entry.failures = 0;
            entry.locked_until = None;
        }

        entry.failures += 1;
        entry.last_failure = now;

        if entry.failures >= self.max_failures {
            entry.locked_until = Some(now + self.lockout);
            counter!(LOGIN_LOCKOUT).increment(1);
            tracing::warn!(%ip, failures = entry.failures, "address locked out after failed logins");
        }
    }

    /// A successful login clears the address's failure record.
    pub fn record_success(&self, ip: IpAddr) {
        self.attempts.remove(&ip);
    }

    /// Drop expired lockouts and stale failure records.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.attempts.retain(|_, entry| {
            if let Some(until) = entry.locked_until {
                return now < until;
            }
            now.duration_since(entry.last_failure) < ENTRY_RETENTION
        });
    }
}
