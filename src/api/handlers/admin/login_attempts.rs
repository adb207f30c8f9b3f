//! In-memory brute-force tracking for admin logins.
//!
//! Flow Overview:
//! 1) `check` rejects a key while its lockout is active; credentials are not looked at.
//! 2) `record_failure` counts failures; reaching `max_attempts` starts a lockout and resets the count.
//! 3) `record_success` forgets the key.
//!
//! Lockouts expire lazily: an elapsed lockout is treated as a clean slate on the
//! next access. Starting a new lockout also drops every elapsed one; there is
//! no background sweep.
//!
//! Scaling: state is process-local and lost on restart. With several instances
//! each one keeps its own view, so a client can spread attempts across them.
//! Check and update are separate map operations; concurrent failures from the
//! same key may be counted one short or one over.

use dashmap::DashMap;
use std::time::Duration;
use tracing::warn;

use super::session_token::now_millis;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_LOCKOUT: Duration = Duration::from_secs(15 * 60);

const MILLIS_PER_MINUTE: i64 = 60_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoginAttemptRecord {
    pub failure_count: u32,
    /// Zero means "not blocked".
    pub blocked_until_millis: i64,
}

impl LoginAttemptRecord {
    fn is_blocked_at(&self, now_millis: i64) -> bool {
        self.blocked_until_millis != 0 && now_millis < self.blocked_until_millis
    }

    fn lockout_elapsed_at(&self, now_millis: i64) -> bool {
        self.blocked_until_millis != 0 && now_millis >= self.blocked_until_millis
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptDecision {
    Allowed,
    Blocked { retry_after_millis: i64 },
}

impl AttemptDecision {
    /// Whole minutes left, rounded up.
    #[must_use]
    pub fn retry_after_minutes(&self) -> i64 {
        match self {
            Self::Allowed => 0,
            Self::Blocked { retry_after_millis } => {
                (retry_after_millis + MILLIS_PER_MINUTE - 1) / MILLIS_PER_MINUTE
            }
        }
    }

    /// Whole seconds left, rounded up (for `Retry-After`).
    #[must_use]
    pub fn retry_after_seconds(&self) -> i64 {
        match self {
            Self::Allowed => 0,
            Self::Blocked { retry_after_millis } => (retry_after_millis + 999) / 1000,
        }
    }
}

#[derive(Debug)]
pub struct LoginAttemptTracker {
    records: DashMap<String, LoginAttemptRecord>,
    max_attempts: u32,
    lockout: Duration,
}

impl Default for LoginAttemptTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_LOCKOUT)
    }
}

impl LoginAttemptTracker {
    #[must_use]
    pub fn new(max_attempts: u32, lockout: Duration) -> Self {
        Self {
            records: DashMap::new(),
            max_attempts: max_attempts.max(1),
            lockout,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn lockout(&self) -> Duration {
        self.lockout
    }

    #[must_use]
    pub fn check(&self, key: &str) -> AttemptDecision {
        self.check_at(key, now_millis())
    }

    #[must_use]
    pub fn check_at(&self, key: &str, now_millis: i64) -> AttemptDecision {
        match self.records.get(key) {
            Some(record) if record.is_blocked_at(now_millis) => AttemptDecision::Blocked {
                retry_after_millis: record.blocked_until_millis - now_millis,
            },
            _ => AttemptDecision::Allowed,
        }
    }

    pub fn record_failure(&self, key: &str) {
        self.record_failure_at(key, now_millis());
    }

    /// Count a failed attempt and start a lockout once the threshold is hit.
    pub fn record_failure_at(&self, key: &str, now_millis: i64) {
        let current = self
            .records
            .get(key)
            .map(|record| *record)
            .filter(|record| !record.lockout_elapsed_at(now_millis))
            .unwrap_or_default();

        let failure_count = current.failure_count.saturating_add(1);
        let next = if failure_count >= self.max_attempts {
            let lockout_millis = i64::try_from(self.lockout.as_millis()).unwrap_or(i64::MAX);
            warn!(
                client = %key,
                failures = failure_count,
                lockout_seconds = self.lockout.as_secs(),
                "admin login locked out"
            );
            // Lockouts are the only records that grow the map without bound.
            self.prune_expired_at(now_millis);
            LoginAttemptRecord {
                failure_count: 0,
                blocked_until_millis: now_millis.saturating_add(lockout_millis),
            }
        } else {
            LoginAttemptRecord {
                failure_count,
                blocked_until_millis: current.blocked_until_millis,
            }
        };

        self.records.insert(key.to_string(), next);
    }

    pub fn record_success(&self, key: &str) {
        self.records.remove(key);
    }

    #[must_use]
    pub fn record(&self, key: &str) -> Option<LoginAttemptRecord> {
        self.records.get(key).map(|record| *record)
    }

    /// Drop records whose lockout has elapsed. Counting records are kept.
    pub fn prune_expired_at(&self, now_millis: i64) {
        self.records
            .retain(|_, record| !record.lockout_elapsed_at(now_millis));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
