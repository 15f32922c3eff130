//! Fixed-window counter keys.
//!
//! Minute windows bucket by `floor(epoch_millis / 60_000)`, daily windows by
//! UTC calendar date. Keys are pure functions of their inputs so every process
//! sharing a counter store lands on the same counter.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::quota::{ClientAddress, Handle, QuotaDimension, QuotaSubject, SubjectId};

/// Length of a minute window in seconds.
pub const MINUTE_WINDOW_SECONDS: u64 = 60;

/// TTL applied to minute counters: one window plus slack.
pub const MINUTE_KEY_TTL_SECONDS: u64 = 65;

/// TTL applied to daily counters. Two days absorbs clock skew around UTC midnight.
pub const DAILY_KEY_TTL_SECONDS: u64 = 172_800;

const MINUTE_WINDOW_MILLIS: i64 = 60_000;
const KEY_NAMESPACE: &str = "quota";

/// Counter key for one (dimension, identity, time bucket) triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WindowKey {
    dimension: QuotaDimension,
    key: String,
    ttl_seconds: u64,
}

impl WindowKey {
    /// Returns the quota dimension this key counts.
    #[must_use]
    pub fn dimension(&self) -> QuotaDimension {
        self.dimension
    }

    /// Returns the storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Returns the TTL to (re)apply on every increment.
    #[must_use]
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }
}

/// Returns the minute bucket index for an instant.
#[must_use]
pub fn minute_bucket(now: DateTime<Utc>) -> i64 {
    now.timestamp_millis().div_euclid(MINUTE_WINDOW_MILLIS)
}

/// Returns the UTC calendar date used as the daily bucket.
#[must_use]
pub fn daily_bucket(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Key for the per-user-per-minute counter.
#[must_use]
pub fn user_minute_key(subject_id: SubjectId, handle: &Handle, now: DateTime<Utc>) -> WindowKey {
    WindowKey {
        dimension: QuotaDimension::UserMinute,
        key: format!(
            "{KEY_NAMESPACE}:{}:{subject_id}:{handle}:{}",
            QuotaDimension::UserMinute.as_str(),
            minute_bucket(now)
        ),
        ttl_seconds: MINUTE_KEY_TTL_SECONDS,
    }
}

/// Key for the per-user-per-day counter.
#[must_use]
pub fn user_daily_key(subject_id: SubjectId, handle: &Handle, now: DateTime<Utc>) -> WindowKey {
    WindowKey {
        dimension: QuotaDimension::UserDaily,
        key: format!(
            "{KEY_NAMESPACE}:{}:{subject_id}:{handle}:{}",
            QuotaDimension::UserDaily.as_str(),
            daily_bucket(now)
        ),
        ttl_seconds: DAILY_KEY_TTL_SECONDS,
    }
}

/// Key for the per-client-address-per-minute counter.
#[must_use]
pub fn ip_minute_key(client_address: &ClientAddress, now: DateTime<Utc>) -> WindowKey {
    WindowKey {
        dimension: QuotaDimension::IpMinute,
        key: format!(
            "{KEY_NAMESPACE}:{}:{client_address}:{}",
            QuotaDimension::IpMinute.as_str(),
            minute_bucket(now)
        ),
        ttl_seconds: MINUTE_KEY_TTL_SECONDS,
    }
}

/// All three keys for a subject, in rule evaluation order.
#[must_use]
pub fn window_keys(subject: &QuotaSubject, now: DateTime<Utc>) -> [WindowKey; 3] {
    [
        user_minute_key(subject.subject_id(), subject.handle(), now),
        user_daily_key(subject.subject_id(), subject.handle(), now),
        ip_minute_key(subject.client_address(), now),
    ]
}
