//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod quota;
mod quota_window;

pub use quota::{
    ClientAddress, Handle, QuotaDecision, QuotaDimension, QuotaSubject, SubjectId,
    UNKNOWN_CLIENT_ADDRESS,
};
pub use quota_window::{
    DAILY_KEY_TTL_SECONDS, MINUTE_KEY_TTL_SECONDS, MINUTE_WINDOW_SECONDS, WindowKey,
    daily_bucket, ip_minute_key, minute_bucket, user_daily_key, user_minute_key, window_keys,
};
