use clawcook_core::{AppError, AppResult};
use clawcook_domain::{MINUTE_WINDOW_SECONDS, QuotaDimension};

/// Default requests allowed per user per minute.
pub const DEFAULT_USER_PER_MINUTE: u64 = 5;

/// Default requests allowed per user per UTC day.
pub const DEFAULT_USER_PER_DAY: u64 = 40;

/// Default requests allowed per client address per minute.
pub const DEFAULT_IP_PER_MINUTE: u64 = 25;

/// Thresholds for the three quota rules.
///
/// A counter may reach its threshold; the request that pushes it past the
/// threshold is denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    user_per_minute: u64,
    user_per_day: u64,
    ip_per_minute: u64,
}

impl QuotaLimits {
    /// Creates limits, rejecting zero thresholds.
    pub fn new(user_per_minute: u64, user_per_day: u64, ip_per_minute: u64) -> AppResult<Self> {
        for (name, value) in [
            ("user_per_minute", user_per_minute),
            ("user_per_day", user_per_day),
            ("ip_per_minute", ip_per_minute),
        ] {
            if value == 0 {
                return Err(AppError::Validation(format!(
                    "quota limit {name} must be greater than zero"
                )));
            }
        }

        Ok(Self {
            user_per_minute,
            user_per_day,
            ip_per_minute,
        })
    }

    /// Maximum requests per user per minute.
    #[must_use]
    pub fn user_per_minute(&self) -> u64 {
        self.user_per_minute
    }

    /// Maximum requests per user per UTC day.
    #[must_use]
    pub fn user_per_day(&self) -> u64 {
        self.user_per_day
    }

    /// Maximum requests per client address per minute.
    #[must_use]
    pub fn ip_per_minute(&self) -> u64 {
        self.ip_per_minute
    }

    /// Threshold for one dimension.
    #[must_use]
    pub fn threshold(&self, dimension: QuotaDimension) -> u64 {
        match dimension {
            QuotaDimension::UserMinute => self.user_per_minute,
            QuotaDimension::UserDaily => self.user_per_day,
            QuotaDimension::IpMinute => self.ip_per_minute,
        }
    }

    /// User-facing reason for a denial on `dimension`.
    #[must_use]
    pub fn denial_reason(&self, dimension: QuotaDimension) -> String {
        match dimension {
            QuotaDimension::UserMinute => format!(
                "Rate limit exceeded: max {} requests per {MINUTE_WINDOW_SECONDS} seconds. \
                 Please retry after {MINUTE_WINDOW_SECONDS} seconds.",
                self.user_per_minute
            ),
            QuotaDimension::UserDaily => format!(
                "Daily limit reached: max {} requests per day. Limit resets tomorrow (UTC).",
                self.user_per_day
            ),
            QuotaDimension::IpMinute => "Too many requests from your network. \
                 Please slow down and try again in a minute."
                .to_owned(),
        }
    }
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            user_per_minute: DEFAULT_USER_PER_MINUTE,
            user_per_day: DEFAULT_USER_PER_DAY,
            ip_per_minute: DEFAULT_IP_PER_MINUTE,
        }
    }
}
