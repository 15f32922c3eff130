//! Quota identity and decision types.

use std::fmt::{Display, Formatter};

use clawcook_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Sentinel used when a request carries no usable client address.
pub const UNKNOWN_CLIENT_ADDRESS: &str = "unknown";

/// Stable numeric identifier of the acting social account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(u64);

impl SubjectId {
    /// Wraps a resolved account identifier.
    #[must_use]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for SubjectId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Normalized social handle.
///
/// Normalization trims surrounding whitespace, drops a single leading `@` and
/// lowercases the rest, so `@Alice` and `alice` share one quota bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle(String);

impl Handle {
    /// Normalizes and validates a raw handle.
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let trimmed = raw.as_ref().trim();
        let normalized = trimmed.strip_prefix('@').unwrap_or(trimmed).to_lowercase();

        if normalized.trim().is_empty() {
            return Err(AppError::Validation("Username is required.".to_owned()));
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized handle.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Handle {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Network address of the caller, or the `unknown` sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientAddress(String);

impl ClientAddress {
    /// Returns the sentinel address shared by all callers without one.
    #[must_use]
    pub fn unknown() -> Self {
        Self(UNKNOWN_CLIENT_ADDRESS.to_owned())
    }

    /// Takes the first hop of an `X-Forwarded-For` chain.
    #[must_use]
    pub fn from_forwarded_for(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map_or_else(Self::unknown, |value| Self(value.to_owned()))
    }

    /// Returns true when no real address was available.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_CLIENT_ADDRESS
    }

    /// Returns the address string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ClientAddress {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Identity tuple evaluated by the quota rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSubject {
    subject_id: SubjectId,
    handle: Handle,
    client_address: ClientAddress,
}

impl QuotaSubject {
    /// Creates a quota subject from already resolved parts.
    #[must_use]
    pub fn new(subject_id: SubjectId, handle: Handle, client_address: ClientAddress) -> Self {
        Self {
            subject_id,
            handle,
            client_address,
        }
    }

    /// Returns the resolved account identifier.
    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    /// Returns the normalized handle.
    #[must_use]
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Returns the client address (possibly the sentinel).
    #[must_use]
    pub fn client_address(&self) -> &ClientAddress {
        &self.client_address
    }
}

/// One independent axis along which quota is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaDimension {
    /// Requests per user per calendar minute.
    UserMinute,
    /// Requests per user per UTC day.
    UserDaily,
    /// Requests per client address per calendar minute.
    IpMinute,
}

impl QuotaDimension {
    /// All dimensions in rule evaluation order.
    pub const ALL: [Self; 3] = [Self::UserMinute, Self::UserDaily, Self::IpMinute];

    /// Returns the stable storage label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserMinute => "user_minute",
            Self::UserDaily => "user_daily",
            Self::IpMinute => "ip_minute",
        }
    }
}

impl Display for QuotaDimension {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Outcome of one quota evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QuotaDecision {
    /// Request may proceed.
    Allowed,
    /// Request was rejected by the first violated rule.
    Denied {
        /// Rule that fired.
        dimension: QuotaDimension,
        /// User-facing explanation.
        reason: String,
    },
}

impl QuotaDecision {
    /// Returns true for [`QuotaDecision::Allowed`].
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Returns the denial reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed => None,
            Self::Denied { reason, .. } => Some(reason.as_str()),
        }
    }

    /// Returns the rule that denied the request, if any.
    #[must_use]
    pub fn denied_dimension(&self) -> Option<QuotaDimension> {
        match self {
            Self::Allowed => None,
            Self::Denied { dimension, .. } => Some(*dimension),
        }
    }
}
