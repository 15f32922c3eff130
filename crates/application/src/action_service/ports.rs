use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use clawcook_core::AppResult;
use clawcook_domain::{Handle, QuotaSubject, SubjectId};

/// Quota-gated action a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Generate a roast for the handle.
    Roast,
    /// Generate a deploy persona for the handle.
    Deploy,
}

impl ActionKind {
    /// Returns the stable action label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Roast => "roast",
            Self::Deploy => "deploy",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Port resolving a normalized handle to its stable account identifier.
#[async_trait]
pub trait SubjectResolver: Send + Sync {
    /// Resolves the handle, failing with `AppError::NotFound` for unknown accounts.
    async fn resolve_subject(&self, handle: &Handle) -> AppResult<SubjectId>;
}

/// Input handed to the generator once quota has been granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRequest {
    /// Requested action.
    pub kind: ActionKind,
    /// Caller identity that passed the quota check.
    pub subject: QuotaSubject,
}

/// Port for the persona/quip generator behind the quota gate.
#[async_trait]
pub trait ActionGenerator: Send + Sync {
    /// Produces the action payload returned to the caller.
    async fn generate(&self, request: &ActionRequest) -> AppResult<Value>;
}
