use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use clawcook_core::{AppError, AppResult};
use clawcook_domain::{ClientAddress, Handle, QuotaDecision, QuotaSubject};

use crate::quota_service::QuotaService;

use super::ports::{ActionGenerator, ActionKind, ActionRequest, SubjectResolver};

/// Result of an admitted action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// Identity that was charged for the action.
    pub subject: QuotaSubject,
    /// Generator payload.
    pub payload: Value,
}

/// Entry point for quota-gated actions.
#[derive(Clone)]
pub struct ActionService {
    quota_service: QuotaService,
    subject_resolver: Arc<dyn SubjectResolver>,
    action_generator: Arc<dyn ActionGenerator>,
}

impl ActionService {
    /// Creates the action entry point.
    #[must_use]
    pub fn new(
        quota_service: QuotaService,
        subject_resolver: Arc<dyn SubjectResolver>,
        action_generator: Arc<dyn ActionGenerator>,
    ) -> Self {
        Self {
            quota_service,
            subject_resolver,
            action_generator,
        }
    }

    /// Runs one action request through the quota gate.
    ///
    /// The quota is checked exactly once. A denial returns
    /// `AppError::RateLimited` carrying the user-facing reason and the
    /// generator is never called.
    pub async fn perform(
        &self,
        kind: ActionKind,
        raw_username: &str,
        client_address: ClientAddress,
    ) -> AppResult<ActionOutcome> {
        let handle = Handle::new(raw_username)?;
        let subject_id = self.subject_resolver.resolve_subject(&handle).await?;
        let subject = QuotaSubject::new(subject_id, handle, client_address);

        if let QuotaDecision::Denied { dimension, reason } =
            self.quota_service.check_rate_limit(&subject).await?
        {
            warn!(
                action = %kind,
                subject_id = %subject.subject_id(),
                handle = %subject.handle(),
                rule = %dimension,
                "action rejected by quota"
            );
            return Err(AppError::RateLimited(reason));
        }

        let request = ActionRequest { kind, subject };
        let payload = self.action_generator.generate(&request).await?;
        info!(
            action = %kind,
            subject_id = %request.subject.subject_id(),
            handle = %request.subject.handle(),
            "action completed"
        );

        Ok(ActionOutcome {
            subject: request.subject,
            payload,
        })
    }

    /// Returns the quota service gating actions.
    #[must_use]
    pub fn quota_service(&self) -> &QuotaService {
        &self.quota_service
    }
}
