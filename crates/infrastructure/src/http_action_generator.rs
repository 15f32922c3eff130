use async_trait::async_trait;
use clawcook_application::{ActionGenerator, ActionRequest};
use clawcook_core::{AppError, AppResult};
use serde_json::{Value, json};

/// Forwards allowed actions to an HTTP generator service.
///
/// Requests go to `{base_url}/{kind}` with the resolved subject in the body;
/// the JSON reply is returned unchanged.
#[derive(Clone)]
pub struct HttpActionGenerator {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpActionGenerator {
    /// Creates a generator client for `base_url`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn endpoint(&self, request: &ActionRequest) -> String {
        format!("{}/{}", self.base_url, request.kind.as_str())
    }
}

fn request_body(request: &ActionRequest) -> Value {
    json!({
        "handle": request.subject.handle().as_str(),
        "subject_id": request.subject.subject_id().as_u64(),
    })
}

#[async_trait]
impl ActionGenerator for HttpActionGenerator {
    async fn generate(&self, request: &ActionRequest) -> AppResult<Value> {
        let response = self
            .http_client
            .post(self.endpoint(request))
            .json(&request_body(request))
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("{} generator request failed: {error}", request.kind))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "{} generator returned status {status}",
                request.kind
            )));
        }

        response.json::<Value>().await.map_err(|error| {
            AppError::Upstream(format!(
                "{} generator returned invalid JSON: {error}",
                request.kind
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use clawcook_application::ActionKind;
    use clawcook_domain::{ClientAddress, Handle, QuotaSubject, SubjectId};

    use super::*;

    fn request(kind: ActionKind) -> ActionRequest {
        let handle = Handle::new("@Alice").unwrap_or_else(|error| panic!("handle: {error}"));
        ActionRequest {
            kind,
            subject: QuotaSubject::new(SubjectId::new(42), handle, ClientAddress::unknown()),
        }
    }

    #[test]
    fn endpoint_is_keyed_by_action_kind() {
        let generator =
            HttpActionGenerator::new(reqwest::Client::new(), "http://generator.local/");

        assert_eq!(
            generator.endpoint(&request(ActionKind::Roast)),
            "http://generator.local/roast"
        );
        assert_eq!(
            generator.endpoint(&request(ActionKind::Deploy)),
            "http://generator.local/deploy"
        );
    }

    #[test]
    fn body_carries_normalized_handle_and_subject() {
        let body = request_body(&request(ActionKind::Roast));
        assert_eq!(body["handle"], "alice");
        assert_eq!(body["subject_id"], 42);
    }
}
