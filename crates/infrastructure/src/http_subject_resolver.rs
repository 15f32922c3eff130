use async_trait::async_trait;
use clawcook_application::SubjectResolver;
use clawcook_core::{AppError, AppResult};
use clawcook_domain::{Handle, SubjectId};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

/// Resolves handles to numeric subject ids through a social-graph REST API.
#[derive(Clone)]
pub struct HttpSubjectResolver {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct UserLookupResponse {
    user: Option<UserLookupEntry>,
}

#[derive(Debug, Deserialize)]
struct UserLookupEntry {
    fid: Option<u64>,
}

impl HttpSubjectResolver {
    /// Creates a resolver against `base_url` authenticated with `api_key`.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
        }
    }

    fn lookup_url(&self, handle: &Handle) -> AppResult<Url> {
        Url::parse_with_params(
            &format!("{}/user/by_username", self.base_url),
            &[("username", handle.as_str())],
        )
        .map_err(|error| AppError::Internal(format!("invalid social graph url: {error}")))
    }
}

fn subject_from_lookup(handle: &Handle, body: UserLookupResponse) -> AppResult<SubjectId> {
    body.user
        .and_then(|user| user.fid)
        .filter(|fid| *fid > 0)
        .map(SubjectId::new)
        .ok_or_else(|| AppError::NotFound(format!("user '{handle}' not found")))
}

#[async_trait]
impl SubjectResolver for HttpSubjectResolver {
    async fn resolve_subject(&self, handle: &Handle) -> AppResult<SubjectId> {
        let response = self
            .http_client
            .get(self.lookup_url(handle)?)
            .header("accept", "application/json")
            .header("x-api-key", self.api_key.as_str())
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("social graph lookup failed: {error}"))
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("user '{handle}' not found")));
        }
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "failed to resolve user '{handle}' ({status})"
            )));
        }

        let body = response
            .json::<UserLookupResponse>()
            .await
            .map_err(|error| {
                AppError::Upstream(format!("invalid social graph response: {error}"))
            })?;

        subject_from_lookup(handle, body)
    }
}
