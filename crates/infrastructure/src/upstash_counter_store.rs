//! Counter store speaking the Upstash Redis REST protocol.

use std::time::Duration;

use async_trait::async_trait;
use clawcook_application::CounterStore;
use clawcook_core::{AppError, AppResult};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::counter_store_support::{checked_count, validate_increment};

/// Upstash REST implementation of the counter store port.
#[derive(Clone)]
pub struct UpstashCounterStore {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl UpstashCounterStore {
    /// Creates a store for the given REST endpoint and bearer token.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
            timeout,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder, operation: &str) -> AppResult<Value> {
        let response = request
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("upstash {operation} request failed: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Unavailable(format!(
                "upstash {operation} returned status {status}"
            )));
        }

        response.json::<Value>().await.map_err(|error| {
            AppError::Unavailable(format!("upstash {operation} returned invalid body: {error}"))
        })
    }
}

/// Reads the `INCR` count out of a `multi-exec` reply.
fn parse_transaction_count(body: Value) -> AppResult<u64> {
    let replies: Vec<CommandReply> = serde_json::from_value(body).map_err(|error| {
        AppError::Unavailable(format!("upstash transaction reply is malformed: {error}"))
    })?;

    if let Some(error) = replies.iter().find_map(|reply| reply.error.as_deref()) {
        return Err(AppError::Unavailable(format!(
            "upstash transaction failed: {error}"
        )));
    }

    let count = replies
        .first()
        .and_then(|reply| reply.result.as_ref())
        .and_then(value_as_i64)
        .ok_or_else(|| {
            AppError::Unavailable("upstash transaction reply is missing INCR result".to_owned())
        })?;

    checked_count(count, "upstash")
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

fn parse_ping(body: &Value) -> AppResult<()> {
    match body.get("result").and_then(Value::as_str) {
        Some(reply) if reply.eq_ignore_ascii_case("pong") => Ok(()),
        _ => Err(AppError::Unavailable(format!(
            "unexpected upstash ping response: {body}"
        ))),
    }
}

#[async_trait]
impl CounterStore for UpstashCounterStore {
    async fn increment_with_expiry(&self, key: &str, ttl_seconds: u64) -> AppResult<u64> {
        let ttl_seconds = validate_increment(key, ttl_seconds)?;
        let commands = json!([
            ["INCR", key],
            ["EXPIRE", key, ttl_seconds.to_string()],
        ]);

        let body = self
            .send(
                self.http_client
                    .post(self.endpoint("multi-exec"))
                    .json(&commands),
                "increment",
            )
            .await?;

        parse_transaction_count(body)
    }

    async fn ping(&self) -> AppResult<()> {
        let body = self
            .send(self.http_client.get(self.endpoint("ping")), "ping")
            .await?;
        parse_ping(&body)
    }

    fn backend_name(&self) -> &'static str {
        "upstash"
    }
}
