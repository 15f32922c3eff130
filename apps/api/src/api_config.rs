use std::env;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use clawcook_application::{
    DEFAULT_IP_PER_MINUTE, DEFAULT_USER_PER_DAY, DEFAULT_USER_PER_MINUTE, QuotaLimits,
};
use clawcook_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_SOCIAL_GRAPH_BASE_URL: &str = "https://api.neynar.com/v2/farcaster";
const DEFAULT_COUNTER_STORE_TIMEOUT_MS: u64 = 3_000;
const MIN_COUNTER_STORE_TIMEOUT_MS: u64 = 100;
const MAX_COUNTER_STORE_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_LOCAL_COUNTER_PURGE_INTERVAL_SECONDS: u64 = 300;

/// Shared counter backend selected at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterStoreConfig {
    Memory,
    Upstash { rest_url: String, rest_token: String },
    Redis { redis_url: String },
    Postgres { database_url: String },
}

impl CounterStoreConfig {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Upstash { .. } => "upstash",
            Self::Redis { .. } => "redis",
            Self::Postgres { .. } => "postgres",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub counter_store: CounterStoreConfig,
    pub counter_store_timeout: Duration,
    pub quota_limits: QuotaLimits,
    pub local_counter_purge_interval: Duration,
    pub metrics_api_token: Option<String>,
    pub social_graph_base_url: String,
    pub social_graph_api_key: String,
    pub action_generator_url: String,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_source(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_source(source: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let lookup = |name: &str| {
            source(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = parse_number::<u16>(&lookup, "API_PORT")?.unwrap_or(3001);
        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());

        let counter_store = parse_counter_store(&lookup)?;
        let counter_store_timeout_ms = parse_number::<u64>(&lookup, "COUNTER_STORE_TIMEOUT_MS")?
            .unwrap_or(DEFAULT_COUNTER_STORE_TIMEOUT_MS)
            .clamp(MIN_COUNTER_STORE_TIMEOUT_MS, MAX_COUNTER_STORE_TIMEOUT_MS);

        let quota_limits = QuotaLimits::new(
            parse_number(&lookup, "QUOTA_USER_PER_MINUTE")?.unwrap_or(DEFAULT_USER_PER_MINUTE),
            parse_number(&lookup, "QUOTA_USER_PER_DAY")?.unwrap_or(DEFAULT_USER_PER_DAY),
            parse_number(&lookup, "QUOTA_IP_PER_MINUTE")?.unwrap_or(DEFAULT_IP_PER_MINUTE),
        )?;

        let purge_interval_seconds =
            parse_number::<u64>(&lookup, "LOCAL_COUNTER_PURGE_INTERVAL_SECONDS")?
                .unwrap_or(DEFAULT_LOCAL_COUNTER_PURGE_INTERVAL_SECONDS)
                .max(1);

        let social_graph_base_url = lookup("SOCIAL_GRAPH_BASE_URL")
            .unwrap_or_else(|| DEFAULT_SOCIAL_GRAPH_BASE_URL.to_owned());
        validate_url("SOCIAL_GRAPH_BASE_URL", &social_graph_base_url)?;
        let social_graph_api_key = required_non_empty(&lookup, "SOCIAL_GRAPH_API_KEY")?;
        let action_generator_url = required_non_empty(&lookup, "ACTION_GENERATOR_URL")?;
        validate_url("ACTION_GENERATOR_URL", &action_generator_url)?;

        Ok(Self {
            api_host,
            api_port,
            frontend_url,
            counter_store,
            counter_store_timeout: Duration::from_millis(counter_store_timeout_ms),
            quota_limits,
            local_counter_purge_interval: Duration::from_secs(purge_interval_seconds),
            metrics_api_token: lookup("METRICS_API_TOKEN"),
            social_graph_base_url,
            social_graph_api_key,
            action_generator_url,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_counter_store(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<CounterStoreConfig, AppError> {
    let upstash = || match (
        lookup("UPSTASH_REDIS_REST_URL"),
        lookup("UPSTASH_REDIS_REST_TOKEN"),
    ) {
        (Some(rest_url), Some(rest_token)) => Some((rest_url, rest_token)),
        _ => None,
    };

    let selection = lookup("COUNTER_STORE")
        .unwrap_or_else(|| "auto".to_owned())
        .to_ascii_lowercase();

    let config = match selection.as_str() {
        "auto" => match upstash() {
            Some((rest_url, rest_token)) => CounterStoreConfig::Upstash {
                rest_url,
                rest_token,
            },
            None => CounterStoreConfig::Memory,
        },
        "memory" => CounterStoreConfig::Memory,
        "upstash" => {
            let (rest_url, rest_token) = upstash().ok_or_else(|| {
                AppError::Validation(
                    "UPSTASH_REDIS_REST_URL and UPSTASH_REDIS_REST_TOKEN are required when COUNTER_STORE=upstash"
                        .to_owned(),
                )
            })?;
            CounterStoreConfig::Upstash {
                rest_url,
                rest_token,
            }
        }
        "redis" => CounterStoreConfig::Redis {
            redis_url: lookup("REDIS_URL").ok_or_else(|| {
                AppError::Validation("REDIS_URL is required when COUNTER_STORE=redis".to_owned())
            })?,
        },
        "postgres" => CounterStoreConfig::Postgres {
            database_url: lookup("DATABASE_URL").ok_or_else(|| {
                AppError::Validation(
                    "DATABASE_URL is required when COUNTER_STORE=postgres".to_owned(),
                )
            })?,
        },
        other => {
            return Err(AppError::Validation(format!(
                "COUNTER_STORE must be one of 'auto', 'memory', 'upstash', 'redis' or 'postgres', got '{other}'"
            )));
        }
    };

    if let CounterStoreConfig::Upstash { rest_url, .. } = &config {
        validate_url("UPSTASH_REDIS_REST_URL", rest_url)?;
    }

    Ok(config)
}

fn parse_number<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    lookup(name)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
        })
        .transpose()
}

fn required_non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn validate_url(name: &str, value: &str) -> Result<(), AppError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let mut values: HashMap<String, String> = HashMap::from([
            ("SOCIAL_GRAPH_API_KEY".to_owned(), "key".to_owned()),
            (
                "ACTION_GENERATOR_URL".to_owned(),
                "http://generator.local".to_owned(),
            ),
        ]);
        for (name, value) in pairs {
            values.insert((*name).to_owned(), (*value).to_owned());
        }

        ApiConfig::from_source(|name| values.get(name).cloned())
    }

    #[test]
    fn defaults_select_memory_store_and_standard_limits() {
        let config = config_from(&[]).unwrap_or_else(|error| panic!("config: {error}"));

        assert_eq!(config.counter_store, CounterStoreConfig::Memory);
        assert_eq!(config.counter_store_timeout, Duration::from_secs(3));
        assert_eq!(config.quota_limits, QuotaLimits::default());
        assert_eq!(config.api_port, 3001);
        assert_eq!(config.social_graph_base_url, DEFAULT_SOCIAL_GRAPH_BASE_URL);
        assert!(config.metrics_api_token.is_none());
    }

    #[test]
    fn auto_selects_upstash_only_when_both_variables_are_set() {
        let partial = config_from(&[("UPSTASH_REDIS_REST_URL", "https://x.upstash.io")])
            .unwrap_or_else(|error| panic!("config: {error}"));
        assert_eq!(partial.counter_store, CounterStoreConfig::Memory);

        let blank_token = config_from(&[
            ("UPSTASH_REDIS_REST_URL", "https://x.upstash.io"),
            ("UPSTASH_REDIS_REST_TOKEN", "  "),
        ])
        .unwrap_or_else(|error| panic!("config: {error}"));
        assert_eq!(blank_token.counter_store, CounterStoreConfig::Memory);

        let full = config_from(&[
            ("UPSTASH_REDIS_REST_URL", "https://x.upstash.io"),
            ("UPSTASH_REDIS_REST_TOKEN", "secret"),
        ])
        .unwrap_or_else(|error| panic!("config: {error}"));
        assert_eq!(full.counter_store.label(), "upstash");
    }

    #[test]
    fn explicit_backends_require_their_connection_settings() {
        assert!(config_from(&[("COUNTER_STORE", "redis")]).is_err());
        assert!(config_from(&[("COUNTER_STORE", "postgres")]).is_err());
        assert!(config_from(&[("COUNTER_STORE", "upstash")]).is_err());
        assert!(config_from(&[("COUNTER_STORE", "memcached")]).is_err());

        let redis = config_from(&[
            ("COUNTER_STORE", "Redis"),
            ("REDIS_URL", "redis://127.0.0.1:6379"),
        ])
        .unwrap_or_else(|error| panic!("config: {error}"));
        assert_eq!(
            redis.counter_store,
            CounterStoreConfig::Redis {
                redis_url: "redis://127.0.0.1:6379".to_owned()
            }
        );
    }

    #[test]
    fn timeout_is_clamped() {
        let low = config_from(&[("COUNTER_STORE_TIMEOUT_MS", "5")])
            .unwrap_or_else(|error| panic!("config: {error}"));
        assert_eq!(low.counter_store_timeout, Duration::from_millis(100));

        let high = config_from(&[("COUNTER_STORE_TIMEOUT_MS", "60000")])
            .unwrap_or_else(|error| panic!("config: {error}"));
        assert_eq!(high.counter_store_timeout, Duration::from_secs(10));

        assert!(config_from(&[("COUNTER_STORE_TIMEOUT_MS", "soon")]).is_err());
    }

    #[test]
    fn api_port_must_be_a_valid_port_number() {
        let config = config_from(&[("API_PORT", "8080")])
            .unwrap_or_else(|error| panic!("config: {error}"));
        assert_eq!(config.api_port, 8080);

        assert!(matches!(
            config_from(&[("API_PORT", "eighty")]),
            Err(AppError::Validation(_))
        ));
        assert!(config_from(&[("API_PORT", "70000")]).is_err());
    }

    #[test]
    fn quota_overrides_are_validated() {
        let config = config_from(&[("QUOTA_USER_PER_MINUTE", "2"), ("QUOTA_IP_PER_MINUTE", "9")])
            .unwrap_or_else(|error| panic!("config: {error}"));
        assert_eq!(config.quota_limits.user_per_minute(), 2);
        assert_eq!(config.quota_limits.user_per_day(), 40);
        assert_eq!(config.quota_limits.ip_per_minute(), 9);

        assert!(config_from(&[("QUOTA_USER_PER_DAY", "0")]).is_err());
    }

    #[test]
    fn collaborator_settings_are_required() {
        let missing_key = ApiConfig::from_source(|name| match name {
            "ACTION_GENERATOR_URL" => Some("http://generator.local".to_owned()),
            _ => None,
        });
        assert!(missing_key.is_err());

        assert!(config_from(&[("ACTION_GENERATOR_URL", "not a url")]).is_err());
    }
}
