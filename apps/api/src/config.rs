use std::time::Duration;

use thiserror::Error;

use crate::generation::retry::RetryPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Required environment variable '{key}' is not set")]
    Missing { key: &'static str },

    #[error("Environment variable '{key}' is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Where quota records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaStoreKind {
    /// Shared PostgreSQL table; safe across horizontally scaled processes.
    Postgres,
    /// Process-local map. Local development only.
    Memory,
}

/// Credentials and location for the optional PDF archive bucket.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration, loaded and validated once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub quota_store: QuotaStoreKind,
    pub database_url: Option<String>,
    pub anthropic_api_key: String,
    pub llm_model: String,
    pub port: u16,
    pub rust_log: String,
    pub daily_limit: u32,
    pub fit_max_iterations: u32,
    pub generation_max_attempts: u32,
    pub generation_backoff: Vec<Duration>,
    pub request_timeout: Duration,
    pub archive: Option<ArchiveConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` is a thin wrapper.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let quota_store = match env.optional("QUOTA_STORE").as_deref() {
            None | Some("postgres") => QuotaStoreKind::Postgres,
            Some("memory") => QuotaStoreKind::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "QUOTA_STORE",
                    reason: format!("expected 'postgres' or 'memory', got '{other}'"),
                })
            }
        };

        let database_url = match quota_store {
            QuotaStoreKind::Postgres => Some(env.require("DATABASE_URL")?),
            QuotaStoreKind::Memory => env.optional("DATABASE_URL"),
        };

        Ok(Config {
            quota_store,
            database_url,
            anthropic_api_key: env.require("ANTHROPIC_API_KEY")?,
            llm_model: env
                .optional("LLM_MODEL")
                .unwrap_or_else(|| "claude-sonnet-4-5".to_string()),
            port: env.parse_or("PORT", 8080u16)?,
            rust_log: env.optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            daily_limit: env.positive("DAILY_LIMIT", 1)?,
            fit_max_iterations: env.positive("FIT_MAX_ITERATIONS", 3)?,
            generation_max_attempts: env.positive("GENERATION_MAX_ATTEMPTS", 3)?,
            generation_backoff: parse_backoff(env.optional("GENERATION_BACKOFF_MS"))?,
            request_timeout: Duration::from_secs(
                env.positive("REQUEST_TIMEOUT_SECS", 90)? as u64,
            ),
            archive: parse_archive(&env)?,
        })
    }

    /// Worst-case wall time of the fit loop: every iteration retries to the limit and
    /// every provider call runs to `call_timeout`.
    pub fn worst_case_generation_time(&self, call_timeout: Duration) -> Duration {
        RetryPolicy::new(self.generation_max_attempts, self.generation_backoff.clone())
            .worst_case(call_timeout)
            * self.fit_max_iterations
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Unset and blank values are treated the same.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing { key })
    }

    fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                reason: format!("'{raw}': {e}"),
            }),
        }
    }

    fn positive(&self, key: &'static str, default: u32) -> Result<u32, ConfigError> {
        let value = self.parse_or(key, default)?;
        if value == 0 {
            return Err(ConfigError::Invalid {
                key,
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(value)
    }
}

fn parse_backoff(raw: Option<String>) -> Result<Vec<Duration>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(vec![Duration::from_millis(2000), Duration::from_millis(4000)]);
    };

    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ConfigError::Invalid {
                    key: "GENERATION_BACKOFF_MS",
                    reason: format!("'{}': {e}", part.trim()),
                })
        })
        .collect()
}

fn parse_archive<F>(env: &Env<F>) -> Result<Option<ArchiveConfig>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(bucket) = env.optional("S3_BUCKET") else {
        return Ok(None);
    };

    Ok(Some(ArchiveConfig {
        bucket,
        endpoint: env.optional("S3_ENDPOINT"),
        region: env
            .optional("AWS_REGION")
            .unwrap_or_else(|| "us-east-1".to_string()),
        access_key_id: env.require("AWS_ACCESS_KEY_ID")?,
        secret_access_key: env.require("AWS_SECRET_ACCESS_KEY")?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const BASE: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/tailor"),
        ("ANTHROPIC_API_KEY", "sk-test"),
    ];

    #[test]
    fn test_defaults_applied() {
        let config = load(&BASE).unwrap();
        assert_eq!(config.quota_store, QuotaStoreKind::Postgres);
        assert_eq!(config.port, 8080);
        assert_eq!(config.daily_limit, 1);
        assert_eq!(config.fit_max_iterations, 3);
        assert_eq!(config.generation_max_attempts, 3);
        assert_eq!(
            config.generation_backoff,
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
        assert!(config.archive.is_none());
    }

    #[test]
    fn test_missing_api_key_is_typed_error() {
        let err = load(&[("DATABASE_URL", "postgres://x")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                key: "ANTHROPIC_API_KEY"
            }
        );
    }

    #[test]
    fn test_database_url_optional_for_memory_store() {
        let config = load(&[("QUOTA_STORE", "memory"), ("ANTHROPIC_API_KEY", "k")]).unwrap();
        assert_eq!(config.quota_store, QuotaStoreKind::Memory);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_unknown_store_rejected() {
        let err = load(&[("QUOTA_STORE", "firestore"), ("ANTHROPIC_API_KEY", "k")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "QUOTA_STORE", .. }));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut pairs = BASE.to_vec();
        pairs.push(("DAILY_LIMIT", "0"));
        let err = load(&pairs).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DAILY_LIMIT", .. }));
    }

    #[test]
    fn test_bad_port_rejected() {
        let mut pairs = BASE.to_vec();
        pairs.push(("PORT", "eighty"));
        assert!(matches!(
            load(&pairs).unwrap_err(),
            ConfigError::Invalid { key: "PORT", .. }
        ));
    }

    #[test]
    fn test_custom_backoff_parsed() {
        let mut pairs = BASE.to_vec();
        pairs.push(("GENERATION_BACKOFF_MS", "500, 1000,1500"));
        let config = load(&pairs).unwrap();
        assert_eq!(
            config.generation_backoff,
            vec![
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(1500)
            ]
        );
    }

    #[test]
    fn test_malformed_backoff_rejected() {
        let mut pairs = BASE.to_vec();
        pairs.push(("GENERATION_BACKOFF_MS", "2000,soon"));
        assert!(matches!(
            load(&pairs).unwrap_err(),
            ConfigError::Invalid {
                key: "GENERATION_BACKOFF_MS",
                ..
            }
        ));
    }

    #[test]
    fn test_archive_requires_credentials_once_bucket_set() {
        let mut pairs = BASE.to_vec();
        pairs.push(("S3_BUCKET", "tailored"));
        assert_eq!(
            load(&pairs).unwrap_err(),
            ConfigError::Missing {
                key: "AWS_ACCESS_KEY_ID"
            }
        );

        pairs.push(("AWS_ACCESS_KEY_ID", "minio"));
        pairs.push(("AWS_SECRET_ACCESS_KEY", "minio123"));
        let archive = load(&pairs).unwrap().archive.unwrap();
        assert_eq!(archive.bucket, "tailored");
        assert_eq!(archive.region, "us-east-1");
        assert!(archive.endpoint.is_none());
    }

    #[test]
    fn test_worst_case_generation_time() {
        let config = load(&BASE).unwrap();
        // 3 iterations x (3 calls x 60s + 2s + 4s backoff)
        assert_eq!(
            config.worst_case_generation_time(Duration::from_secs(60)),
            Duration::from_secs(558)
        );
        assert!(config.worst_case_generation_time(Duration::from_secs(60)) > config.request_timeout);

        let mut pairs = BASE.to_vec();
        pairs.push(("FIT_MAX_ITERATIONS", "1"));
        pairs.push(("GENERATION_MAX_ATTEMPTS", "1"));
        let config = load(&pairs).unwrap();
        assert_eq!(
            config.worst_case_generation_time(Duration::from_secs(60)),
            Duration::from_secs(60)
        );
    }
}
