//! Security configuration.
//!
//! Every security parameter (signing secret, token lifetime, hash cost) must be
//! supplied by the environment; there are no built-in fallbacks.

use std::time::Duration;

use thiserror::Error;

pub const JWT_SECRET: &str = "JWT_SECRET";
pub const TOKEN_TTL_SECS: &str = "TOKEN_TTL_SECS";
pub const PASSWORD_HASH_MEMORY_KIB: &str = "PASSWORD_HASH_MEMORY_KIB";
pub const PASSWORD_HASH_ITERATIONS: &str = "PASSWORD_HASH_ITERATIONS";
pub const PASSWORD_HASH_PARALLELISM: &str = "PASSWORD_HASH_PARALLELISM";
pub const STORE_TIMEOUT_MS: &str = "STORE_TIMEOUT_MS";

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(2000);
const RECOMMENDED_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (ten years).
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Argon2 cost parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_lifetime: Duration,
    pub hash_cost: HashCost,
    /// Budget for each store lookup made while authenticating or guarding.
    pub store_timeout: Duration,
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_lifetime", &self.token_lifetime)
            .field("hash_cost", &self.hash_cost)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

impl AuthConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (tests, alternative config sources).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup(JWT_SECRET).ok_or(ConfigError::Missing(JWT_SECRET))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: JWT_SECRET,
                message: "must not be empty".to_string(),
            });
        }
        if jwt_secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                "{JWT_SECRET} is shorter than {RECOMMENDED_SECRET_LEN} bytes; use a longer secret"
            );
        }

        let ttl_secs: u64 = required_number(&lookup, TOKEN_TTL_SECS)?;
        if ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                key: TOKEN_TTL_SECS,
                message: "must be greater than zero".to_string(),
            });
        }
        if ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::Invalid {
                key: TOKEN_TTL_SECS,
                message: format!("must be at most {MAX_TOKEN_TTL_SECS}"),
            });
        }

        let hash_cost = HashCost {
            memory_kib: required_number(&lookup, PASSWORD_HASH_MEMORY_KIB)?,
            iterations: required_number(&lookup, PASSWORD_HASH_ITERATIONS)?,
            parallelism: required_number(&lookup, PASSWORD_HASH_PARALLELISM)?,
        };

        let store_timeout = match lookup(STORE_TIMEOUT_MS) {
            Some(raw) => Duration::from_millis(parse_number(STORE_TIMEOUT_MS, &raw)?),
            None => DEFAULT_STORE_TIMEOUT,
        };

        Ok(Self {
            jwt_secret,
            token_lifetime: Duration::from_secs(ttl_secs),
            hash_cost,
            store_timeout,
        })
    }
}

fn required_number<F, T>(lookup: &F, key: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    let raw = lookup(key).ok_or(ConfigError::Missing(key))?;
    parse_number(key, &raw)
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: e.to_string(),
    })
}
