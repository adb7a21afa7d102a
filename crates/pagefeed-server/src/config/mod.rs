//! Configuration loading and resolution.
//!
//! Every setting resolves as: explicit CLI value, then environment
//! variable, then built-in default.

use std::time::Duration;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_MAX_REDIRECTS: usize = 5;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/131.0.0.0 Safari/537.36";

pub const ENV_ADDR: &str = "PAGEFEED_ADDR";
pub const ENV_FETCH_TIMEOUT_MS: &str = "PAGEFEED_FETCH_TIMEOUT_MS";
pub const ENV_USER_AGENT: &str = "PAGEFEED_USER_AGENT";
pub const ENV_MAX_REDIRECTS: &str = "PAGEFEED_MAX_REDIRECTS";

/// Values supplied on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub addr: Option<String>,
    pub fetch_timeout_ms: Option<u64>,
    pub user_agent: Option<String>,
}

/// Fully resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: String,
    pub fetch_timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl ServerConfig {
    /// Resolve against the process environment.
    pub fn resolve(overrides: &ConfigOverrides) -> Self {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary environment lookup.
    pub fn resolve_with<F>(overrides: &ConfigOverrides, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let addr = overrides
            .addr
            .clone()
            .or_else(|| env(ENV_ADDR))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        let fetch_timeout_ms = overrides.fetch_timeout_ms.unwrap_or_else(|| {
            parse_or_default(env(ENV_FETCH_TIMEOUT_MS), ENV_FETCH_TIMEOUT_MS, DEFAULT_FETCH_TIMEOUT_MS)
        });

        let user_agent = overrides
            .user_agent
            .clone()
            .or_else(|| env(ENV_USER_AGENT))
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let max_redirects =
            parse_or_default(env(ENV_MAX_REDIRECTS), ENV_MAX_REDIRECTS, DEFAULT_MAX_REDIRECTS);

        Self {
            addr,
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            user_agent,
            max_redirects,
        }
    }
}

fn parse_or_default<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match raw {
        None => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {key}={value:?}, using {default}");
            default
        }),
    }
}
