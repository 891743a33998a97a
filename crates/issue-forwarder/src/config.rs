//! Configuration for the issue forwarder service.

use std::env;

use crate::error::ConfigError;

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default cap on inbound request bodies (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

const ENV_PORT: &str = "FORWARDER_PORT";
const ENV_API_KEY: &str = "API_KEY";
const ENV_JIRA_BASE_URL: &str = "JIRA_BASE_URL";
const ENV_JIRA_EMAIL: &str = "JIRA_EMAIL";
const ENV_JIRA_API_TOKEN: &str = "JIRA_API_TOKEN";
const ENV_MAX_BODY_BYTES: &str = "FORWARDER_MAX_BODY_BYTES";

/// Issue forwarder configuration.
///
/// Loaded once at process start and treated as immutable afterwards.
/// Deliberately not `Debug`: it carries the shared secret and the Jira token.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// Shared secret expected in the `x-api-key` header.
    pub api_key: String,
    /// Jira site URL (e.g., `https://your-domain.atlassian.net`), without trailing slash.
    pub jira_base_url: String,
    /// Account email used for Jira basic auth.
    pub jira_email: String,
    /// Jira API token used for basic auth.
    pub jira_api_token: String,
    /// Maximum accepted inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Config {
    /// Create a configuration from explicit values, using defaults for the rest.
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        jira_base_url: impl Into<String>,
        jira_email: impl Into<String>,
        jira_api_token: impl Into<String>,
    ) -> Self {
        Self {
            port: DEFAULT_PORT,
            api_key: api_key.into(),
            jira_base_url: normalize_base_url(&jira_base_url.into()),
            jira_email: jira_email.into(),
            jira_api_token: jira_api_token.into(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `API_KEY`: shared secret (required)
    /// - `JIRA_BASE_URL`: Jira site URL (required)
    /// - `JIRA_EMAIL`: Jira account email (required)
    /// - `JIRA_API_TOKEN`: Jira API token (required)
    /// - `FORWARDER_PORT`: listen port (default 8080)
    /// - `FORWARDER_MAX_BODY_BYTES`: inbound body cap (default 1 MiB)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(
            required(ENV_API_KEY)?,
            required(ENV_JIRA_BASE_URL)?,
            required(ENV_JIRA_EMAIL)?,
            required(ENV_JIRA_API_TOKEN)?,
        );

        if let Some(port) = parsed(ENV_PORT)? {
            config.port = port;
        }
        if let Some(max_body_bytes) = parsed(ENV_MAX_BODY_BYTES)? {
            config.max_body_bytes = max_body_bytes;
        }

        Ok(config)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name).ok().filter(|s| !s.trim().is_empty()) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
