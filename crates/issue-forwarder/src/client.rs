//! REST client for Jira issue creation.

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::JiraError;
use crate::models::{IssueDocument, APPLICATION_JSON};

/// Issue creation endpoint, relative to the site URL.
pub const CREATE_ISSUE_PATH: &str = "/rest/api/3/issue";

/// Creates issues in an external tracker.
///
/// Not idempotent: every successful call creates a new issue.
#[async_trait]
pub trait IssueCreator: Send + Sync {
    /// Submit a create-issue payload and return the tracker's JSON response.
    async fn create_issue(&self, document: &IssueDocument) -> Result<Value, JiraError>;
}

/// Jira Cloud REST client authenticated with an account email and API token.
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: reqwest::Client,
    base_url: String,
}

impl JiraClient {
    /// Create a new Jira client.
    ///
    /// # Arguments
    /// * `base_url` - Site URL, e.g. `https://your-domain.atlassian.net`
    /// * `email` - Account email
    /// * `api_token` - API token for that account
    pub fn new(base_url: &str, email: &str, api_token: &str) -> Result<Self, JiraError> {
        let credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{email}:{api_token}"));
        let mut auth_value = HeaderValue::from_str(&format!("Basic {credentials}"))?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("issue-forwarder/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from service configuration.
    pub fn from_config(config: &Config) -> Result<Self, JiraError> {
        Self::new(
            &config.jira_base_url,
            &config.jira_email,
            &config.jira_api_token,
        )
    }

    /// Point an existing client at a different site URL, keeping its credentials.
    #[must_use]
    pub fn with_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Full URL of the create-issue endpoint.
    #[must_use]
    pub fn create_issue_url(&self) -> String {
        format!("{}{CREATE_ISSUE_PATH}", self.base_url)
    }
}

#[async_trait]
impl IssueCreator for JiraClient {
    #[instrument(skip_all)]
    async fn create_issue(&self, document: &IssueDocument) -> Result<Value, JiraError> {
        let response = self
            .client
            .post(self.create_issue_url())
            .json(document)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JiraError::Status { status, body });
        }

        let created: Value = response
            .json()
            .await
            .map_err(JiraError::InvalidResponse)?;

        let issue_key = created
            .get("key")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown");
        debug!(issue_key, "Created Jira issue");
        Ok(created)
    }
}
