//! Error types for the issue forwarder.

use thiserror::Error;

/// Errors raised while loading configuration at process start.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable holds a value that cannot be parsed
    #[error("Invalid value for {name}: {value}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Offending value
        value: String,
    },
}

/// The request body could not be read as an issue request.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Malformed JSON, or JSON that does not fit the request shape
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// Body bytes are not valid UTF-8
    #[error("Request body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Errors returned by the issue tracker client.
#[derive(Debug, Error)]
pub enum JiraError {
    /// Transport failure (connect, TLS, timeout imposed by the host)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Jira API returned error status {status}: {body}")]
    Status {
        /// HTTP status returned by the API
        status: reqwest::StatusCode,
        /// Response text, possibly empty
        body: String,
    },

    /// The API answered 2xx but the body is not JSON
    #[error("Failed to parse Jira API response: {0}")]
    InvalidResponse(#[source] reqwest::Error),

    /// Credentials could not be encoded into a request header
    #[error("Invalid Jira credentials: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// Failure of an authorized invocation, mapped to a 500 response.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Request body parsing failed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Outbound create-issue call failed
    #[error(transparent)]
    Upstream(#[from] JiraError),
}

impl ForwardError {
    /// Text placed in the `error` field of the response body.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}
