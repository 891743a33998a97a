//! Web trigger handler: authenticate, parse, forward, and map the outcome.
//!
//! The handler evaluates three outcomes in strict order:
//! 1. Credential check fails -> 401, no outbound call
//! 2. Body parses and the issue is created -> 200 with the tracker's result
//! 3. Parsing or the outbound call fails -> 500 with the failure message

use serde_json::Value;
use std::collections::BTreeMap;
use std::str::Utf8Error;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::auth::{extract_api_key, validate_api_key};
use crate::client::{IssueCreator, JiraClient};
use crate::config::Config;
use crate::error::{ForwardError, JiraError, ParseError};
use crate::models::{HeaderValue, IncomingRequest, IssueDocument, IssueRequest, OutgoingResponse};

/// Parse the inbound body into an issue request.
///
/// Only the JSON shape is checked; missing fields pass through.
pub fn parse_request(body: &str) -> Result<IssueRequest, ParseError> {
    Ok(serde_json::from_str(body)?)
}

/// Forwards authorized trigger requests into issue creation.
#[derive(Clone)]
pub struct IssueForwarder {
    api_key: String,
    creator: Arc<dyn IssueCreator>,
}

impl IssueForwarder {
    /// Create a forwarder with an explicit secret and issue creator.
    #[must_use]
    pub fn new(api_key: impl Into<String>, creator: Arc<dyn IssueCreator>) -> Self {
        Self {
            api_key: api_key.into(),
            creator,
        }
    }

    /// Create a forwarder backed by a [`JiraClient`] built from configuration.
    pub fn from_config(config: &Config) -> Result<Self, JiraError> {
        let client = JiraClient::from_config(config)?;
        Ok(Self::new(config.api_key.clone(), Arc::new(client)))
    }

    /// Check the request's `x-api-key` header against the configured secret.
    #[must_use]
    pub fn authorize(&self, request: &IncomingRequest) -> bool {
        validate_api_key(extract_api_key(request), &self.api_key)
    }

    /// Transform a parsed request and submit it to the tracker.
    pub async fn forward(&self, request: IssueRequest) -> Result<Value, JiraError> {
        let document = IssueDocument::from(request);
        self.creator.create_issue(&document).await
    }

    async fn parse_and_forward(
        &self,
        body: Result<&str, Utf8Error>,
    ) -> Result<Value, ForwardError> {
        let body = body.map_err(ParseError::from)?;
        let request = parse_request(body)?;
        Ok(self.forward(request).await?)
    }

    /// Handle one trigger invocation. Never fails; every outcome is a response.
    pub async fn handle(&self, request: &IncomingRequest) -> OutgoingResponse {
        self.respond(request, Ok(request.body.as_str())).await
    }

    /// Handle an invocation whose body arrived as raw bytes.
    ///
    /// A body that is not valid UTF-8 is a parse failure (500) once the
    /// credential check has passed; it is never repaired.
    pub async fn handle_raw(
        &self,
        headers: BTreeMap<String, HeaderValue>,
        body: &[u8],
    ) -> OutgoingResponse {
        let request = IncomingRequest {
            headers,
            body: String::new(),
        };
        self.respond(&request, std::str::from_utf8(body)).await
    }

    async fn respond(
        &self,
        request: &IncomingRequest,
        body: Result<&str, Utf8Error>,
    ) -> OutgoingResponse {
        let invocation_id = Uuid::new_v4();
        let span = info_span!("invocation", invocation_id = %invocation_id);

        async {
            if !self.authorize(request) {
                warn!(status_code = 401, "Rejected request with invalid or missing API key");
                return OutgoingResponse::unauthorized();
            }

            match self.parse_and_forward(body).await {
                Ok(result) => {
                    let issue_key = result
                        .get("key")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or("unknown");
                    info!(status_code = 200, issue_key, "Issue created");
                    OutgoingResponse::created(&result)
                }
                Err(e) => {
                    let stage = match &e {
                        ForwardError::Parse(_) => "parse",
                        ForwardError::Upstream(_) => "upstream",
                    };
                    error!(status_code = 500, stage, error = %e, "Failed to create issue");
                    OutgoingResponse::internal_error(&e.message())
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    const SECRET: &str = "test-secret";

    /// Issue creator that records every document and replies with a fixed outcome.
    struct RecordingCreator {
        calls: Mutex<Vec<IssueDocument>>,
        outcome: fn() -> Result<Value, JiraError>,
    }

    impl RecordingCreator {
        fn new(outcome: fn() -> Result<Value, JiraError>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                outcome,
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl IssueCreator for RecordingCreator {
        async fn create_issue(&self, document: &IssueDocument) -> Result<Value, JiraError> {
            self.calls.lock().unwrap().push(document.clone());
            (self.outcome)()
        }
    }

    fn created() -> Result<Value, JiraError> {
        Ok(json!({ "id": "10001", "key": "PROJ-1", "self": "https://jira/rest/api/3/issue/10001" }))
    }

    fn rejected() -> Result<Value, JiraError> {
        Err(JiraError::Status {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: "boom".to_string(),
        })
    }

    fn valid_body() -> String {
        json!({
            "projectKey": "PROJ",
            "summary": "Summary",
            "description": "Description",
            "issueType": "Task"
        })
        .to_string()
    }

    fn forwarder(creator: &Arc<RecordingCreator>) -> IssueForwarder {
        IssueForwarder::new(SECRET, creator.clone())
    }

    #[tokio::test]
    async fn test_wrong_key_is_unauthorized_regardless_of_body() {
        let creator = RecordingCreator::new(created);
        let forwarder = forwarder(&creator);

        for body in [valid_body(), "{not json".to_string(), String::new()] {
            for key in ["wrong", "TEST-SECRET", "test-secret ", ""] {
                let request = IncomingRequest::new(body.clone()).with_header("x-api-key", key);
                let response = forwarder.handle(&request).await;
                assert_eq!(response.status_code, 401);
                assert_eq!(response.status_text, "Unauthorized");
                assert_eq!(response.body, r#"{"error":"Unauthorized"}"#);
            }
        }

        assert_eq!(creator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let creator = RecordingCreator::new(created);
        let response = forwarder(&creator)
            .handle(&IncomingRequest::new(valid_body()))
            .await;

        assert_eq!(response.status_code, 401);
        assert_eq!(creator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_valid_key_creates_issue() {
        let creator = RecordingCreator::new(created);
        let request = IncomingRequest::new(valid_body()).with_header("x-api-key", SECRET);

        let response = forwarder(&creator).handle(&request).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.status_text, "Accepted, Issue created");
        assert_eq!(
            serde_json::from_str::<Value>(&response.body).unwrap(),
            created().unwrap()
        );

        let calls = creator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], IssueDocument::new("PROJ", "Summary", "Description", "Task"));
    }

    #[tokio::test]
    async fn test_multi_value_header_uses_first_entry() {
        let creator = RecordingCreator::new(created);
        let forwarder = forwarder(&creator);

        let first_valid = IncomingRequest::new(valid_body())
            .with_header("x-api-key", vec![SECRET.to_string(), "other".to_string()]);
        assert_eq!(forwarder.handle(&first_valid).await.status_code, 200);

        let second_valid = IncomingRequest::new(valid_body())
            .with_header("x-api-key", vec!["other".to_string(), SECRET.to_string()]);
        assert_eq!(forwarder.handle(&second_valid).await.status_code, 401);
    }

    #[tokio::test]
    async fn test_upstream_failure_maps_to_500() {
        let creator = RecordingCreator::new(rejected);
        let request = IncomingRequest::new(valid_body()).with_header("x-api-key", SECRET);

        let response = forwarder(&creator).handle(&request).await;

        assert_eq!(response.status_code, 500);
        assert_eq!(response.status_text, "Internal Server Error");
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(
            body,
            json!({ "error": "Jira API returned error status 400 Bad Request: boom" })
        );
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_500_without_call() {
        let creator = RecordingCreator::new(created);
        let request = IncomingRequest::new("{not json").with_header("x-api-key", SECRET);

        let response = forwarder(&creator).handle(&request).await;

        assert_eq!(response.status_code, 500);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("key must be a string"));
        assert_eq!(creator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_pass_through() {
        let creator = RecordingCreator::new(created);
        let request = IncomingRequest::new(r#"{"summary":"only"}"#).with_header("x-api-key", SECRET);

        let response = forwarder(&creator).handle(&request).await;

        assert_eq!(response.status_code, 200);
        let calls = creator.calls.lock().unwrap();
        assert_eq!(calls[0].fields.project.key, None);
        assert_eq!(calls[0].fields.summary.as_deref(), Some("only"));
    }

    #[tokio::test]
    async fn test_repeated_requests_are_not_deduplicated() {
        let creator = RecordingCreator::new(created);
        let forwarder = forwarder(&creator);
        let request = IncomingRequest::new(valid_body()).with_header("x-api-key", SECRET);

        forwarder.handle(&request).await;
        forwarder.handle(&request).await;

        assert_eq!(creator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_raw_body_invalid_utf8_is_internal_error() {
        let creator = RecordingCreator::new(created);
        let forwarder = forwarder(&creator);
        let body = b"{\"projectKey\":\"PROJ\",\"summary\":\"s\",\"description\":\"bad \xFF\",\"issueType\":\"Task\"}";
        let headers = IncomingRequest::new("")
            .with_header("x-api-key", SECRET)
            .headers;

        let response = forwarder.handle_raw(headers, body).await;

        assert_eq!(response.status_code, 500);
        let parsed: Value = serde_json::from_str(&response.body).unwrap();
        assert!(parsed["error"]
            .as_str()
            .unwrap()
            .starts_with("Request body is not valid UTF-8"));
        assert_eq!(creator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_raw_body_checks_key_before_decoding() {
        let creator = RecordingCreator::new(created);
        let headers = IncomingRequest::new("").with_header("x-api-key", "wrong").headers;

        let response = forwarder(&creator).handle_raw(headers, b"\xFF\xFE").await;

        assert_eq!(response.status_code, 401);
        assert_eq!(creator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_raw_body_valid_utf8_creates_issue() {
        let creator = RecordingCreator::new(created);
        let headers = IncomingRequest::new("").with_header("x-api-key", SECRET).headers;

        let response = forwarder(&creator)
            .handle_raw(headers, valid_body().as_bytes())
            .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(creator.call_count(), 1);
    }

    #[test]
    fn test_parse_request_rejects_non_object() {
        assert!(parse_request("null").is_err());
        assert!(parse_request("[1,2]").is_err());
        assert!(parse_request(r#"{"summary": 5}"#).is_err());
        assert_eq!(parse_request("{}").unwrap(), IssueRequest::default());
    }
}
