//! Type definitions for the web trigger contract and the Jira issue payload.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Content type of every response body.
pub const APPLICATION_JSON: &str = "application/json";

// =========================================================================
// Trigger Contract
// =========================================================================

/// A header value as delivered by the host: one string or a sequence of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    /// Single value
    Single(String),
    /// Repeated header, in the order received
    Multiple(Vec<String>),
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }
}

/// Inbound request handed to the trigger by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingRequest {
    /// Header name to value(s); names may arrive in any case.
    #[serde(default)]
    pub headers: BTreeMap<String, HeaderValue>,
    /// Raw body text, expected to be JSON.
    #[serde(default)]
    pub body: String,
}

impl IncomingRequest {
    /// Create a request with the given body and no headers.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Add a header (builder style).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Look up a header by name, ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .get(name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
    }
}

/// Response returned to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Status text shown alongside the code.
    pub status_text: String,
    /// Response headers (array-valued, as the host expects).
    pub headers: BTreeMap<String, Vec<String>>,
    /// JSON-serialized body.
    pub body: String,
}

impl OutgoingResponse {
    fn json(status_code: u16, status_text: &str, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(
            "Content-Type".to_string(),
            vec![APPLICATION_JSON.to_string()],
        );
        Self {
            status_code,
            status_text: status_text.to_string(),
            headers,
            body,
        }
    }

    /// 401 response for a failed credential check.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::json(401, "Unauthorized", json!({ "error": "Unauthorized" }).to_string())
    }

    /// 200 response carrying the tracker's result verbatim.
    #[must_use]
    pub fn created(result: &Value) -> Self {
        Self::json(200, "Accepted, Issue created", result.to_string())
    }

    /// 500 response carrying the failure message.
    #[must_use]
    pub fn internal_error(message: &str) -> Self {
        Self::json(
            500,
            "Internal Server Error",
            json!({ "error": message }).to_string(),
        )
    }
}

// =========================================================================
// Issue Payload
// =========================================================================

/// Simplified issue request parsed from the inbound body.
///
/// Fields are not validated; absent ones are passed through and rejected
/// by the tracker. An explicit `null` reads the same as an absent field and
/// is left out of the outbound document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    /// Key of the target project (e.g., "PROJ").
    #[serde(default)]
    pub project_key: Option<String>,
    /// Issue title.
    #[serde(default)]
    pub summary: Option<String>,
    /// Plain-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Name of an issue type known to the project (e.g., "Task").
    #[serde(default)]
    pub issue_type: Option<String>,
}

/// Create-issue payload in the tracker's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDocument {
    /// Issue fields.
    pub fields: IssueFields,
}

/// Fields of a create-issue payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFields {
    /// Project reference.
    pub project: ProjectRef,
    /// Issue title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Rich-text description.
    pub description: RichTextDoc,
    /// Issue type reference.
    pub issuetype: IssueTypeRef,
}

/// Project reference by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// Issue type reference by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTypeRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Rich-text document node (`type: "doc"`, `version: 1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextDoc {
    #[serde(rename = "type")]
    pub node_type: String,
    pub version: u32,
    pub content: Vec<ParagraphNode>,
}

/// Paragraph node holding inline text nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphNode {
    #[serde(rename = "type")]
    pub node_type: String,
    pub content: Vec<TextNode>,
}

/// Inline text node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub node_type: String,
}

impl RichTextDoc {
    /// Single-paragraph document wrapping one text node.
    #[must_use]
    pub fn paragraph(text: Option<String>) -> Self {
        Self {
            node_type: "doc".to_string(),
            version: 1,
            content: vec![ParagraphNode {
                node_type: "paragraph".to_string(),
                content: vec![TextNode {
                    text,
                    node_type: "text".to_string(),
                }],
            }],
        }
    }
}

impl IssueDocument {
    /// Build the create-issue payload from plain strings.
    #[must_use]
    pub fn new(
        project_key: impl Into<String>,
        summary: impl Into<String>,
        description: impl Into<String>,
        issue_type: impl Into<String>,
    ) -> Self {
        Self::from(IssueRequest {
            project_key: Some(project_key.into()),
            summary: Some(summary.into()),
            description: Some(description.into()),
            issue_type: Some(issue_type.into()),
        })
    }
}

impl From<IssueRequest> for IssueDocument {
    fn from(request: IssueRequest) -> Self {
        Self {
            fields: IssueFields {
                project: ProjectRef {
                    key: request.project_key,
                },
                summary: request.summary,
                description: RichTextDoc::paragraph(request.description),
                issuetype: IssueTypeRef {
                    name: request.issue_type,
                },
            },
        }
    }
}
