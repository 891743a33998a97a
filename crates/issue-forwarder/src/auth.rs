//! Shared-secret authentication for inbound trigger requests.

use subtle::ConstantTimeEq;

use crate::models::{HeaderValue, IncomingRequest};

/// Header carrying the caller's shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Normalize a possibly repeated header to its first value.
///
/// An empty sequence yields `None`.
#[must_use]
pub fn first_or_none(value: &HeaderValue) -> Option<&str> {
    match value {
        HeaderValue::Single(v) => Some(v.as_str()),
        HeaderValue::Multiple(values) => values.first().map(String::as_str),
    }
}

/// Extract the caller-supplied API key from a request.
#[must_use]
pub fn extract_api_key(request: &IncomingRequest) -> Option<&str> {
    request.header(API_KEY_HEADER).and_then(first_or_none)
}

/// Check a supplied credential against the configured secret.
///
/// Exact, case-sensitive comparison with no trimming. A missing credential
/// never matches, and neither does anything against an empty secret.
#[must_use]
pub fn validate_api_key(supplied: Option<&str>, expected: &str) -> bool {
    let Some(supplied) = supplied else {
        return false;
    };
    if expected.is_empty() {
        return false;
    }

    // Constant-time comparison to prevent timing attacks
    supplied.as_bytes().ct_eq(expected.as_bytes()).into()
}
