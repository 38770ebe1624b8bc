//! HTTP plumbing shared by the provider backends.
//!
//! All backends classify failures the same way:
//!
//! | Failure | Error |
//! |---------|-------|
//! | connect error / timeout | [`RagError::UpstreamUnavailable`] |
//! | HTTP 429 | [`RagError::RateLimited`] |
//! | HTTP 401/403 from a hosted API | [`RagError::Auth`] |
//! | any other non-2xx | [`RagError::UpstreamUnavailable`] |
//! | undecodable body / missing field | [`RagError::MalformedUpstreamResponse`] |
//!
//! There are no retries.

use std::time::Duration;

use positron_core::{RagError, Result};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

/// Whether a backend is a local server or a hosted API with credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Hosted,
}

pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RagError::Configuration(format!("failed to build HTTP client: {}", e)))
}

/// Map a non-success status to the error taxonomy.
pub fn classify_status(backend: &str, kind: BackendKind, status: StatusCode, body: &str) -> RagError {
    let detail = format!("{} returned {}: {}", backend, status, body.trim());
    match status {
        StatusCode::TOO_MANY_REQUESTS => RagError::RateLimited(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN if kind == BackendKind::Hosted => {
            RagError::Auth(detail)
        }
        _ => RagError::UpstreamUnavailable(detail),
    }
}

/// Map a transport-level `reqwest` error.
pub fn classify_transport(backend: &str, url: &str, err: reqwest::Error) -> RagError {
    if err.is_decode() {
        RagError::MalformedUpstreamResponse(format!("{}: {}", backend, err))
    } else if err.is_timeout() {
        RagError::UpstreamUnavailable(format!("{} timed out at {}: {}", backend, url, err))
    } else if err.is_connect() {
        RagError::UpstreamUnavailable(format!(
            "{} connection error (is it running at {}?): {}",
            backend, url, err
        ))
    } else {
        RagError::UpstreamUnavailable(format!("{} request to {} failed: {}", backend, url, err))
    }
}

/// POST a JSON body and return the decoded JSON response.
pub async fn post_json(
    client: &reqwest::Client,
    backend: &str,
    kind: BackendKind,
    url: &str,
    bearer: Option<&str>,
    body: &Value,
) -> Result<Value> {
    let mut request = client.post(url).json(body);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| classify_transport(backend, url, e))?;

    let status = response.status();
    debug!(backend, url, status = status.as_u16(), "provider response");

    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        return Err(classify_status(backend, kind, status, &body_text));
    }

    let text = response
        .text()
        .await
        .map_err(|e| classify_transport(backend, url, e))?;
    serde_json::from_str(&text).map_err(|e| {
        RagError::MalformedUpstreamResponse(format!("{} returned invalid JSON: {}", backend, e))
    })
}

/// Read a JSON array of numbers as a vector.
pub fn parse_vector(backend: &str, value: Option<&Value>) -> Result<Vec<f32>> {
    let items = value.and_then(|v| v.as_array()).ok_or_else(|| {
        RagError::MalformedUpstreamResponse(format!("{}: missing embedding array", backend))
    })?;

    items
        .iter()
        .map(|v| {
            v.as_f64().map(|f| f as f32).ok_or_else(|| {
                RagError::MalformedUpstreamResponse(format!(
                    "{}: embedding contains a non-numeric value",
                    backend
                ))
            })
        })
        .collect()
}

/// Read a required string field.
pub fn parse_text(backend: &str, value: Option<&Value>, field: &str) -> Result<String> {
    value
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| RagError::MalformedUpstreamResponse(format!("{}: missing {}", backend, field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rate_limit_is_rate_limited_for_any_backend() {
        for kind in [BackendKind::Local, BackendKind::Hosted] {
            let err = classify_status("x", kind, StatusCode::TOO_MANY_REQUESTS, "quota");
            assert!(matches!(err, RagError::RateLimited(_)));
        }
    }

    #[test]
    fn test_auth_only_for_hosted() {
        let hosted = classify_status("openai", BackendKind::Hosted, StatusCode::UNAUTHORIZED, "");
        assert!(matches!(hosted, RagError::Auth(_)));
        let forbidden = classify_status("openai", BackendKind::Hosted, StatusCode::FORBIDDEN, "");
        assert!(matches!(forbidden, RagError::Auth(_)));
        let local = classify_status("ollama", BackendKind::Local, StatusCode::UNAUTHORIZED, "");
        assert!(matches!(local, RagError::UpstreamUnavailable(_)));
    }

    #[test]
    fn test_other_status_is_unavailable_with_body() {
        let err = classify_status(
            "ollama",
            BackendKind::Local,
            StatusCode::NOT_FOUND,
            "model 'nope' not found\n",
        );
        match err {
            RagError::UpstreamUnavailable(msg) => {
                assert!(msg.contains("404"));
                assert!(msg.contains("model 'nope' not found"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_vector() {
        let v = json!({"embedding": [0.5, -1, 2.25]});
        assert_eq!(parse_vector("t", v.get("embedding")).unwrap(), vec![0.5, -1.0, 2.25]);

        let err = parse_vector("t", v.get("missing")).unwrap_err();
        assert!(matches!(err, RagError::MalformedUpstreamResponse(_)));

        let bad = json!({"embedding": [0.5, "x"]});
        let err = parse_vector("t", bad.get("embedding")).unwrap_err();
        assert!(matches!(err, RagError::MalformedUpstreamResponse(_)));
    }

    #[test]
    fn test_parse_text() {
        let v = json!({"response": "hi", "n": 1});
        assert_eq!(parse_text("t", v.get("response"), "response").unwrap(), "hi");
        assert!(parse_text("t", v.get("n"), "n").is_err());
    }
}
