//! Usage Interceptor - passthrough transport that records token usage
//!
//! [`UsageInterceptor`] wraps any [`HttpTransport`] and implements the same
//! trait. Each request is forwarded exactly once; the response is handed back
//! untouched. For non-streaming requests the response body is parsed on a
//! spawned task and a [`UsageRecord`] is appended to the shared
//! [`UsageMetrics`]. Call [`UsageInterceptor::flush`] before reading the
//! metrics to make sure every pending extraction has landed.
//!
//! Extraction is best-effort: an unreadable body never fails the call and
//! missing or malformed counters read as 0.

use crate::error::Result;
use crate::metrics::{UsageMetrics, UsageRecord};
use crate::ratelimit::{RateLimitHook, RateLimitSnapshot};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

/// Transport decorator that observes token usage
pub struct UsageInterceptor<T> {
    inner: T,
    metrics: Arc<UsageMetrics>,
    rate_limit_hook: Option<Arc<dyn RateLimitHook>>,
    pending: TaskTracker,
}

impl<T: HttpTransport> UsageInterceptor<T> {
    /// Wrap `inner`, appending observed usage to `metrics`
    #[must_use]
    pub fn new(inner: T, metrics: Arc<UsageMetrics>) -> Self {
        Self {
            inner,
            metrics,
            rate_limit_hook: None,
            pending: TaskTracker::new(),
        }
    }

    /// Forward rate limit headers to `hook`
    #[must_use]
    pub fn with_rate_limit_hook(mut self, hook: Arc<dyn RateLimitHook>) -> Self {
        self.rate_limit_hook = Some(hook);
        self
    }

    /// The metrics store this interceptor appends to
    #[must_use]
    pub fn metrics(&self) -> &Arc<UsageMetrics> {
        &self.metrics
    }

    /// The wrapped transport
    #[must_use]
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Number of usage extractions still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Wait until every usage extraction spawned so far has finished.
    ///
    /// Meant for the single reader that reports totals at the end of a run;
    /// requests sent while a flush is in progress are still tracked.
    pub async fn flush(&self) {
        self.pending.close();
        self.pending.wait().await;
        self.pending.reopen();
    }

    fn observe_rate_limits(&self, response: &HttpResponse) {
        if let Some(hook) = &self.rate_limit_hook {
            let snapshot = RateLimitSnapshot::from_headers(&response.headers);
            if snapshot.has_data() {
                hook.observe(&snapshot);
            }
        }
    }
}

#[async_trait::async_trait]
impl<T: HttpTransport> HttpTransport for UsageInterceptor<T> {
    async fn send(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse> {
        let streaming = is_streaming_request(&request.body);

        let response = self.inner.send(request, cancel).await?;

        self.observe_rate_limits(&response);

        if streaming {
            debug!("Streaming request, usage extraction skipped");
            return Ok(response);
        }

        let body = response.body.clone();
        let metrics = Arc::clone(&self.metrics);
        self.pending.spawn(async move {
            match extract_usage(&body) {
                Some(record) => {
                    debug!(
                        model = %record.model,
                        input_tokens = record.input_tokens,
                        output_tokens = record.output_tokens,
                        total_tokens = record.total_tokens,
                        "Recorded usage from response body"
                    );
                    metrics.append(record).await;
                }
                None => debug!(bytes = body.len(), "Response body is not a JSON object"),
            }
        });

        Ok(response)
    }
}

/// Whether a request body asks for a streamed response.
///
/// `"stream": true` and `"stream": "true"` (any case) count; a body that is
/// not a JSON object is treated as non-streaming.
#[must_use]
pub fn is_streaming_request(body: &[u8]) -> bool {
    let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
        return false;
    };
    match map.get("stream") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Build a usage record from a chat-completion response body.
///
/// Returns `None` when the body is blank or is not a JSON object. Otherwise
/// reads `usage.prompt_tokens`, `usage.completion_tokens`,
/// `usage.total_tokens` and `model`, defaulting each to 0 / empty.
#[must_use]
pub fn extract_usage(body: &[u8]) -> Option<UsageRecord> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    let value: Value = serde_json::from_slice(body).ok()?;
    if !value.is_object() {
        return None;
    }

    let model = value
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Some(
        UsageRecord::new(
            token_count(value.pointer("/usage/prompt_tokens")),
            token_count(value.pointer("/usage/completion_tokens")),
            token_count(value.pointer("/usage/total_tokens")),
        )
        .with_model(model),
    )
}

/// Integer or integer-string counter; anything else (negative, fractional,
/// larger than `u32`) reads as 0.
fn token_count(value: Option<&Value>) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.and_then(|n| u32::try_from(n).ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_detection() {
        assert!(is_streaming_request(br#"{"stream": true}"#));
        assert!(is_streaming_request(br#"{"stream": "True"}"#));
        assert!(!is_streaming_request(br#"{"stream": false}"#));
        assert!(!is_streaming_request(br#"{"stream": "yes"}"#));
        assert!(!is_streaming_request(br#"{"stream": 1}"#));
        assert!(!is_streaming_request(br#"{"messages": []}"#));
        assert!(!is_streaming_request(b""));
        assert!(!is_streaming_request(b"not json"));
        assert!(!is_streaming_request(br#"[{"stream": true}]"#));
    }

    #[test]
    fn test_extract_full_usage() {
        let record = extract_usage(
            br#"{"usage":{"prompt_tokens":5,"completion_tokens":7,"total_tokens":12},"model":"x"}"#,
        )
        .unwrap();
        assert_eq!(record.input_tokens, 5);
        assert_eq!(record.output_tokens, 7);
        assert_eq!(record.total_tokens, 12);
        assert_eq!(record.model, "x");
    }

    #[test]
    fn test_extract_defaults_missing_fields_to_zero() {
        let record = extract_usage(br#"{"usage":{"prompt_tokens":9}}"#).unwrap();
        assert_eq!(record.input_tokens, 9);
        assert_eq!(record.output_tokens, 0);
        assert_eq!(record.total_tokens, 0);
        assert_eq!(record.model, "");

        let record = extract_usage(br#"{"error":{"code":"429"}}"#).unwrap();
        assert_eq!(
            (record.input_tokens, record.output_tokens, record.total_tokens),
            (0, 0, 0)
        );
    }

    #[test]
    fn test_extract_numeric_strings_and_junk() {
        let record = extract_usage(
            br#"{"usage":{"prompt_tokens":"15","completion_tokens":-3,"total_tokens":1.5}}"#,
        )
        .unwrap();
        assert_eq!(record.input_tokens, 15);
        assert_eq!(record.output_tokens, 0);
        assert_eq!(record.total_tokens, 0);

        let record = extract_usage(br#"{"usage":{"prompt_tokens":99999999999}}"#).unwrap();
        assert_eq!(record.input_tokens, 0);
    }

    #[test]
    fn test_extract_rejects_unparsable_bodies() {
        assert!(extract_usage(b"").is_none());
        assert!(extract_usage(b"   \n").is_none());
        assert!(extract_usage(b"<html>502</html>").is_none());
        assert!(extract_usage(b"[1,2,3]").is_none());
        assert!(extract_usage(b"42").is_none());
    }
}
