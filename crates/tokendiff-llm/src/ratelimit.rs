//! Rate Limit Observation
//!
//! Parses the OpenAI-style `x-ratelimit-*` response headers and hands the
//! result to a [`RateLimitHook`]. The hook is where a throttling or backoff
//! policy would plug in; the bundled [`RateLimitTracker`] only remembers the
//! latest snapshot.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Remaining-percentage below which the tracker logs a warning
const NEAR_LIMIT_PCT: f64 = 20.0;

/// Rate limit state reported by one response
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitSnapshot {
    /// `x-ratelimit-remaining-requests`
    pub requests_remaining: Option<u64>,
    /// `x-ratelimit-limit-requests`
    pub requests_limit: Option<u64>,
    /// `x-ratelimit-remaining-tokens`
    pub tokens_remaining: Option<u64>,
    /// `x-ratelimit-limit-tokens`
    pub tokens_limit: Option<u64>,
    /// Earliest reset time from `x-ratelimit-reset-*`
    pub reset_at: Option<DateTime<Utc>>,
    /// When the headers were read
    pub observed_at: DateTime<Utc>,
}

impl RateLimitSnapshot {
    /// Parse the `x-ratelimit-*` headers.
    ///
    /// Headers:
    /// - `x-ratelimit-limit-requests`
    /// - `x-ratelimit-remaining-requests`
    /// - `x-ratelimit-reset-requests`
    /// - `x-ratelimit-limit-tokens`
    /// - `x-ratelimit-remaining-tokens`
    /// - `x-ratelimit-reset-tokens`
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            requests_limit: header_u64(headers, "x-ratelimit-limit-requests"),
            requests_remaining: header_u64(headers, "x-ratelimit-remaining-requests"),
            tokens_limit: header_u64(headers, "x-ratelimit-limit-tokens"),
            tokens_remaining: header_u64(headers, "x-ratelimit-remaining-tokens"),
            reset_at: header_reset(headers, "x-ratelimit-reset-requests")
                .or_else(|| header_reset(headers, "x-ratelimit-reset-tokens")),
            observed_at: Utc::now(),
        }
    }

    /// Returns `true` if at least one header was present
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.requests_remaining.is_some()
            || self.requests_limit.is_some()
            || self.tokens_remaining.is_some()
            || self.tokens_limit.is_some()
            || self.reset_at.is_some()
    }

    /// Returns `true` when remaining requests or tokens are below
    /// `threshold_pct` percent of their limit.
    #[must_use]
    pub fn is_near_limit(&self, threshold_pct: f64) -> bool {
        let below = |remaining: Option<u64>, limit: Option<u64>| match (remaining, limit) {
            (Some(rem), Some(limit)) if limit > 0 => {
                (rem as f64 / limit as f64) * 100.0 < threshold_pct
            }
            _ => false,
        };
        below(self.requests_remaining, self.requests_limit)
            || below(self.tokens_remaining, self.tokens_limit)
    }
}

/// Receives every rate limit snapshot seen by the interceptor
pub trait RateLimitHook: Send + Sync {
    /// Called once per response that carried at least one rate limit header
    fn observe(&self, snapshot: &RateLimitSnapshot);
}

/// Remembers the most recent snapshot
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    latest: Mutex<Option<RateLimitSnapshot>>,
}

impl RateLimitTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot, if any response carried rate limit headers
    #[must_use]
    pub fn latest(&self) -> Option<RateLimitSnapshot> {
        self.latest.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl RateLimitHook for RateLimitTracker {
    fn observe(&self, snapshot: &RateLimitSnapshot) {
        debug!(
            requests_remaining = ?snapshot.requests_remaining,
            tokens_remaining = ?snapshot.tokens_remaining,
            "Rate limit headers observed"
        );
        if snapshot.is_near_limit(NEAR_LIMIT_PCT) {
            warn!(
                requests_remaining = ?snapshot.requests_remaining,
                tokens_remaining = ?snapshot.tokens_remaining,
                "Approaching provider rate limit"
            );
        }
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Reset headers come as RFC 3339 timestamps or Go-style durations (`"6m0s"`).
///
/// A duration too large to land on the calendar reads as no reset time.
fn header_reset(headers: &HeaderMap, name: &str) -> Option<DateTime<Utc>> {
    let val = headers.get(name).and_then(|v| v.to_str().ok())?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(val) {
        return Some(dt.with_timezone(&Utc));
    }

    let millis = parse_go_duration(val)? * 1000.0;
    if !millis.is_finite() || millis >= i64::MAX as f64 {
        return None;
    }
    let delta = chrono::Duration::try_milliseconds(millis as i64)?;
    Utc::now().checked_add_signed(delta)
}

/// Parse `"1h2m3s"`, `"6m0s"`, `"1m30.5s"`, `"200ms"` into seconds.
fn parse_go_duration(s: &str) -> Option<f64> {
    let mut total_secs = 0.0_f64;
    let mut num_buf = String::new();
    let mut chars = s.trim().chars().peekable();
    let mut parsed_any = false;

    while let Some(ch) = chars.next() {
        let (mul, div) = match ch {
            '0'..='9' | '.' => {
                num_buf.push(ch);
                continue;
            }
            'h' => (3600.0, 1.0),
            'm' if chars.peek() == Some(&'s') => {
                chars.next();
                (1.0, 1000.0)
            }
            'm' => (60.0, 1.0),
            's' => (1.0, 1.0),
            _ => return None,
        };
        let val: f64 = num_buf.parse().ok()?;
        total_secs += val * mul / div;
        num_buf.clear();
        parsed_any = true;
    }

    if parsed_any && num_buf.is_empty() {
        Some(total_secs)
    } else {
        None
    }
}
