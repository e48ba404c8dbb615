//! Outbound rate limiting and server rate-limit header parsing.
//!
//! [`RateLimiter`] is a token bucket gating outbound requests before they
//! reach the transport; admission is non-blocking. [`RateLimitInfo`] carries
//! the hints a server sends alongside a 429 response.

use crate::{Error, Result};
use http::HeaderMap;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Token-bucket admission control for outbound requests.
///
/// Capacity is the burst size; tokens refill continuously at the configured
/// requests-per-second rate. [`try_acquire`](RateLimiter::try_acquire) never
/// blocks or queues: a denial is an immediate rate-limit failure, not a
/// reason to wait inline.
///
/// The limiter is shared mutable state and is safe to call from concurrent
/// tasks.
///
/// # Examples
///
/// ```
/// use graphite_client::RateLimiter;
///
/// let limiter = RateLimiter::new(10.0, 2).unwrap();
/// assert!(limiter.try_acquire());
/// assert!(limiter.try_acquire());
/// // Burst exhausted; the next token arrives after ~100ms.
/// assert!(!limiter.try_acquire());
/// ```
pub struct RateLimiter {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_per_second: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_second` sustained with
    /// bursts of up to `burst` requests.
    ///
    /// # Errors
    ///
    /// Fails if `requests_per_second` is not positive and finite, or if
    /// `burst` is zero.
    pub fn new(requests_per_second: f64, burst: u32) -> Result<Self> {
        if requests_per_second <= 0.0 || !requests_per_second.is_finite() {
            return Err(Error::ConfigurationError(format!(
                "requests per second must be positive, got {requests_per_second}"
            )));
        }
        if burst == 0 {
            return Err(Error::ConfigurationError(
                "burst capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            state: Mutex::new(BucketState {
                tokens: f64::from(burst),
                last_refill: Instant::now(),
            }),
            capacity: f64::from(burst),
            refill_per_second: requests_per_second,
        })
    }

    /// Consumes one token if available. Non-blocking.
    ///
    /// Returns `true` when the request is admitted.
    pub fn try_acquire(&self) -> bool {
        let mut state = self
            .state
            .lock()
            .expect("rate limiter state mutex poisoned");
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_second).min(self.capacity);
        state.last_refill = now;
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// The burst capacity of the bucket.
    pub fn burst(&self) -> u32 {
        self.capacity as u32
    }

    /// The sustained refill rate in requests per second.
    pub fn requests_per_second(&self) -> f64 {
        self.refill_per_second
    }
}

/// Information extracted from rate limit headers.
///
/// Attached to rate-limit failures so callers can schedule a later attempt;
/// empty for a local admission denial.
#[derive(Debug, Clone, Default)]
pub struct RateLimitInfo {
    /// When the rate limit resets (from `X-RateLimit-Reset` or
    /// `RateLimit-Reset` headers).
    pub reset_at: Option<SystemTime>,

    /// How long to wait before retrying (from the `Retry-After` header).
    pub retry_after: Option<Duration>,

    /// The window's request ceiling (from `X-RateLimit-Limit`).
    pub limit: Option<u64>,

    /// Number of requests remaining in the current window.
    pub remaining: Option<u64>,
}

impl RateLimitInfo {
    /// Extracts rate limit information from HTTP response headers.
    ///
    /// Parses `Retry-After` (seconds or HTTP date), `X-RateLimit-Reset` /
    /// `RateLimit-Reset` (Unix timestamps), `X-RateLimit-Limit`, and
    /// `X-RateLimit-Remaining`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            reset_at: parse_rate_limit_reset(headers),
            retry_after: parse_retry_after(headers),
            limit: parse_u64_header(headers, "x-ratelimit-limit"),
            remaining: parse_u64_header(headers, "x-ratelimit-remaining"),
        }
    }

    /// Returns the recommended delay before retrying, capped by `max_wait`.
    ///
    /// Prefers an explicit `Retry-After`, falling back to the reset time.
    /// `None` when the server sent no usable hint.
    pub fn delay(&self, max_wait: Duration) -> Option<Duration> {
        if let Some(retry_after) = self.retry_after {
            return Some(retry_after.min(max_wait));
        }

        if let Some(reset_at) = self.reset_at {
            if let Ok(until_reset) = reset_at.duration_since(SystemTime::now()) {
                return Some(until_reset.min(max_wait));
            }
        }

        None
    }

    /// Returns `true` if this represents an active rate limit.
    pub fn is_rate_limited(&self) -> bool {
        self.retry_after.is_some() || self.remaining == Some(0)
    }
}

/// Parses the Retry-After header, in delay-seconds or HTTP-date form.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = headers.get("retry-after")?.to_str().ok()?;

    if let Ok(seconds) = header.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    if let Ok(date_time) = httpdate::parse_http_date(header) {
        if let Ok(duration) = date_time.duration_since(SystemTime::now()) {
            return Some(duration);
        }
    }

    None
}

/// Parses X-RateLimit-Reset or RateLimit-Reset headers (Unix timestamp).
fn parse_rate_limit_reset(headers: &HeaderMap) -> Option<SystemTime> {
    for name in ["x-ratelimit-reset", "ratelimit-reset"] {
        if let Some(timestamp) = parse_u64_header(headers, name) {
            return Some(UNIX_EPOCH + Duration::from_secs(timestamp));
        }
    }
    None
}

fn parse_u64_header(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.parse().ok()
}
