//! Fixed window rate limiting
//!
//! Each client address gets a counter that starts with its first request
//! and resets once the window has elapsed. Requests past the limit inside
//! a window are answered with 429 and never reach the handlers.
//!
//! Author: hephaex@gmail.com

use crate::error::error_response;
use afl_core::RateLimitConfig;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

/// Tracked clients before expired windows are swept
const DEFAULT_SWEEP_THRESHOLD: usize = 10_000;

static RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
static RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

#[derive(Debug)]
struct Windows {
    entries: HashMap<String, Window>,
    last_sweep: Instant,
}

/// Rate limit check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the client's window resets
    pub reset_after: Duration,
}

impl RateLimitResult {
    /// Whole seconds until reset, rounded up
    pub fn reset_secs(&self) -> u64 {
        self.reset_after.as_secs() + u64::from(self.reset_after.subsec_nanos() > 0)
    }
}

/// Per-client fixed window counters
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_requests: u32,
    window: Duration,
    trust_proxy_headers: bool,
    sweep_threshold: usize,
    windows: Mutex<Windows>,
}

impl FixedWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            trust_proxy_headers: false,
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
            windows: Mutex::new(Windows {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    pub fn from_config(config: &RateLimitConfig, trust_proxy_headers: bool) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
            .with_trust_proxy_headers(trust_proxy_headers)
    }

    /// Key on X-Forwarded-For / X-Real-IP when running behind a proxy
    pub fn with_trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Tracked clients at which expired windows start being dropped
    pub fn with_sweep_threshold(mut self, threshold: usize) -> Self {
        self.sweep_threshold = threshold;
        self
    }

    /// Count a request from `key` against its current window
    pub fn check(&self, key: &str) -> RateLimitResult {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitResult {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        // At most one sweep per window
        if windows.entries.len() >= self.sweep_threshold
            && now.saturating_duration_since(windows.last_sweep) >= self.window
        {
            let window = self.window;
            windows
                .entries
                .retain(|_, w| now.saturating_duration_since(w.started_at) < window);
            windows.last_sweep = now;
        }

        let entry = windows.entries.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now.saturating_duration_since(entry.started_at) >= self.window {
            *entry = Window {
                started_at: now,
                count: 0,
            };
        }

        let allowed = entry.count < self.max_requests;
        if allowed {
            entry.count += 1;
        }

        RateLimitResult {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after: self
                .window
                .saturating_sub(now.saturating_duration_since(entry.started_at)),
        }
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Client address used as the counter key
    pub fn client_key(&self, request: &Request) -> String {
        if self.trust_proxy_headers {
            if let Some(ip) = forwarded_ip(request.headers()) {
                return ip;
            }
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// First hop of X-Forwarded-For, else X-Real-IP
fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    };

    forwarded.or_else(real_ip).map(str::to_string)
}

fn apply_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    headers.insert(RATE_LIMIT_LIMIT.clone(), HeaderValue::from(result.limit));
    headers.insert(RATE_LIMIT_REMAINING.clone(), HeaderValue::from(result.remaining));
    headers.insert(RATE_LIMIT_RESET.clone(), HeaderValue::from(result.reset_secs()));
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = limiter.client_key(&request);
    let result = limiter.check(&key);

    if !result.allowed {
        tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
        let mut response = error_response(StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE);
        let headers = response.headers_mut();
        apply_headers(headers, &result);
        headers.insert(header::RETRY_AFTER, HeaderValue::from(result.reset_secs()));
        return response;
    }

    let mut response = next.run(request).await;
    apply_headers(response.headers_mut(), &result);
    response
}
